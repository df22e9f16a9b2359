// src/pool/mod.rs
pub mod filter;
pub mod format;
pub mod normalize;
pub mod parser;

use indexmap::IndexMap;

/// Labels of the four choices, by position.
pub const LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

/// One question from a pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub identifier: String, // e.g., "T1A01"
    pub reference: Option<String>, // e.g., "97.1" (rules reference, best effort)
    pub question_text: String,
    pub choices: [String; 4],
    /// `None` when the source carried no answer key for this question.
    pub correct_index: Option<usize>,
}

impl QuestionRecord {
    pub fn correct_label(&self) -> Option<char> {
        self.correct_index.map(|idx| LABELS[idx])
    }

    /// Records without a known answer can only ever be skipped.
    pub fn is_answerable(&self) -> bool {
        self.correct_index.is_some()
    }
}

/// Records keyed by identifier, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolCollection {
    records: IndexMap<String, QuestionRecord>,
}

impl PoolCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, replacing any earlier record with the same identifier.
    /// The replaced record keeps its original position. Returns the old record.
    pub fn insert(&mut self, record: QuestionRecord) -> Option<QuestionRecord> {
        self.records.insert(record.identifier.clone(), record)
    }

    /// Merges `other` into `self`; records from `other` win on conflicts.
    /// Returns the identifiers whose content actually changed.
    pub fn merge(&mut self, other: PoolCollection) -> Vec<String> {
        let mut changed = Vec::new();
        for record in other.records.into_values() {
            let identifier = record.identifier.clone();
            if let Some(previous) = self.insert(record) {
                if self.records.get(&identifier) != Some(&previous) {
                    changed.push(identifier);
                }
            }
        }
        changed
    }

    pub fn get(&self, identifier: &str) -> Option<&QuestionRecord> {
        self.records.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionRecord> {
        self.records.values()
    }

    pub fn into_records(self) -> Vec<QuestionRecord> {
        self.records.into_values().collect()
    }
}

impl FromIterator<QuestionRecord> for PoolCollection {
    fn from_iter<I: IntoIterator<Item = QuestionRecord>>(iter: I) -> Self {
        let mut pool = PoolCollection::new();
        for record in iter {
            pool.insert(record);
        }
        pool
    }
}
