// src/pool/format.rs
use crate::pool::{QuestionRecord, LABELS};
use std::fmt;

/// Marker written immediately before the correct choice's label.
pub const CORRECT_MARKER: char = '*';

impl fmt::Display for QuestionRecord {
    /// One block of the canonical text form, without the separating blank line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier)?;
        if let Some(reference) = &self.reference {
            write!(f, " [{}]", reference)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.question_text)?;
        for (idx, choice) in self.choices.iter().enumerate() {
            if self.correct_index == Some(idx) {
                write!(f, "{}", CORRECT_MARKER)?;
            }
            writeln!(f, "{}. {}", LABELS[idx], choice)?;
        }
        Ok(())
    }
}

/// Serializes records to the canonical text form: one block per record,
/// blocks separated by a single blank line. No records gives empty output.
pub fn format_records<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a QuestionRecord>,
{
    let blocks: Vec<String> = records.into_iter().map(|r| r.to_string()).collect();
    blocks.join("\n")
}
