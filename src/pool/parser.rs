// src/pool/parser.rs

// --- Imports ---
use crate::pool::{PoolCollection, QuestionRecord, LABELS};
use crate::utils::error::MalformedRecord;
use once_cell::sync::Lazy;
use regex::Regex;

// --- Regex Patterns for Line Matching (Lazy Static) ---
// Identifier line: "T1A01", "T1A01 (C)", "T1A01 (C) [97.1]", "T1A01 What is ...?"
static IDENTIFIER_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<id>[A-Z][0-9][A-Z][0-9]{2})(?:\s*\((?P<key>[A-Da-d])\))?(?:\s*\[(?P<reference>[^\]]*)\])?(?:\s+(?P<rest>.*))?$",
    )
    .expect("Failed to compile IDENTIFIER_LINE_RE")
});

// Choice line: "A. text", "*B) text", "c: text", "(D) text"; the `*` marks the correct choice
static CHOICE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<mark>\*)?(?:\((?P<paren>[A-Da-d])\)|(?P<label>[A-Da-d])[.):])(?:\s+(?P<text>.*))?$")
        .expect("Failed to compile CHOICE_LINE_RE")
});

// Block terminator used by published pools
static TERMINATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^~+$").expect("Failed to compile TERMINATOR_RE"));

/// What a normalized line looks like to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Terminator,
    Identifier {
        identifier: &'a str,
        key: Option<usize>,
        reference: Option<&'a str>,
        rest: &'a str,
    },
    Choice {
        index: usize,
        marked: bool,
        text: &'a str,
    },
    Text(&'a str),
}

fn label_index(label: &str) -> Option<usize> {
    let upper = label.chars().next()?.to_ascii_uppercase();
    LABELS.iter().position(|&l| l == upper)
}

pub fn classify_line(line: &str) -> LineKind<'_> {
    let line = line.trim();
    if line.is_empty() {
        return LineKind::Blank;
    }
    if TERMINATOR_RE.is_match(line) {
        return LineKind::Terminator;
    }
    if let Some(caps) = IDENTIFIER_LINE_RE.captures(line) {
        if let Some(id) = caps.name("id") {
            return LineKind::Identifier {
                identifier: id.as_str(),
                key: caps.name("key").and_then(|k| label_index(k.as_str())),
                reference: caps.name("reference").map(|r| r.as_str().trim()),
                rest: caps.name("rest").map_or("", |r| r.as_str().trim()),
            };
        }
    }
    if let Some(caps) = CHOICE_LINE_RE.captures(line) {
        let label = caps.name("label").or_else(|| caps.name("paren"));
        if let Some(index) = label.and_then(|l| label_index(l.as_str())) {
            return LineKind::Choice {
                index,
                marked: caps.name("mark").is_some(),
                text: caps.name("text").map_or("", |t| t.as_str().trim()),
            };
        }
    }
    LineKind::Text(line)
}

/// True for lines that open or close part of a question block.
pub fn is_record_marker(line: &str) -> bool {
    matches!(
        classify_line(line),
        LineKind::Terminator | LineKind::Identifier { .. } | LineKind::Choice { .. }
    )
}

/// True for an identifier line with no question text on it.
pub fn is_identifier_header(line: &str) -> bool {
    matches!(classify_line(line), LineKind::Identifier { rest, .. } if rest.is_empty())
}

/// A question block being accumulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub identifier: String,
    pub reference: Option<String>,
    pub key: Option<usize>,
    pub start_line: usize,
    pub question: Vec<String>,
    pub choices: Vec<Vec<String>>,
    pub marked: Vec<usize>,
}

impl Draft {
    fn new(identifier: &str, key: Option<usize>, reference: Option<&str>, rest: &str, start_line: usize) -> Self {
        let mut question = Vec::new();
        if !rest.is_empty() {
            question.push(rest.to_string());
        }
        Self {
            identifier: identifier.to_string(),
            reference: reference.filter(|r| !r.is_empty()).map(str::to_string),
            key,
            start_line,
            question,
            choices: Vec::new(),
            marked: Vec::new(),
        }
    }

    fn open_choice(&mut self, index: usize, marked: bool, text: &str) {
        if marked {
            self.marked.push(index);
        }
        let mut block = Vec::new();
        if !text.is_empty() {
            block.push(text.to_string());
        }
        self.choices.push(block);
    }

    fn append_to_current(&mut self, text: &str) {
        match self.choices.last_mut() {
            Some(block) => block.push(text.to_string()),
            None => self.question.push(text.to_string()),
        }
    }

    fn incomplete(&self, interrupted_by: &str) -> MalformedRecord {
        MalformedRecord::IncompleteChoices {
            identifier: self.identifier.clone(),
            found: self.choices.len(),
            interrupted_by: interrupted_by.to_string(),
        }
    }

    /// Resolves a block with four choices into a record.
    pub fn finish(self) -> Result<QuestionRecord, MalformedRecord> {
        if self.choices.len() != 4 {
            return Err(self.incomplete("end of block"));
        }
        let question_text = join_fragments(&self.question);
        if question_text.is_empty() {
            return Err(MalformedRecord::EmptyQuestion { identifier: self.identifier });
        }

        let mut choices: [String; 4] = Default::default();
        for (idx, block) in self.choices.iter().enumerate() {
            let text = join_fragments(block);
            if text.is_empty() {
                return Err(MalformedRecord::EmptyChoice {
                    identifier: self.identifier,
                    label: LABELS[idx],
                });
            }
            choices[idx] = text;
        }

        let marked = match self.marked.as_slice() {
            [] => None,
            [single] => Some(*single),
            _ => return Err(MalformedRecord::AmbiguousMarker { identifier: self.identifier }),
        };
        let correct_index = match (self.key, marked) {
            (Some(key), Some(mark)) if key != mark => {
                return Err(MalformedRecord::ConflictingAnswerKey {
                    identifier: self.identifier,
                    key: LABELS[key],
                    marked: LABELS[mark],
                });
            }
            (key, mark) => mark.or(key),
        };

        Ok(QuestionRecord {
            identifier: self.identifier,
            reference: self.reference,
            question_text,
            choices,
            correct_index,
        })
    }
}

fn join_fragments(fragments: &[String]) -> String {
    fragments
        .iter()
        .flat_map(|f| f.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parser state, threaded through the scan one line at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    SeekingIdentifier,
    InQuestionText(Draft),
    /// `Draft::choices` holds the blocks opened so far (1 to 4).
    InChoices(Draft),
}

/// Result of feeding one line to a state.
#[derive(Debug)]
pub struct Transition {
    pub next: State,
    pub outcome: Option<Result<QuestionRecord, MalformedRecord>>,
    /// The line was not consumed and must be fed to `next` again.
    pub reexamine: bool,
}

impl Transition {
    fn to(next: State) -> Self {
        Self { next, outcome: None, reexamine: false }
    }

    fn resolved(outcome: Result<QuestionRecord, MalformedRecord>, reexamine: bool) -> Self {
        Self {
            next: State::SeekingIdentifier,
            outcome: Some(outcome),
            reexamine,
        }
    }
}

impl State {
    /// Feeds one normalized line (1-based `line_no`) to the state machine.
    pub fn step(self, line_no: usize, line: &str) -> Transition {
        let kind = classify_line(line);
        match self {
            State::SeekingIdentifier => match kind {
                LineKind::Identifier { identifier, key, reference, rest } => Transition::to(
                    State::InQuestionText(Draft::new(identifier, key, reference, rest, line_no)),
                ),
                // Section banners, preamble, stray text
                _ => Transition::to(State::SeekingIdentifier),
            },

            State::InQuestionText(mut draft) => match kind {
                LineKind::Blank => Transition::to(State::InQuestionText(draft)),
                LineKind::Terminator => Transition::resolved(Err(draft.incomplete("~~")), false),
                LineKind::Identifier { identifier, .. } => {
                    Transition::resolved(Err(draft.incomplete(identifier)), true)
                }
                LineKind::Choice { index: 0, marked, text } => {
                    draft.open_choice(0, marked, text);
                    Transition::to(State::InChoices(draft))
                }
                LineKind::Choice { .. } | LineKind::Text(_) => {
                    draft.append_to_current(line.trim());
                    Transition::to(State::InQuestionText(draft))
                }
            },

            State::InChoices(mut draft) => {
                let complete = draft.choices.len() == 4;
                match kind {
                    LineKind::Blank if complete => Transition::resolved(draft.finish(), false),
                    LineKind::Blank => Transition::to(State::InChoices(draft)),
                    LineKind::Terminator if complete => Transition::resolved(draft.finish(), false),
                    LineKind::Terminator => Transition::resolved(Err(draft.incomplete("~~")), false),
                    LineKind::Identifier { .. } if complete => Transition::resolved(draft.finish(), true),
                    LineKind::Identifier { identifier, .. } => {
                        Transition::resolved(Err(draft.incomplete(identifier)), true)
                    }
                    LineKind::Choice { index, marked, text } if index == draft.choices.len() => {
                        draft.open_choice(index, marked, text);
                        Transition::to(State::InChoices(draft))
                    }
                    LineKind::Choice { .. } | LineKind::Text(_) => {
                        draft.append_to_current(line.trim());
                        Transition::to(State::InChoices(draft))
                    }
                }
            }
        }
    }

    /// Resolves whatever is in progress when the input runs out.
    pub fn end_of_input(self) -> Option<Result<QuestionRecord, MalformedRecord>> {
        match self {
            State::SeekingIdentifier => None,
            State::InQuestionText(draft) => Some(Err(draft.incomplete("end of input"))),
            State::InChoices(draft) if draft.choices.len() == 4 => Some(draft.finish()),
            State::InChoices(draft) => Some(Err(draft.incomplete("end of input"))),
        }
    }
}

/// A dropped block and the line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRecord {
    pub line: usize,
    pub reason: MalformedRecord,
}

/// Everything the parser found in one input.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub pool: PoolCollection,
    pub dropped: Vec<DroppedRecord>,
    /// Identifiers defined more than once with different content.
    pub duplicates: Vec<String>,
}

/// Scans normalized lines and collects every complete question block.
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> ParseReport {
    let mut report = ParseReport::default();
    let mut state = State::SeekingIdentifier;
    let mut start_line = 0;

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line = line.as_ref();
        loop {
            let transition = state.step(line_no, line);
            state = transition.next;
            if let Some(outcome) = transition.outcome {
                report.record(outcome, start_line);
            }
            if let State::InQuestionText(draft) = &state {
                start_line = draft.start_line;
            }
            if !transition.reexamine {
                break;
            }
        }
    }
    if let Some(outcome) = state.end_of_input() {
        report.record(outcome, start_line);
    }

    tracing::debug!(
        "Parsed {} question(s), dropped {} malformed block(s)",
        report.pool.len(),
        report.dropped.len()
    );
    report
}

impl ParseReport {
    fn record(&mut self, outcome: Result<QuestionRecord, MalformedRecord>, line: usize) {
        match outcome {
            Ok(record) => {
                let identifier = record.identifier.clone();
                tracing::trace!("Parsed question {}", identifier);
                if let Some(previous) = self.pool.insert(record) {
                    if self.pool.get(&identifier) != Some(&previous) {
                        tracing::warn!("Question {} defined twice with different content; keeping the later one", identifier);
                        self.duplicates.push(identifier);
                    }
                }
            }
            Err(reason) => {
                tracing::warn!("Dropping malformed question at line {}: {}", line, reason);
                self.dropped.push(DroppedRecord { line, reason });
            }
        }
    }
}
