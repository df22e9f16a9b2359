// src/quiz/mod.rs
pub mod terminal;

use crate::pool::QuestionRecord;
use crate::utils::error::QuizError;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;

pub use terminal::TerminalFrontend;

// "All of these choices are correct" style answers only make sense in position D
static ALL_CORRECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^All .* correct\.?$").expect("Failed to compile ALL_CORRECT_RE"));

/// How one presented question went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizOutcome {
    Correct,
    Incorrect,
    Skipped,
}

/// What the user chose for the question on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Choice index, 0 = A.
    Answer(usize),
    Skip,
    Quit,
}

/// Whether records never reached before a quit go to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnseenPolicy {
    #[default]
    Exclude,
    Include,
}

#[derive(Debug, Clone, Default)]
pub struct QuizOptions {
    pub shuffle_choices: bool,
    /// Keep an "All ... correct" choice in position D when shuffling.
    pub keep_all_of_the_above: bool,
    pub unseen: UnseenPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub skipped: usize,
}

impl Tally {
    pub fn remaining(&self) -> usize {
        self.total - self.correct - self.incorrect - self.skipped
    }

    fn count(&mut self, outcome: QuizOutcome) {
        match outcome {
            QuizOutcome::Correct => self.correct += 1,
            QuizOutcome::Incorrect => self.incorrect += 1,
            QuizOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Everything a frontend needs to show one question.
#[derive(Debug)]
pub struct QuestionView<'a> {
    pub record: &'a QuestionRecord,
    pub tally: Tally,
}

/// Presents questions and collects answers; the engine never touches a terminal.
pub trait QuizFrontend {
    /// Shows the question and blocks until the user picks a response.
    fn ask(&mut self, view: &QuestionView<'_>) -> Result<Response, QuizError>;

    /// Tells the user the right answer after a miss or a skip.
    fn reveal(&mut self, record: &QuestionRecord, correct_label: char) -> Result<(), QuizError>;
}

/// Result of a quiz run.
#[derive(Debug)]
pub struct QuizReport {
    /// Records still to be mastered, in their original order.
    pub residual: Vec<QuestionRecord>,
    pub tally: Tally,
}

/// Permutes the four choices uniformly and moves `correct_index` with the
/// correct choice. With `keep_all_of_the_above`, a D choice like
/// "All of these choices are correct" stays put and A-C are permuted.
///
/// Returns the permutation: slot `i` now holds the choice that was at `order[i]`.
pub fn shuffle_choices<R: Rng + ?Sized>(
    record: &mut QuestionRecord,
    rng: &mut R,
    keep_all_of_the_above: bool,
) -> [usize; 4] {
    let mut order = [0usize, 1, 2, 3];
    let movable = if keep_all_of_the_above && ALL_CORRECT_RE.is_match(&record.choices[3]) {
        3
    } else {
        4
    };
    order[..movable].shuffle(rng);

    let original = record.choices.clone();
    for (slot, &from) in order.iter().enumerate() {
        record.choices[slot] = original[from].clone();
    }
    record.correct_index = record
        .correct_index
        .and_then(|correct| order.iter().position(|&from| from == correct));
    order
}

/// Drives one pass over a record sequence.
pub struct QuizEngine<R> {
    options: QuizOptions,
    rng: R,
}

impl<R: Rng> QuizEngine<R> {
    pub fn new(options: QuizOptions, rng: R) -> Self {
        Self { options, rng }
    }

    /// Asks every record in order until the input runs out or the user quits.
    /// Returns the records answered incorrectly or skipped (plus unseen ones
    /// when the policy says so).
    pub fn run<F: QuizFrontend + ?Sized>(
        &mut self,
        records: Vec<QuestionRecord>,
        frontend: &mut F,
    ) -> Result<QuizReport, QuizError> {
        let mut tally = Tally {
            total: records.len(),
            ..Tally::default()
        };
        let mut outcomes: Vec<Option<QuizOutcome>> = vec![None; records.len()];

        for (idx, record) in records.iter().enumerate() {
            if !record.is_answerable() {
                tracing::debug!("Question {} has no answer key; skipping it", record.identifier);
                outcomes[idx] = Some(QuizOutcome::Skipped);
                tally.count(QuizOutcome::Skipped);
                continue;
            }

            // Only the copy on screen is shuffled; the residual keeps the pool's order
            let mut shown = record.clone();
            let order = if self.options.shuffle_choices {
                shuffle_choices(&mut shown, &mut self.rng, self.options.keep_all_of_the_above)
            } else {
                [0, 1, 2, 3]
            };

            let response = frontend.ask(&QuestionView { record: &shown, tally })?;
            let outcome = match response {
                Response::Quit => {
                    tracing::debug!("Quiz quit at question {}", record.identifier);
                    break;
                }
                Response::Skip => QuizOutcome::Skipped,
                Response::Answer(slot) if order.get(slot).copied() == record.correct_index => QuizOutcome::Correct,
                Response::Answer(_) => QuizOutcome::Incorrect,
            };
            if outcome != QuizOutcome::Correct {
                if let Some(label) = shown.correct_label() {
                    frontend.reveal(&shown, label)?;
                }
            }
            outcomes[idx] = Some(outcome);
            tally.count(outcome);
        }

        let unseen = self.options.unseen;
        let residual = records
            .into_iter()
            .zip(outcomes)
            .filter(|(_, outcome)| match outcome {
                Some(QuizOutcome::Correct) => false,
                Some(QuizOutcome::Incorrect) | Some(QuizOutcome::Skipped) => true,
                None => unseen == UnseenPolicy::Include,
            })
            .map(|(record, _)| record)
            .collect();

        Ok(QuizReport { residual, tally })
    }
}
