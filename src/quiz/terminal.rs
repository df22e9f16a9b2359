// src/quiz/terminal.rs
use super::{QuestionView, QuizFrontend, Response};
use crate::pool::{QuestionRecord, LABELS};
use crate::utils::error::QuizError;
use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType};
use std::io::{self, Stderr, Write};

const MIN_COLS: u16 = 80;
const MIN_ROWS: u16 = 24;

const HELP: &str = "\nPress the letter of your answer (\"a\", \"b\", \"c\" or \"d\"). If your answer is
correct, the question will not be output. You may press \"s\" to skip answering
a question. If you wish to quit, press \"q\"; questions answered incorrectly or
skipped so far will then be output.\n";

/// What a key press means on the question screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Respond(Response),
    Help,
}

/// Maps a key press onto a quiz action; anything unrecognised asks for help.
pub fn handle_key_event(key: KeyEvent) -> KeyAction {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => KeyAction::Respond(Response::Quit),
        (KeyCode::Char(c), _) => {
            let upper = c.to_ascii_uppercase();
            match upper {
                'S' => KeyAction::Respond(Response::Skip),
                'Q' => KeyAction::Respond(Response::Quit),
                _ => match LABELS.iter().position(|&l| l == upper) {
                    Some(idx) => KeyAction::Respond(Response::Answer(idx)),
                    None => KeyAction::Help,
                },
            }
        }
        _ => KeyAction::Help,
    }
}

/// Leaves raw mode when dropped, even on an error path.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            tracing::warn!("Failed to restore terminal mode: {}", e);
        }
    }
}

/// Blocks until a key is pressed.
fn read_key() -> io::Result<KeyEvent> {
    let _raw = RawModeGuard::enable()?;
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(key);
            }
        }
    }
}

/// Draws questions on stderr so stdout stays free for the pool output.
pub struct TerminalFrontend {
    out: Stderr,
}

impl TerminalFrontend {
    pub fn new() -> Result<Self, QuizError> {
        let (cols, rows) = terminal::size()?;
        if cols < MIN_COLS || rows < MIN_ROWS {
            return Err(QuizError::TerminalTooSmall {
                cols,
                rows,
                min_cols: MIN_COLS,
                min_rows: MIN_ROWS,
            });
        }
        Ok(Self { out: io::stderr() })
    }
}

/// The screen for one question, header included.
pub fn render_question(view: &QuestionView<'_>) -> String {
    let tally = &view.tally;
    let record = view.record;
    let mut screen = format!(
        "       total questions: {}\n    correctly answered: {}\n  incorrectly answered: {}\n               skipped: {}\n             remaining: {}\n\n",
        tally.total,
        tally.correct,
        tally.incorrect,
        tally.skipped,
        tally.remaining()
    );
    screen.push_str(&format!("{}\n{}\n", record.identifier, record.question_text));
    for (label, choice) in LABELS.iter().zip(record.choices.iter()) {
        screen.push_str(&format!("   {}. {}\n", label, choice));
    }
    screen
}

impl QuizFrontend for TerminalFrontend {
    fn ask(&mut self, view: &QuestionView<'_>) -> Result<Response, QuizError> {
        execute!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        write!(self.out, "{}", render_question(view))?;
        loop {
            write!(self.out, "\n[abcdsq?]: ")?;
            self.out.flush()?;
            let key = read_key()?;
            match handle_key_event(key) {
                KeyAction::Respond(response) => {
                    if let KeyCode::Char(c) = key.code {
                        writeln!(self.out, "{}", c)?;
                    }
                    return Ok(response);
                }
                KeyAction::Help => write!(self.out, "{}", HELP)?,
            }
        }
    }

    fn reveal(&mut self, _record: &QuestionRecord, correct_label: char) -> Result<(), QuizError> {
        write!(
            self.out,
            "\nThe correct answer is {}.\nPress a key to continue.",
            correct_label
        )?;
        self.out.flush()?;
        read_key()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::tests::record;
    use crate::quiz::Tally;

    #[test]
    fn test_key_mapping() {
        let key = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
        assert_eq!(handle_key_event(key('a')), KeyAction::Respond(Response::Answer(0)));
        assert_eq!(handle_key_event(key('D')), KeyAction::Respond(Response::Answer(3)));
        assert_eq!(handle_key_event(key('s')), KeyAction::Respond(Response::Skip));
        assert_eq!(handle_key_event(key('Q')), KeyAction::Respond(Response::Quit));
        assert_eq!(handle_key_event(key('?')), KeyAction::Help);
        assert_eq!(handle_key_event(key('e')), KeyAction::Help);

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(ctrl_c), KeyAction::Respond(Response::Quit));
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(handle_key_event(esc), KeyAction::Respond(Response::Quit));
    }

    #[test]
    fn test_render_question() {
        let r = record("T1A01", "What is it?", Some(1));
        let tally = Tally {
            total: 10,
            correct: 2,
            incorrect: 1,
            skipped: 1,
        };
        let screen = render_question(&QuestionView { record: &r, tally });
        assert!(screen.contains("       total questions: 10\n"));
        assert!(screen.contains("             remaining: 6\n"));
        assert!(screen.contains("T1A01\nWhat is it?\n   A. Alpha\n   B. Bravo\n"));
        // The answer is never shown before the user responds
        assert!(!screen.contains('*'));
    }
}
