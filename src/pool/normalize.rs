// src/pool/normalize.rs

// --- Imports ---
use crate::pool::parser::{is_identifier_header, is_record_marker};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use deunicode::deunicode_with_tofu;
use unicode_normalization::UnicodeNormalization;

// --- Constants ---
/// Extractors separate pages with a form feed.
pub const PAGE_BREAK: char = '\u{c}';

/// Fewest pages a repeated edge line must appear on to count as a running header.
const MIN_RUNNING_PAGES: usize = 3;

/// Characters that end a logical line.
const TERMINAL_PUNCTUATION: [char; 4] = ['.', '?', '!', ':'];

// --- Regex Patterns (Lazy Static) ---
static PAGE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+$").expect("Failed to compile PAGE_NUMBER_RE"));

static PAGE_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:-\s*)?page\s+\d+(?:\s+of\s+\d+)?(?:\s*-)?$")
        .expect("Failed to compile PAGE_LABEL_RE")
});

static DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("Failed to compile DIGITS_RE"));

/// How a physical line relates to the one after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineBreak {
    /// The next line continues the same sentence.
    Continuation,
    /// The next line starts something new.
    Boundary,
}

/// Decides whether `next` was wrapped off the end of `current`.
/// Both lines are expected to be cleaned already.
pub fn classify(current: &str, next: &str) -> LineBreak {
    if current.is_empty() || next.is_empty() {
        return LineBreak::Boundary;
    }
    if is_identifier_header(current) {
        return LineBreak::Boundary;
    }
    if current.ends_with(&TERMINAL_PUNCTUATION[..]) {
        return LineBreak::Boundary;
    }
    if is_record_marker(next) {
        return LineBreak::Boundary;
    }
    LineBreak::Continuation
}

/// Cleans one physical line: compatibility normalization, ASCII
/// transliteration, no control characters, single spaces, trimmed.
pub fn clean_line(raw: &str) -> String {
    let mapped: String = raw
        .nfkc()
        .filter_map(|c| match c {
            '\u{FEFF}' | '\u{00AD}' | '\u{200B}' => None, // BOM, soft hyphen, zero-width space
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => Some('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => Some('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => Some('-'),
            c if c.is_control() => Some(' '),
            c => Some(c),
        })
        .collect();
    // Characters with no ASCII spelling are dropped
    let ascii = deunicode_with_tofu(&mapped, "");
    ascii.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapses raw extractor lines into logical lines for the parser.
///
/// Lines are cleaned, page furniture (page numbers, running headers and
/// footers) is dropped, wrapped fragments are rejoined, and runs of blank
/// lines become a single blank line. The result never starts or ends with a
/// blank line.
pub fn normalize_lines<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let pages = split_pages(raw);
    let pages = drop_boilerplate(pages);

    let mut out: Vec<String> = Vec::new();
    for line in pages.into_iter().flatten() {
        if line.is_empty() {
            if matches!(out.last(), Some(last) if !last.is_empty()) {
                out.push(String::new());
            }
            continue;
        }
        match out.last_mut() {
            Some(last) if classify(last, &line) == LineBreak::Continuation => {
                join_wrapped(last, &line);
            }
            _ => out.push(line),
        }
    }
    if matches!(out.last(), Some(last) if last.is_empty()) {
        out.pop();
    }
    out
}

/// Appends a wrapped fragment, undoing the space a line-end hyphen picks up.
fn join_wrapped(current: &mut String, next: &str) {
    let mut tail = current.chars().rev();
    let hyphenated = tail.next() == Some('-')
        && tail.next().map_or(false, |c| c.is_ascii_alphanumeric())
        && next.chars().next().map_or(false, |c| c.is_lowercase());
    if !hyphenated {
        current.push(' ');
    }
    current.push_str(next);
}

/// Splits on form feeds and cleans every line.
fn split_pages<S: AsRef<str>>(raw: &[S]) -> Vec<Vec<String>> {
    let mut pages = vec![Vec::new()];
    for line in raw {
        let line = line.as_ref();
        let has_break = line.contains(PAGE_BREAK);
        for (n, segment) in line.split(PAGE_BREAK).enumerate() {
            if n > 0 {
                pages.push(Vec::new());
            }
            let cleaned = clean_line(segment);
            // The empty side of a form feed is not a blank line
            if cleaned.is_empty() && has_break {
                continue;
            }
            if let Some(page) = pages.last_mut() {
                page.push(cleaned);
            }
        }
    }
    pages.retain(|page| page.iter().any(|line| !line.is_empty()));
    pages
}

/// First and last non-blank line index of a page.
fn page_edges(page: &[String]) -> Option<(usize, usize)> {
    let first = page.iter().position(|l| !l.is_empty())?;
    let last = page.iter().rposition(|l| !l.is_empty())?;
    Some((first, last))
}

/// Running headers and footers differ across pages only in their numbers.
fn furniture_key(line: &str) -> String {
    DIGITS_RE.replace_all(line, "#").into_owned()
}

/// A header or footer shape must sit at the edge of this many pages.
fn running_threshold(page_count: usize) -> usize {
    MIN_RUNNING_PAGES.max((page_count + 1) / 2)
}

/// True when `line` opens a page by finishing the sentence `previous` left open.
fn continues_previous_page(previous: Option<&str>, line: &str) -> bool {
    let Some(previous) = previous else {
        return false;
    };
    !previous.ends_with(&TERMINAL_PUNCTUATION[..])
        && !is_identifier_header(previous)
        && line.chars().next().map_or(false, char::is_lowercase)
}

fn drop_boilerplate(mut pages: Vec<Vec<String>>) -> Vec<Vec<String>> {
    // Count how many pages each edge line shape appears on
    let mut edge_counts: HashMap<String, usize> = HashMap::new();
    if pages.len() > 1 {
        for page in &pages {
            if let Some((first, last)) = page_edges(page) {
                let mut keys = vec![furniture_key(&page[first])];
                if last != first {
                    keys.push(furniture_key(&page[last]));
                }
                keys.dedup();
                for key in keys {
                    *edge_counts.entry(key).or_insert(0) += 1;
                }
            }
        }
    }
    let threshold = running_threshold(pages.len());
    let is_running = |line: &str| {
        !is_record_marker(line) && edge_counts.get(&furniture_key(line)).copied().unwrap_or(0) >= threshold
    };

    let mut dropped = 0usize;
    let mut carried: Option<String> = None;
    for page in pages.iter_mut() {
        let edges = page_edges(&page[..]);
        let mut keep = Vec::with_capacity(page.len());
        for (idx, line) in page.iter().enumerate() {
            let at_edge = matches!(edges, Some((first, last)) if idx == first || idx == last);
            let opens_page = matches!(edges, Some((first, _)) if idx == first);
            let standalone = (idx == 0 || page[idx - 1].is_empty())
                && page.get(idx + 1).map_or(true, |next| next.is_empty());
            let continuation = opens_page && continues_previous_page(carried.as_deref(), line);

            let furniture = PAGE_LABEL_RE.is_match(line)
                || (PAGE_NUMBER_RE.is_match(line) && (at_edge || standalone))
                || (at_edge && !continuation && is_running(line));
            if furniture {
                tracing::trace!("Dropping page furniture: '{}'", line);
                dropped += 1;
            }
            keep.push(!furniture);
        }
        carried = page
            .iter()
            .zip(&keep)
            .rev()
            .find(|(line, kept)| **kept && !line.is_empty())
            .map(|(line, _)| line.clone());

        let mut flags = keep.into_iter();
        page.retain(|_| flags.next().unwrap_or(true));
    }
    if dropped > 0 {
        tracing::debug!("Dropped {} page furniture line(s)", dropped);
    }
    pages
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_line() {
        assert_eq!(clean_line("  What  is\tthe   purpose?  "), "What is the purpose?");
        assert_eq!(
            clean_line("\u{201C}CQ\u{201D} isn\u{2019}t \u{2013} a \u{FB01}eld\u{2026}"),
            "\"CQ\" isn't - a field..."
        );
        assert_eq!(clean_line("a\u{0007}b"), "a b");
        assert_eq!(clean_line("\u{FEFF}T1A01"), "T1A01");
    }

    #[test]
    fn test_clean_line_is_ascii() {
        let cleaned = clean_line("10 \u{00B5}F at 25 \u{00B0}C across 50 \u{2126} \u{00E9}t\u{00E9}");
        assert!(cleaned.is_ascii(), "not ASCII: {}", cleaned);
        assert!(cleaned.starts_with("10 "));
        assert!(cleaned.ends_with("ete"));
        assert_eq!(clean_line("plain ASCII stays put."), "plain ASCII stays put.");
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("Which of the following is", "a purpose?"), LineBreak::Continuation);
        assert_eq!(classify("What is the purpose?", "Something"), LineBreak::Boundary);
        assert_eq!(classify("A. Hobby communications", "*B. Experimentation"), LineBreak::Boundary);
        assert_eq!(classify("D. Emergency-only use", "T1A02"), LineBreak::Boundary);
        assert_eq!(classify("D. Emergency-only use", "~~"), LineBreak::Boundary);
        assert_eq!(classify("T1A01 (C) [97.1]", "Which of these"), LineBreak::Boundary);
        assert_eq!(classify("T1A01", "Which of these"), LineBreak::Boundary);
        assert_eq!(classify("Some text", ""), LineBreak::Boundary);
    }

    #[test]
    fn test_rejoins_wrapped_lines() {
        let raw = vec![
            "T1A01 (C) [97.1]",
            "Which of the following is a purpose of the Amateur",
            "Radio Service as stated in the FCC rules and",
            "regulations?",
            "A. Providing personal radio communications for as many",
            "citizens as possible",
            "B. Providing communications for international non-",
            "profit organizations",
            "C. Advancing skills in the technical and communication",
            "phases of the radio art",
            "D. All of these choices are correct",
            "~~",
        ];
        let lines = normalize_lines(&raw);
        assert_eq!(
            lines,
            vec![
                "T1A01 (C) [97.1]",
                "Which of the following is a purpose of the Amateur Radio Service as stated in the FCC rules and regulations?",
                "A. Providing personal radio communications for as many citizens as possible",
                "B. Providing communications for international non-profit organizations",
                "C. Advancing skills in the technical and communication phases of the radio art",
                "D. All of these choices are correct",
                "~~",
            ]
        );
    }

    #[test]
    fn test_hyphen_before_capital_keeps_space() {
        let lines = normalize_lines(&["Uses the 2-", "Meter band"]);
        assert_eq!(lines, vec!["Uses the 2- Meter band"]);
    }

    #[test]
    fn test_blank_lines_collapse_and_trim() {
        let raw = vec!["", "", "T1A01", "Question?", "", "", "", "A. One", "", ""];
        let lines = normalize_lines(&raw);
        assert_eq!(lines, vec!["T1A01", "Question?", "", "A. One"]);
    }

    #[test]
    fn test_drops_page_numbers_and_running_headers() {
        let raw = vec![
            "Technician Pool 2022-2026",
            "T1A01 (C)",
            "What is the purpose of the",
            "12",
            "\u{c}Technician Pool 2022-2026",
            "service?",
            "A. One",
            "Page 13 of 40",
            "\u{c}Technician Pool 2022-2026",
            "B. Two",
            "14",
        ];
        let lines = normalize_lines(&raw);
        assert_eq!(
            lines,
            vec!["T1A01 (C)", "What is the purpose of the service?", "A. One", "B. Two"]
        );
    }

    #[test]
    fn test_continuation_word_opening_pages_is_kept() {
        let raw = vec![
            "T1A01 (D)",
            "Which of these apply?",
            "A. One",
            "B. Two",
            "C. Three",
            "D. All of these choices are",
            "\u{c}correct",
            "",
            "T1A02 (D)",
            "Which of those apply?",
            "A. One",
            "B. Two",
            "C. Three",
            "D. All of these choices are",
            "\u{c}correct",
        ];
        let lines = normalize_lines(&raw);
        assert_eq!(lines.iter().filter(|l| l.as_str() == "D. All of these choices are correct").count(), 2);

        let report = crate::pool::parser::parse_lines(&lines);
        for id in ["T1A01", "T1A02"] {
            assert_eq!(report.pool.get(id).unwrap().choices[3], "All of these choices are correct");
        }
    }

    #[test]
    fn test_running_header_needs_most_pages() {
        assert_eq!(running_threshold(2), 3);
        assert_eq!(running_threshold(3), 3);
        assert_eq!(running_threshold(10), 5);
        assert_eq!(running_threshold(11), 6);

        // Repeated on two of five pages: not a header
        let raw = vec!["Note", "T1A01", "\u{c}Note", "Q?", "\u{c}x", "\u{c}y", "\u{c}z"];
        assert!(normalize_lines(&raw).iter().any(|l| l.starts_with("Note")));
    }

    #[test]
    fn test_keeps_numeric_text_inside_blocks() {
        let raw = vec!["T1A05", "What is the frequency of", "146", "megahertz?"];
        let lines = normalize_lines(&raw);
        assert_eq!(lines, vec!["T1A05", "What is the frequency of 146 megahertz?"]);
    }

    #[test]
    fn test_drops_standalone_number_paragraph() {
        let raw = vec!["D. Four", "", "7", "", "T1A02"];
        assert_eq!(normalize_lines(&raw), vec!["D. Four", "", "T1A02"]);
    }

    #[test]
    fn test_single_page_has_no_running_header_detection() {
        let raw = vec!["Element 2", "T1A01", "Question?"];
        assert_eq!(normalize_lines(&raw), vec!["Element 2", "T1A01", "Question?"]);
    }
}
