// src/utils/error.rs
use std::path::PathBuf;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("--include and --exclude are mutually exclusive")]
    IncludeAndExclude,

    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unsupported pool file type '{extension}' for {} (expected .docx, .pdf or .txt)", .path.display())]
    UnsupportedExtension { path: PathBuf, extension: String },

    #[error("Pool file has no extension: {}", .0.display())]
    MissingExtension(PathBuf),

    #[error("Invalid page selection '{0}'")]
    InvalidPageSelection(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid .docx package: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("Invalid document XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Package has no {0} part")]
    MissingPart(&'static str),

    #[error("Failed to load PDF: {0}")]
    PdfLoad(String),

    #[error("Failed to extract PDF text: {0}")]
    PdfText(String),

    #[error("Password required for encrypted PDF")]
    PasswordRequired,

    #[error("Invalid password for PDF")]
    InvalidPassword,

    #[error("Page {0} not found in PDF")]
    PageNotFound(u32),
}

/// Why a question block was dropped by the parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    #[error("{identifier}: no question text before choice A")]
    EmptyQuestion { identifier: String },

    #[error("{identifier}: choice {label} is empty")]
    EmptyChoice { identifier: String, label: char },

    #[error("{identifier}: only {found} of 4 choices before {interrupted_by}")]
    IncompleteChoices {
        identifier: String,
        found: usize,
        interrupted_by: String,
    },

    #[error("{identifier}: more than one choice is marked correct")]
    AmbiguousMarker { identifier: String },

    #[error("{identifier}: answer key ({key}) disagrees with marked choice {marked}")]
    ConflictingAnswerKey {
        identifier: String,
        key: char,
        marked: char,
    },
}

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("The terminal window must be at least {min_cols}x{min_rows} (found {cols}x{rows})")]
    TerminalTooSmall {
        cols: u16,
        rows: u16,
        min_cols: u16,
        min_rows: u16,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Quiz failed: {0}")]
    Quiz(#[from] QuizError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("No questions could be parsed from {0} pool file(s)")]
    NoRecords(usize),
}
