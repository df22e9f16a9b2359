// src/extractors/mod.rs
pub mod docx;
pub mod pdf;
pub mod txt;

use crate::utils::error::{ConfigError, ExtractError};
use std::path::{Path, PathBuf};

pub use docx::DocxExtractor;
pub use pdf::{PdfExtractor, PdfOptions};
pub use txt::TxtExtractor;

/// Turns the bytes of one pool file into raw text lines.
///
/// Lines may be wrapped anywhere and may contain page furniture; pages are
/// separated by a form feed (`normalize::PAGE_BREAK`).
pub trait TextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError>;
}

/// Supported pool file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolFormat {
    Docx,
    Pdf,
    Txt,
}

impl PoolFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::MissingExtension(path.to_path_buf()))?;
        match extension.to_ascii_lowercase().as_str() {
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            "txt" => Ok(Self::Txt),
            _ => Err(ConfigError::UnsupportedExtension {
                path: path.to_path_buf(),
                extension: extension.to_string(),
            }),
        }
    }
}

/// A pool file paired with the extractor that reads it.
pub struct PoolSource {
    pub path: PathBuf,
    pub format: PoolFormat,
    extractor: Box<dyn TextExtractor>,
}

impl std::fmt::Debug for PoolSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolSource")
            .field("path", &self.path)
            .field("format", &self.format)
            .finish()
    }
}

impl PoolSource {
    /// Selects the extractor for `path` once, up front.
    pub fn new(path: &Path, pdf_options: &PdfOptions) -> Result<Self, ConfigError> {
        let format = PoolFormat::from_path(path)?;
        let extractor: Box<dyn TextExtractor> = match format {
            PoolFormat::Docx => Box::new(DocxExtractor),
            PoolFormat::Pdf => Box::new(PdfExtractor::new(pdf_options.clone())),
            PoolFormat::Txt => Box::new(TxtExtractor),
        };
        Ok(Self {
            path: path.to_path_buf(),
            format,
            extractor,
        })
    }

    /// Reads the whole file, releases it, then extracts its lines.
    pub async fn load_lines(&self) -> Result<Vec<String>, ExtractError> {
        let bytes = tokio::fs::read(&self.path).await?;
        tracing::debug!("Read {} bytes from {}", bytes.len(), self.path.display());
        let lines = self.extractor.extract(&bytes)?;
        tracing::debug!("Extracted {} raw line(s) from {}", lines.len(), self.path.display());
        Ok(lines)
    }
}
