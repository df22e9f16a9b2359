// src/extractors/pdf.rs
use super::TextExtractor;
use crate::pool::normalize::PAGE_BREAK;
use crate::utils::error::{ConfigError, ExtractError};
use lopdf::Document;

/// Controls for PDF text extraction.
#[derive(Debug, Clone, Default)]
pub struct PdfOptions {
    pub password: Option<String>,
    /// 1-based page numbers, in the order to extract them.
    pub pages: Option<Vec<u32>>,
    /// Stop after this many pages.
    pub max_pages: Option<usize>,
}

/// Parses a page list such as `1,3,7-9`.
pub fn parse_page_selection(list: &str) -> Result<Vec<u32>, ConfigError> {
    let invalid = || ConfigError::InvalidPageSelection(list.to_string());
    let mut pages = Vec::new();
    for part in list.split(',').map(str::trim) {
        if part.is_empty() {
            return Err(invalid());
        }
        match part.split_once('-') {
            Some((start, end)) => {
                let start: u32 = start.trim().parse().map_err(|_| invalid())?;
                let end: u32 = end.trim().parse().map_err(|_| invalid())?;
                if start == 0 || end < start {
                    return Err(invalid());
                }
                pages.extend(start..=end);
            }
            None => {
                let page: u32 = part.parse().map_err(|_| invalid())?;
                if page == 0 {
                    return Err(invalid());
                }
                pages.push(page);
            }
        }
    }
    Ok(pages)
}

/// PDF pools; one form feed line between pages.
pub struct PdfExtractor {
    options: PdfOptions,
}

impl PdfExtractor {
    pub fn new(options: PdfOptions) -> Self {
        Self { options }
    }

    fn load(&self, bytes: &[u8]) -> Result<Document, ExtractError> {
        let mut doc = match Document::load_mem(bytes) {
            Ok(doc) => doc,
            Err(e) => {
                let err_str = e.to_string();
                // lopdf may fail outright on an encrypted file it cannot open
                if err_str.contains("encrypted") || err_str.contains("password") {
                    return Err(ExtractError::PasswordRequired);
                }
                return Err(ExtractError::PdfLoad(err_str));
            }
        };

        if doc.is_encrypted() {
            match self.options.password.as_deref() {
                Some(pwd) => {
                    doc.decrypt(pwd).map_err(|e| {
                        tracing::debug!("PDF decryption failed: {}", e);
                        ExtractError::InvalidPassword
                    })?;
                }
                None => return Err(ExtractError::PasswordRequired),
            }
        }
        Ok(doc)
    }

    fn selected_pages(&self, doc: &Document) -> Result<Vec<u32>, ExtractError> {
        let available = doc.get_pages();
        let mut pages = match &self.options.pages {
            Some(requested) => {
                if let Some(missing) = requested.iter().find(|p| !available.contains_key(*p)) {
                    return Err(ExtractError::PageNotFound(*missing));
                }
                requested.clone()
            }
            None => available.keys().copied().collect(),
        };
        if let Some(max) = self.options.max_pages {
            pages.truncate(max);
        }
        Ok(pages)
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        let doc = self.load(bytes)?;
        let pages = self.selected_pages(&doc)?;
        tracing::debug!("Extracting text from {} PDF page(s)", pages.len());

        let mut lines = Vec::new();
        for (n, page) in pages.iter().enumerate() {
            if n > 0 {
                lines.push(PAGE_BREAK.to_string());
            }
            let text = doc
                .extract_text(&[*page])
                .map_err(|e| ExtractError::PdfText(format!("page {}: {}", page, e)))?;
            lines.extend(text.lines().map(str::to_string));
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// A small single-font PDF with one line of text per page.
    fn sample_pdf(page_texts: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let mut kids: Vec<Object> = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_page_selection_parsing() {
        assert_eq!(parse_page_selection("1,3,7-9").unwrap(), vec![1, 3, 7, 8, 9]);
        assert_eq!(parse_page_selection(" 2 ").unwrap(), vec![2]);
        assert!(parse_page_selection("0").is_err());
        assert!(parse_page_selection("5-2").is_err());
        assert!(parse_page_selection("1,,2").is_err());
        assert!(parse_page_selection("x").is_err());
    }

    #[test]
    fn test_garbage_is_load_error() {
        let extractor = PdfExtractor::new(PdfOptions::default());
        assert!(matches!(extractor.extract(b"not a pdf"), Err(ExtractError::PdfLoad(_))));
    }

    #[test]
    fn test_extracts_pages_with_breaks() {
        let bytes = sample_pdf(&["T1A01 (A)", "Second page"]);
        let lines = PdfExtractor::new(PdfOptions::default()).extract(&bytes).unwrap();
        assert!(lines.iter().any(|l| l.contains("T1A01")));
        assert_eq!(lines.iter().filter(|l| l.as_str() == PAGE_BREAK.to_string()).count(), 1);
    }

    #[test]
    fn test_max_pages_and_missing_page() {
        let bytes = sample_pdf(&["First", "Second", "Third"]);

        let capped = PdfExtractor::new(PdfOptions {
            max_pages: Some(1),
            ..Default::default()
        });
        let lines = capped.extract(&bytes).unwrap();
        assert!(!lines.iter().any(|l| l.contains(PAGE_BREAK)));

        let missing = PdfExtractor::new(PdfOptions {
            pages: Some(vec![2, 9]),
            ..Default::default()
        });
        assert!(matches!(missing.extract(&bytes), Err(ExtractError::PageNotFound(9))));
    }
}
