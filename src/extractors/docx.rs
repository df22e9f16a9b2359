// src/extractors/docx.rs
use super::TextExtractor;
use crate::utils::error::ExtractError;
use roxmltree::{Document, Node};
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";
const WORD_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Word-processing packages: one line per paragraph (table cells included).
pub struct DocxExtractor;

fn is_word(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(WORD_NAMESPACE)
}

impl DocxExtractor {
    fn read_document_part(bytes: &[u8]) -> Result<String, ExtractError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut part = match archive.by_name(DOCUMENT_PART) {
            Ok(part) => part,
            Err(ZipError::FileNotFound) => return Err(ExtractError::MissingPart(DOCUMENT_PART)),
            Err(e) => return Err(e.into()),
        };
        let mut xml = String::new();
        part.read_to_string(&mut xml)?;
        Ok(xml)
    }

    /// Text of one paragraph; manual line breaks start a new line.
    fn paragraph_lines(paragraph: Node) -> Vec<String> {
        let mut lines = vec![String::new()];
        for node in paragraph.descendants() {
            let Some(current) = lines.last_mut() else { continue };
            if is_word(&node, "t") {
                current.push_str(node.text().unwrap_or_default());
            } else if is_word(&node, "tab") {
                current.push(' ');
            } else if is_word(&node, "br") || is_word(&node, "cr") {
                lines.push(String::new());
            }
        }
        lines
    }
}

impl TextExtractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        let xml = Self::read_document_part(bytes)?;
        let document = Document::parse(&xml)?;

        let mut lines = Vec::new();
        for paragraph in document.descendants().filter(|n| is_word(n, "p")) {
            // Nested paragraphs (text boxes) are reached on their own
            let nested = paragraph.ancestors().skip(1).any(|a| is_word(&a, "p"));
            if nested {
                continue;
            }
            lines.extend(Self::paragraph_lines(paragraph));
        }
        tracing::debug!("Extracted {} paragraph line(s) from {}", lines.len(), DOCUMENT_PART);
        Ok(lines)
    }
}
