// src/extractors/txt.rs
use super::TextExtractor;
use crate::utils::error::ExtractError;

/// Plain text pools, including our own canonical output.
pub struct TxtExtractor;

impl TextExtractor for TxtExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        // Some published files carry a stray 0xFF byte
        let cleaned: Vec<u8> = bytes.iter().copied().filter(|&b| b != 0xFF).collect();
        let text = match String::from_utf8(cleaned) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Pool text is not valid UTF-8; replacing undecodable bytes");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(&text);
        Ok(text.lines().map(str::to_string).collect())
    }
}
