//! Plain text extractor.

use super::{ExtractResult, Extractor, ProgressSink};
use quarry_core::{MediaType, Request};
use tracing::debug;

const BOM: char = '\u{FEFF}';

/// Incremental UTF-8 decoder.
///
/// A multi-byte sequence split across two inputs is held back until the
/// rest of it arrives. Invalid bytes decode to U+FFFD and a leading byte
/// order mark is dropped.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending: Vec<u8>,
    bom_checked: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next slice of input.
    pub fn decode(&mut self, input: &[u8]) -> String {
        let mut buffer = std::mem::take(&mut self.pending);
        buffer.extend_from_slice(input);

        let mut out = String::with_capacity(buffer.len());
        let mut rest: &[u8] = &buffer;

        while !rest.is_empty() {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&rest[..valid_up_to]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &rest[valid_up_to + len..];
                        }
                        None => {
                            // Incomplete sequence at the end; wait for more input.
                            self.pending = rest[valid_up_to..].to_vec();
                            break;
                        }
                    }
                }
            }
        }

        self.strip_bom(out)
    }

    /// Flush any bytes still held back.
    pub fn finish(&mut self) -> String {
        let pending = std::mem::take(&mut self.pending);
        let out = String::from_utf8_lossy(&pending).into_owned();
        self.strip_bom(out)
    }

    fn strip_bom(&mut self, mut out: String) -> String {
        if !self.bom_checked && !out.is_empty() {
            self.bom_checked = true;
            if out.starts_with(BOM) {
                out.drain(..BOM.len_utf8());
            }
        }
        out
    }
}

/// Extractor for plain text delivered as ordered chunks.
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for TextExtractor {
    fn media_type(&self) -> MediaType {
        MediaType::PlainText
    }

    fn extract(&self, request: Request, progress: &mut ProgressSink) -> ExtractResult<String> {
        let chunks = request.into_chunks();
        let total = chunks.len();
        let capacity = chunks.iter().map(|c| c.len()).sum();

        let mut decoder = StreamDecoder::new();
        let mut text = String::with_capacity(capacity);

        for (i, chunk) in chunks.into_iter().enumerate() {
            text.push_str(&decoder.decode(chunk.as_bytes()));
            progress.report_ratio(i + 1, total)?;
        }
        text.push_str(&decoder.finish());

        debug!("Decoded {} chunks into {} characters", total, text.len());
        Ok(text)
    }
}
