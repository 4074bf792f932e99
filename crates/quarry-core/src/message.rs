//! Messages exchanged between a dispatcher and its execution context.

use crate::types::{Chunk, MediaType};

/// The single request sent to an execution context.
///
/// Payload bytes are moved into the message; the sender keeps no access.
#[derive(Debug)]
pub enum Request {
    Text { chunks: Vec<Chunk> },
    Pdf { buffer: Vec<u8> },
    Epub { buffer: Vec<u8> },
}

impl Request {
    /// Media type selecting the extractor for this request.
    pub fn media_type(&self) -> MediaType {
        match self {
            Request::Text { .. } => MediaType::PlainText,
            Request::Pdf { .. } => MediaType::Pdf,
            Request::Epub { .. } => MediaType::Epub,
        }
    }

    /// Total payload size in bytes.
    pub fn payload_len(&self) -> usize {
        match self {
            Request::Text { chunks } => chunks.iter().map(Chunk::len).sum(),
            Request::Pdf { buffer } | Request::Epub { buffer } => buffer.len(),
        }
    }

    /// Consume the request into its payload chunks.
    ///
    /// Buffer requests become a single chunk.
    pub fn into_chunks(self) -> Vec<Chunk> {
        match self {
            Request::Text { chunks } => chunks,
            Request::Pdf { buffer } | Request::Epub { buffer } => {
                if buffer.is_empty() {
                    Vec::new()
                } else {
                    vec![Chunk::new(0, 0, buffer)]
                }
            }
        }
    }

    /// Consume the request into one contiguous buffer.
    pub fn into_buffer(self) -> Vec<u8> {
        match self {
            Request::Pdf { buffer } | Request::Epub { buffer } => buffer,
            Request::Text { mut chunks } => {
                if chunks.len() == 1 {
                    return chunks.remove(0).into_bytes();
                }
                let total = chunks.iter().map(Chunk::len).sum();
                let mut buffer = Vec::with_capacity(total);
                for chunk in chunks {
                    buffer.extend_from_slice(chunk.as_bytes());
                }
                buffer
            }
        }
    }
}

/// Messages emitted by an execution context.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    /// Fraction of work completed, in `[0, 1]`.
    Progress { fraction: f64 },
    /// Extraction finished with the given text.
    Complete { text: String },
    /// Extraction failed.
    Error { reason: String },
}

impl WorkerMessage {
    /// Whether this message ends the protocol.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerMessage::Progress { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_media_type() {
        assert_eq!(
            Request::Text { chunks: vec![] }.media_type(),
            MediaType::PlainText
        );
        assert_eq!(Request::Pdf { buffer: vec![] }.media_type(), MediaType::Pdf);
        assert_eq!(Request::Epub { buffer: vec![] }.media_type(), MediaType::Epub);
    }

    #[test]
    fn test_text_request_into_buffer_concatenates_in_order() {
        let request = Request::Text {
            chunks: vec![
                Chunk::new(0, 0, b"ab".to_vec()),
                Chunk::new(1, 2, b"cd".to_vec()),
            ],
        };
        assert_eq!(request.payload_len(), 4);
        assert_eq!(request.into_buffer(), b"abcd".to_vec());
    }

    #[test]
    fn test_buffer_request_into_chunks() {
        let chunks = Request::Pdf {
            buffer: b"%PDF".to_vec(),
        }
        .into_chunks();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_bytes(), b"%PDF");

        assert!(Request::Epub { buffer: vec![] }.into_chunks().is_empty());
    }

    #[test]
    fn test_terminal_messages() {
        assert!(!WorkerMessage::Progress { fraction: 0.5 }.is_terminal());
        assert!(WorkerMessage::Complete {
            text: String::new()
        }
        .is_terminal());
        assert!(WorkerMessage::Error {
            reason: "boom".into()
        }
        .is_terminal());
    }
}
