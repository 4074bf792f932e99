//! Core domain types for Quarry.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Size of one plain-text chunk (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Largest configurable plain-text chunk (64 MiB).
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Number of EPUB content documents extracted concurrently.
pub const DEFAULT_EPUB_BATCH_WIDTH: usize = 5;

/// Default upper bound on accepted source files (50 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Kind of document the pipeline knows how to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "text/plain")]
    PlainText,
    #[serde(rename = "application/pdf")]
    Pdf,
    #[serde(rename = "application/epub+zip")]
    Epub,
}

impl MediaType {
    /// All supported media types.
    pub const ALL: [MediaType; 3] = [MediaType::PlainText, MediaType::Pdf, MediaType::Epub];

    /// The MIME string for this media type.
    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::PlainText => "text/plain",
            MediaType::Pdf => "application/pdf",
            MediaType::Epub => "application/epub+zip",
        }
    }

    /// Short name used in logs and request tags.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::PlainText => "text",
            MediaType::Pdf => "pdf",
            MediaType::Epub => "epub",
        }
    }

    /// Parse a MIME string. Parameters such as `; charset=utf-8` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "text/plain" => Some(MediaType::PlainText),
            "application/pdf" => Some(MediaType::Pdf),
            "application/epub+zip" => Some(MediaType::Epub),
            _ => None,
        }
    }

    /// Detect media type from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" | "text" => Some(MediaType::PlainText),
            "pdf" => Some(MediaType::Pdf),
            "epub" => Some(MediaType::Epub),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    /// Accepts either a MIME string or a short name (`text`, `pdf`, `epub`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_mime(s)
            .or_else(|| match s.to_lowercase().as_str() {
                "text" | "txt" => Some(MediaType::PlainText),
                "pdf" => Some(MediaType::Pdf),
                "epub" => Some(MediaType::Epub),
                _ => None,
            })
            .ok_or_else(|| Error::UnsupportedMediaType(s.to_string()))
    }
}

/// A bounded byte range of a plain-text source.
///
/// Chunks are immutable once read and are moved, never shared, across the
/// worker boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    index: usize,
    offset: u64,
    bytes: Vec<u8>,
}

impl Chunk {
    /// Create a chunk from bytes read at `offset`.
    pub fn new(index: usize, offset: u64, bytes: Vec<u8>) -> Self {
        Self {
            index,
            offset,
            bytes,
        }
    }

    /// Position of this chunk in the sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Byte offset of this chunk within the source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the chunk, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Number of chunks needed to cover `size` bytes with chunks of `chunk_size`.
pub fn chunk_count(size: u64, chunk_size: usize) -> usize {
    if size == 0 || chunk_size == 0 {
        return 0;
    }
    size.div_ceil(chunk_size as u64) as usize
}
