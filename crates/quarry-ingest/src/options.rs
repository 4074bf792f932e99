//! Runtime options for an ingestion call.

use quarry_config::{Config, ReadingOrder};
use quarry_core::{DEFAULT_CHUNK_SIZE, DEFAULT_EPUB_BATCH_WIDTH};

/// Options controlling how sources are split and extracted.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Size of plain-text chunks in bytes.
    pub chunk_size: usize,
    pub epub: EpubOptions,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            epub: EpubOptions::default(),
        }
    }
}

impl IngestOptions {
    /// Create options from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_size: config.ingest.chunk_size_bytes,
            epub: EpubOptions {
                batch_width: config.epub.batch_width,
                reading_order: config.epub.reading_order,
            },
        }
    }
}

/// EPUB extraction options.
#[derive(Debug, Clone)]
pub struct EpubOptions {
    /// Content documents extracted concurrently per batch.
    pub batch_width: usize,
    pub reading_order: ReadingOrder,
}

impl Default for EpubOptions {
    fn default() -> Self {
        Self {
            batch_width: DEFAULT_EPUB_BATCH_WIDTH,
            reading_order: ReadingOrder::Archive,
        }
    }
}
