//! Inspect command: report how a document would be processed.

use super::{format_size, load_config, open_source};
use anyhow::Result;
use colored::Colorize;
use quarry_core::{chunk_count, MediaType, SourceFile};
use quarry_ingest::IngestOptions;
use std::path::Path;

pub fn run(path: &Path, media_type: Option<String>) -> Result<()> {
    let config = load_config()?;
    let options = IngestOptions::from_config(&config);
    let source = open_source(path, media_type.as_deref())?;
    let size = source.size_bytes();

    println!("{}", path.display().to_string().cyan().bold());
    println!("{}", "─".repeat(50));
    println!("  Media type: {}", source.media_type());
    println!("  Size:       {}", format_size(size));

    match MediaType::from_mime(source.media_type()) {
        Some(MediaType::PlainText) => {
            println!(
                "  Chunks:     {} of {}",
                chunk_count(size, options.chunk_size),
                format_size(options.chunk_size as u64)
            );
        }
        Some(MediaType::Epub) => {
            println!(
                "  Batches:    {} entries at a time, {} order",
                options.epub.batch_width,
                format!("{:?}", options.epub.reading_order).to_lowercase()
            );
        }
        Some(MediaType::Pdf) => println!("  Pages are extracted one at a time"),
        None => println!("  {}", "Unsupported file type".red()),
    }

    if size > config.ingest.max_file_size_bytes() {
        println!(
            "  {} exceeds the {} MB limit",
            "Warning:".yellow(),
            config.ingest.max_file_size_mb
        );
    }

    Ok(())
}
