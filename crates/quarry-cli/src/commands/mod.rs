//! CLI command implementations.

pub mod config;
pub mod extract;
pub mod init;
pub mod inspect;

use anyhow::{Context, Result};
use quarry_config::{AppPaths, Config};
use quarry_core::{FileSource, MediaType};
use std::path::Path;

/// Get the application paths.
pub fn get_paths() -> Result<AppPaths> {
    AppPaths::new().context("Failed to determine application directories")
}

/// Load the configuration, falling back to defaults when no file exists.
pub fn load_config() -> Result<Config> {
    Config::load().context("Failed to load config")
}

/// Open a document, honouring an explicit `--type` override.
pub fn open_source(path: &Path, media_type: Option<&str>) -> Result<FileSource> {
    let source = match media_type {
        Some(raw) => {
            let media_type: MediaType = raw.parse()?;
            FileSource::with_media_type(path, media_type.mime())
        }
        None => FileSource::open(path),
    };
    source.with_context(|| format!("Failed to open {}", path.display()))
}

/// Format a file size in human-readable form.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::SourceFile;
    use tempfile::NamedTempFile;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(12), "12 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_open_source_with_override() {
        let file = NamedTempFile::with_suffix(".dat").unwrap();

        let detected = open_source(file.path(), None).unwrap();
        assert_eq!(detected.media_type(), "application/octet-stream");

        let forced = open_source(file.path(), Some("txt")).unwrap();
        assert_eq!(forced.media_type(), "text/plain");

        assert!(open_source(file.path(), Some("image/png")).is_err());
    }
}
