//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use quarry_core::{
    DEFAULT_CHUNK_SIZE, DEFAULT_EPUB_BATCH_WIDTH, DEFAULT_MAX_FILE_SIZE, MAX_CHUNK_SIZE,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub epub: EpubConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> ConfigResult<Self> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&paths.config_file)
    }

    /// Load configuration from a specific path.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::default_config_string())?;
        Ok(())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# Quarry Configuration

[ingest]
# Plain-text files are read and decoded in chunks of this many bytes
chunk_size_bytes = 1048576

# Files larger than this are rejected before extraction starts
max_file_size_mb = 50

[epub]
# Number of content documents extracted concurrently
batch_width = 5

# Order of content documents in the output:
#   "archive" - every .html/.xhtml entry, in archive order
#   "spine"   - the reading order declared by the package document
reading_order = "archive"

[logging]
# Default log level when RUST_LOG is not set
level = "info"
"#
        .to_string()
    }

    /// Check that values are usable.
    pub fn validate(&self) -> ConfigResult<()> {
        let chunk_size = self.ingest.chunk_size_bytes;
        if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
            return Err(ConfigError::invalid(
                "ingest.chunk_size_bytes",
                format!("must be between 1 and {}, got {}", MAX_CHUNK_SIZE, chunk_size),
            ));
        }
        if self.ingest.max_file_size_mb == 0 {
            return Err(ConfigError::invalid(
                "ingest.max_file_size_mb",
                "must be greater than zero",
            ));
        }
        if self.epub.batch_width == 0 {
            return Err(ConfigError::invalid(
                "epub.batch_width",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Ingestion limits and chunking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub chunk_size_bytes: usize,
    pub max_file_size_mb: u64,
}

impl IngestConfig {
    /// Maximum accepted file size in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: DEFAULT_CHUNK_SIZE,
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE / (1024 * 1024),
        }
    }
}

/// How EPUB content documents are selected and ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingOrder {
    /// Every `.html`/`.xhtml` entry, in archive order.
    #[default]
    Archive,
    /// Spine order from the package document.
    Spine,
}

/// EPUB extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EpubConfig {
    pub batch_width: usize,
    pub reading_order: ReadingOrder,
}

impl Default for EpubConfig {
    fn default() -> Self {
        Self {
            batch_width: DEFAULT_EPUB_BATCH_WIDTH,
            reading_order: ReadingOrder::Archive,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ingest.chunk_size_bytes, 1024 * 1024);
        assert_eq!(config.ingest.max_file_size_mb, 50);
        assert_eq!(config.ingest.max_file_size_bytes(), 50 * 1024 * 1024);
        assert_eq!(config.epub.batch_width, 5);
        assert_eq!(config.epub.reading_order, ReadingOrder::Archive);
    }

    #[test]
    fn test_default_string_matches_defaults() {
        let parsed: Config = toml::from_str(&Config::default_config_string()).unwrap();
        let defaults = Config::default();
        assert_eq!(parsed.ingest.chunk_size_bytes, defaults.ingest.chunk_size_bytes);
        assert_eq!(parsed.ingest.max_file_size_mb, defaults.ingest.max_file_size_mb);
        assert_eq!(parsed.epub.batch_width, defaults.epub.batch_width);
        assert_eq!(parsed.epub.reading_order, defaults.epub.reading_order);
        assert_eq!(parsed.logging.level, defaults.logging.level);
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
            [epub]
            reading_order = "spine"
            "#
        )
        .unwrap();

        let config = Config::load_from(temp_file.path()).unwrap();

        assert_eq!(config.epub.reading_order, ReadingOrder::Spine);
        // Unspecified values keep their defaults
        assert_eq!(config.epub.batch_width, 5);
        assert_eq!(config.ingest.chunk_size_bytes, 1024 * 1024);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.epub.batch_width, 5);
    }

    #[test]
    fn test_rejects_zero_batch_width() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[epub]\nbatch_width = 0").unwrap();

        let result = Config::load_from(temp_file.path());
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                key: "epub.batch_width",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_chunk_size() {
        let mut config = Config::default();
        config.ingest.chunk_size_bytes = MAX_CHUNK_SIZE + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                key: "ingest.chunk_size_bytes",
                ..
            })
        ));

        config.ingest.chunk_size_bytes = 0;
        assert!(config.validate().is_err());

        config.ingest.chunk_size_bytes = MAX_CHUNK_SIZE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unparsable_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[ingest\nchunk_size_bytes = ").unwrap();

        let result = Config::load_from(temp_file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.ingest.chunk_size_bytes = 4096;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.ingest.chunk_size_bytes, 4096);
    }
}
