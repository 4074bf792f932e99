//! Readable document sources.

use crate::error::{Error, Result};
use crate::types::MediaType;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read-only handle to the binary content of a document.
pub trait SourceFile: Send + Sync {
    /// MIME type as reported by whoever produced the handle.
    fn media_type(&self) -> &str;

    /// Size of the content in bytes.
    fn size_bytes(&self) -> u64;

    /// Read up to `len` bytes starting at `offset`.
    fn read_range(&self, offset: u64, len: usize) -> io::Result<Vec<u8>>;

    /// Read the whole content.
    fn read_all(&self) -> io::Result<Vec<u8>> {
        let len = usize::try_from(self.size_bytes())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "source too large"))?;
        self.read_range(0, len)
    }
}

impl<T: SourceFile + ?Sized> SourceFile for Arc<T> {
    fn media_type(&self) -> &str {
        (**self).media_type()
    }

    fn size_bytes(&self) -> u64 {
        (**self).size_bytes()
    }

    fn read_range(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        (**self).read_range(offset, len)
    }

    fn read_all(&self) -> io::Result<Vec<u8>> {
        (**self).read_all()
    }
}

/// A source backed by a file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    media_type: String,
    size: u64,
}

impl FileSource {
    /// Open a file, detecting its media type from the extension.
    ///
    /// Unknown extensions yield `application/octet-stream`, which the
    /// pipeline rejects as unsupported.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let media_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(MediaType::from_extension)
            .map(|m| m.mime().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        Self::with_media_type(path, media_type)
    }

    /// Open a file with an explicit MIME type.
    pub fn with_media_type(path: impl AsRef<Path>, media_type: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(Error::InvalidInput(format!(
                "not a regular file: {}",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            media_type: media_type.into(),
            size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceFile for FileSource {
    fn media_type(&self) -> &str {
        &self.media_type
    }

    fn size_bytes(&self) -> u64 {
        self.size
    }

    fn read_range(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let expected = (len as u64).min(self.size.saturating_sub(offset));
        let mut buffer = Vec::with_capacity(expected as usize);
        file.take(len as u64).read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn read_all(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

/// A source holding its content in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    media_type: String,
    bytes: Vec<u8>,
}

impl MemorySource {
    pub fn new(media_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Create a source for one of the supported media types.
    pub fn of(media_type: MediaType, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(media_type.mime(), bytes)
    }
}

impl SourceFile for MemorySource {
    fn media_type(&self) -> &str {
        &self.media_type
    }

    fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_range(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(self.bytes.len());
        let end = start.saturating_add(len).min(self.bytes.len());
        Ok(self.bytes[start..end].to_vec())
    }
}
