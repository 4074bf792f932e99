//! Checks applied to a source before it is handed to the pipeline.

use crate::error::{IngestError, IngestResult};
use quarry_core::{MediaType, SourceFile};

const MIB: u64 = 1024 * 1024;

/// Confirm the source has a supported media type and fits within `max_bytes`.
pub fn validate_source(file: &dyn SourceFile, max_bytes: u64) -> IngestResult<MediaType> {
    let media_type = MediaType::from_mime(file.media_type()).ok_or_else(|| {
        IngestError::Validation(
            "Invalid file type. Please upload a TXT, PDF, or EPUB file.".to_string(),
        )
    })?;

    if file.size_bytes() > max_bytes {
        return Err(IngestError::Validation(format!(
            "File is too large. Maximum size is {}.",
            format_limit(max_bytes)
        )));
    }

    Ok(media_type)
}

fn format_limit(bytes: u64) -> String {
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}
