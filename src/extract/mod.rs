//! Plain-text extraction from uploaded survey documents.
//!
//! One reader per supported format; every reader's output goes through the
//! same cleanup before it reaches the interpreter.

pub mod docx;
pub mod pdf;
pub mod text;
pub mod xlsx;

use crate::{config::Config, postprocess};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Docx,
    Xlsx,
    Txt,
    Pdf,
}

impl Format {
    pub fn from_extension(ext: &str) -> Result<Self, ExtractError> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "docx" => Ok(Self::Docx),
            "xlsx" => Ok(Self::Xlsx),
            "txt" => Ok(Self::Txt),
            "pdf" => Ok(Self::Pdf),
            other => Err(ExtractError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }

    pub fn from_filename(name: &str) -> Result<Self, ExtractError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        Self::from_extension(ext)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Txt => "txt",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file format: {extension:?} (expected docx, xlsx, txt or pdf)")]
    UnsupportedFormat { extension: String },
    #[error("could not extract text from {format} input: {reason}")]
    ExtractionFailure { format: Format, reason: String },
    #[error("upload is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
}

impl ExtractError {
    pub(crate) fn failure(format: Format, reason: impl fmt::Display) -> Self {
        Self::ExtractionFailure {
            format,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Extracted {
    pub format: Format,
    pub text: String,
    /// PDF pages that produced no text (scanned or image-only).
    pub skipped_pages: u32,
}

/// What a format reader hands back before cleanup.
pub(crate) struct RawText {
    pub text: String,
    pub skipped_pages: u32,
}

impl From<String> for RawText {
    fn from(text: String) -> Self {
        Self {
            text,
            skipped_pages: 0,
        }
    }
}

pub fn extract(cfg: &Config, bytes: &[u8], format: Format) -> Result<Extracted, ExtractError> {
    let size = bytes.len() as u64;
    if size > cfg.limits.max_upload_bytes {
        return Err(ExtractError::TooLarge {
            size,
            limit: cfg.limits.max_upload_bytes,
        });
    }

    let raw = match format {
        Format::Docx => docx::extract(bytes)?,
        Format::Xlsx => xlsx::extract(bytes)?,
        Format::Txt => text::extract(bytes)?,
        Format::Pdf => pdf::extract(bytes)?,
    };
    debug!(format = %format, raw_chars = raw.text.chars().count(), "raw extraction done");

    let text = postprocess::clean_text(&cfg.extract, &raw.text);
    if text.is_empty() {
        return Err(ExtractError::failure(format, "no extractable text"));
    }

    info!(
        format = %format,
        bytes = size,
        chars = text.chars().count(),
        skipped_pages = raw.skipped_pages,
        "extracted text"
    );

    Ok(Extracted {
        format,
        text,
        skipped_pages: raw.skipped_pages,
    })
}
