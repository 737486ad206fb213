use crate::extract::Format;
use serde::{Deserialize, Serialize};

/// What happened to one upload. Logged for every request and printed by the
/// CLI; the server only exposes `request_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    /// sha256 of the uploaded bytes.
    pub request_id: String,
    pub filename: String,
    pub format: Format,
    pub input_bytes: u64,
    pub extracted_chars: usize,
    pub skipped_pages: u32,
    pub truncated: bool,
    pub prompt_version: String,
    pub model: String,
    pub question_count: usize,
    pub started: String,
    pub finished: String,
}
