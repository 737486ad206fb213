use crate::{extract::ExtractError, interpret::InterpretError, render::RenderError};
use thiserror::Error;

/// Every way a conversion request can end without an artifact. None of
/// these are retried.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Interpret(#[from] InterpretError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("worker task failed: {0}")]
    Task(String),
}

impl ConvertError {
    /// Stable machine-readable name, used in HTTP error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Extract(ExtractError::UnsupportedFormat { .. }) => "unsupported_format",
            Self::Extract(ExtractError::ExtractionFailure { .. }) => "extraction_failure",
            Self::Extract(ExtractError::TooLarge { .. }) => "payload_too_large",
            Self::Interpret(InterpretError::ApiFailure { .. }) => "api_failure",
            Self::Interpret(InterpretError::MalformedResponse { .. }) => "malformed_response",
            Self::Interpret(InterpretError::InvalidStructure(_)) => "invalid_structure",
            Self::Render(RenderError::InvalidStructure(_)) => "invalid_structure",
            Self::Render(RenderError::UnsupportedQuestionType { .. }) => {
                "unsupported_question_type"
            }
            Self::Render(RenderError::TooManyOptions { .. }) => "too_many_options",
            Self::Render(RenderError::OptionCodeOutOfRange { .. }) => "option_code_out_of_range",
            Self::Render(RenderError::Workbook(_)) => "workbook_error",
            Self::Task(_) => "internal",
        }
    }
}

impl From<tokio::task::JoinError> for ConvertError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}
