//! Turns extracted survey text into a [`SurveyStructure`] by asking a hosted
//! language model.

pub mod client;
pub mod prompt;
pub mod response;
pub mod schema;

pub use client::{AnthropicClient, LlmClient};
pub use response::{ParseOutcome, parse_response};

use crate::{
    config::Limits,
    survey::{SurveyStructure, ValidationError},
};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("language model API failure{}: {message}", http_status(.status))]
    ApiFailure { status: Option<u16>, message: String },
    #[error("model reply is not a valid survey structure: {reason}")]
    MalformedResponse { reason: String, raw: String },
    #[error("survey structure is inconsistent: {0}")]
    InvalidStructure(#[from] ValidationError),
}

fn http_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct Interpretation {
    pub survey: SurveyStructure,
    pub truncated: bool,
    pub model: String,
}

pub struct Interpreter<C> {
    client: C,
    max_prompt_chars: usize,
}

impl<C: LlmClient> Interpreter<C> {
    pub fn new(client: C, limits: &Limits) -> Self {
        Self {
            client,
            max_prompt_chars: limits.max_prompt_chars,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn interpret(&self, text: &str) -> Result<Interpretation, InterpretError> {
        let prompt = prompt::build(text, self.max_prompt_chars);
        if prompt.truncated {
            warn!(
                max_chars = self.max_prompt_chars,
                "extracted text truncated before prompting"
            );
        }

        let reply = self.client.complete(prompt.system, &prompt.user).await?;

        let survey = match parse_response(&reply) {
            ParseOutcome::Parsed(s) => s,
            ParseOutcome::Unparseable { raw, reason } => {
                let preview: String = raw.chars().take(200).collect();
                warn!(%reason, %preview, "model reply could not be parsed");
                return Err(InterpretError::MalformedResponse { reason, raw });
            }
        };
        survey.validate()?;

        info!(
            questions = survey.questions.len(),
            prompt_version = prompt::PROMPT_VERSION,
            "survey structure parsed"
        );

        Ok(Interpretation {
            survey,
            truncated: prompt.truncated,
            model: self.client.model().to_string(),
        })
    }
}
