use crate::{
    config::Config,
    error::ConvertError,
    extract::{self, Extracted, Format},
    interpret::{Interpretation, Interpreter, LlmClient, prompt::PROMPT_VERSION},
    render,
    report::ConversionReport,
    survey::SurveyStructure,
    util::{now_rfc3339, output_filename, sha256_hex},
};
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};

/// One uploaded document.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct Analysis {
    pub survey: SurveyStructure,
    pub report: ConversionReport,
}

pub struct Conversion {
    pub workbook: Vec<u8>,
    pub filename: String,
    pub report: ConversionReport,
}

/// extract -> interpret -> render, strictly in that order, once per upload.
pub struct Pipeline<C: LlmClient> {
    cfg: Arc<Config>,
    interpreter: Interpreter<C>,
}

impl<C: LlmClient> Pipeline<C> {
    pub fn new(cfg: &Config, client: C) -> Self {
        Self {
            cfg: Arc::new(cfg.clone()),
            interpreter: Interpreter::new(client, &cfg.limits),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn interpreter(&self) -> &Interpreter<C> {
        &self.interpreter
    }

    /// Extraction and interpretation only; the structure goes back as-is.
    pub async fn analyze(&self, upload: Upload) -> Result<Analysis, ConvertError> {
        let request_id = sha256_hex(&upload.bytes);
        let span = info_span!("analyze", request_id = %short(&request_id));
        async move {
            let started = now_rfc3339();
            let (extracted, interpretation) = self.understand(&upload).await?;
            let report = self.report(&upload, request_id, started, &extracted, &interpretation);
            info!(questions = report.question_count, "analysis finished");
            Ok::<_, ConvertError>(Analysis {
                survey: interpretation.survey,
                report,
            })
        }
        .instrument(span)
        .await
    }

    pub async fn convert(&self, upload: Upload) -> Result<Conversion, ConvertError> {
        let request_id = sha256_hex(&upload.bytes);
        let span = info_span!("convert", request_id = %short(&request_id));
        async move {
            let started = now_rfc3339();
            let (extracted, interpretation) = self.understand(&upload).await?;

            let cfg = self.cfg.clone();
            let survey = interpretation.survey.clone();
            let workbook =
                tokio::task::spawn_blocking(move || render::render(&survey, &cfg.render))
                    .await??;

            let report = self.report(&upload, request_id, started, &extracted, &interpretation);
            info!(
                questions = report.question_count,
                workbook_bytes = workbook.len(),
                "conversion finished"
            );
            Ok::<_, ConvertError>(Conversion {
                workbook,
                filename: output_filename(&upload.filename),
                report,
            })
        }
        .instrument(span)
        .await
    }

    /// Format check first: an unsupported upload never reaches the model.
    async fn understand(
        &self,
        upload: &Upload,
    ) -> Result<(Extracted, Interpretation), ConvertError> {
        let format = Format::from_filename(&upload.filename)?;
        info!(filename = %upload.filename, format = %format, bytes = upload.bytes.len(), "upload received");

        let cfg = self.cfg.clone();
        let bytes = upload.bytes.clone();
        let extracted =
            tokio::task::spawn_blocking(move || extract::extract(&cfg, &bytes, format)).await??;
        if extracted.skipped_pages > 0 {
            warn!(
                skipped_pages = extracted.skipped_pages,
                "some pages had no text layer; the structure may be incomplete"
            );
        }

        let interpretation = self.interpreter.interpret(&extracted.text).await?;
        Ok((extracted, interpretation))
    }

    fn report(
        &self,
        upload: &Upload,
        request_id: String,
        started: String,
        extracted: &Extracted,
        interpretation: &Interpretation,
    ) -> ConversionReport {
        ConversionReport {
            request_id,
            filename: upload.filename.clone(),
            format: extracted.format,
            input_bytes: upload.bytes.len() as u64,
            extracted_chars: extracted.text.chars().count(),
            skipped_pages: extracted.skipped_pages,
            truncated: interpretation.truncated,
            prompt_version: PROMPT_VERSION.to_string(),
            model: interpretation.model.clone(),
            question_count: interpretation.survey.questions.len(),
            started,
            finished: now_rfc3339(),
        }
    }
}

fn short(id: &str) -> &str {
    &id[..id.len().min(12)]
}
