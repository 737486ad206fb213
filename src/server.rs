//! HTTP surface: `POST /convert`, `POST /analyze`, `GET /health`.

use crate::{
    config::Config,
    error::ConvertError,
    extract::ExtractError,
    interpret::{InterpretError, LlmClient},
    pipeline::{Pipeline, Upload},
    render::{RenderError, XLSX_CONTENT_TYPE},
};
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

const UPLOAD_FIELD: &str = "file";
/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

pub fn router<C: LlmClient + 'static>(pipeline: Arc<Pipeline<C>>) -> Router {
    let cfg = pipeline.config();
    let body_limit = cfg
        .limits
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD)
        .min(usize::MAX as u64) as usize;
    let permissive_cors = cfg.server.permissive_cors;

    let app = Router::new()
        .route("/convert", post(convert::<C>))
        .route("/analyze", post(analyze::<C>))
        .route("/health", get(|| async { "OK" }))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(pipeline);

    if permissive_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

pub async fn serve<C: LlmClient + 'static>(cfg: &Config, pipeline: Arc<Pipeline<C>>) -> Result<()> {
    let app = router(pipeline);
    let listener = TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("binding {}", cfg.server.bind))?;
    info!("listening on {}", cfg.server.bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("could not listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn convert<C: LlmClient + 'static>(
    State(pipeline): State<Arc<Pipeline<C>>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;
    let conversion = pipeline.convert(upload).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE));
    if let Ok(v) = HeaderValue::from_str(&content_disposition(&conversion.filename)) {
        headers.insert(header::CONTENT_DISPOSITION, v);
    }
    if let Ok(v) = HeaderValue::from_str(&conversion.report.request_id) {
        headers.insert("x-request-id", v);
    }
    Ok((StatusCode::OK, headers, conversion.workbook).into_response())
}

async fn analyze<C: LlmClient + 'static>(
    State(pipeline): State<Arc<Pipeline<C>>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;
    let analysis = pipeline.analyze(upload).await?;

    let mut response = Json(analysis.survey).into_response();
    if let Ok(v) = HeaderValue::from_str(&analysis.report.request_id) {
        response.headers_mut().insert("x-request-id", v);
    }
    Ok(response)
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("upload has no filename".into()))?;
        let bytes = field.bytes().await?;
        return Ok(Upload {
            filename,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError::BadRequest(format!(
        "multipart field {UPLOAD_FIELD:?} is missing"
    )))
}

/// ASCII fallback plus RFC 5987 `filename*` for the real (usually Korean) name.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    )
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Multipart(MultipartError),
    Convert(ConvertError),
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::Multipart(e)
    }
}

impl From<ConvertError> for ApiError {
    fn from(e: ConvertError) -> Self {
        Self::Convert(e)
    }
}

pub fn status_for(err: &ConvertError) -> StatusCode {
    match err {
        ConvertError::Extract(e) => match e {
            ExtractError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ExtractError::ExtractionFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ExtractError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        },
        ConvertError::Interpret(e) => match e {
            InterpretError::ApiFailure { .. } | InterpretError::MalformedResponse { .. } => {
                StatusCode::BAD_GATEWAY
            }
            InterpretError::InvalidStructure(_) => StatusCode::UNPROCESSABLE_ENTITY,
        },
        ConvertError::Render(e) => match e {
            RenderError::Workbook(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        },
        ConvertError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.clone()),
            Self::Multipart(e) => (e.status(), "bad_multipart", e.body_text()),
            Self::Convert(e) => (status_for(e), e.kind(), e.to_string()),
        };

        if status.is_server_error() {
            error!(%status, kind, %message, "request failed");
        } else {
            warn!(%status, kind, %message, "request rejected");
        }

        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}
