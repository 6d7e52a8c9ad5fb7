//! API handlers for the pdfpatch server
//!
//! Provides REST endpoints for:
//! - Page geometry inspection
//! - Overlay mutation (base64 JSON and multipart upload)

use std::time::Instant;

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use pdfpatch_core::{Directive, MutationOptions, MutationReport, PageInfo, PdfMutator};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ServerError;
use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /api/health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdfpatch-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn decode_pdf(file: &str) -> Result<Vec<u8>, ServerError> {
    let bytes = STANDARD
        .decode(file.trim())
        .map_err(|e| ServerError::InvalidRequest(format!("Invalid base64 file: {}", e)))?;
    if bytes.is_empty() {
        return Err(ServerError::InvalidRequest("Empty file".into()));
    }
    Ok(bytes)
}

#[derive(Deserialize)]
pub struct InfoRequest {
    /// Base64-encoded PDF
    pub file: String,
}

#[derive(Serialize)]
pub struct InfoResponse {
    pub success: bool,
    pub page_count: usize,
    pub pages: Vec<PageInfo>,
}

/// Handler: POST /api/pdf/info
pub async fn handle_info(
    State(state): State<AppState>,
    Json(req): Json<InfoRequest>,
) -> Result<Json<InfoResponse>, ServerError> {
    let bytes = decode_pdf(&req.file)?;
    debug!("Info request: {} bytes", bytes.len());

    let pages = state
        .run_job(move || pdfpatch_core::page_info(&bytes).map_err(ServerError::from))
        .await?;

    Ok(Json(InfoResponse {
        success: true,
        page_count: pages.len(),
        pages,
    }))
}

#[derive(Deserialize)]
pub struct MutateRequest {
    /// Base64-encoded PDF
    pub file: String,
    #[serde(default)]
    pub modifications: Vec<Directive>,
    /// Overrides the server's default options
    pub options: Option<MutationOptions>,
}

#[derive(Serialize)]
pub struct MutateMetrics {
    pub input_size: usize,
    pub output_size: usize,
    pub processing_time_ms: u64,
}

#[derive(Serialize)]
pub struct MutateResponse {
    pub success: bool,
    /// Base64-encoded output PDF
    pub data: Option<String>,
    pub error: Option<String>,
    pub report: Option<MutationReport>,
    pub metrics: Option<MutateMetrics>,
}

struct MutationJob {
    bytes: Vec<u8>,
    report: MutationReport,
    metrics: MutateMetrics,
}

async fn run_mutation(
    state: &AppState,
    input: Vec<u8>,
    directives: Vec<Directive>,
    options: Option<MutationOptions>,
) -> Result<MutationJob, ServerError> {
    let mutator = PdfMutator::new(options.unwrap_or_else(|| state.options.clone()));
    info!(
        "Mutate request: {} bytes, {} directive(s)",
        input.len(),
        directives.len()
    );

    state
        .run_job(move || {
            let start = Instant::now();
            let output = mutator.mutate_bytes(&input, &directives)?;
            let metrics = MutateMetrics {
                input_size: input.len(),
                output_size: output.bytes.len(),
                processing_time_ms: start.elapsed().as_millis() as u64,
            };
            Ok(MutationJob {
                bytes: output.bytes,
                report: output.report,
                metrics,
            })
        })
        .await
}

/// Handler: POST /api/pdf/mutate
pub async fn handle_mutate(
    State(state): State<AppState>,
    Json(req): Json<MutateRequest>,
) -> Result<Json<MutateResponse>, ServerError> {
    let input = decode_pdf(&req.file)?;
    let job = run_mutation(&state, input, req.modifications, req.options).await?;

    Ok(Json(MutateResponse {
        success: true,
        data: Some(STANDARD.encode(&job.bytes)),
        error: None,
        report: Some(job.report),
        metrics: Some(job.metrics),
    }))
}

/// Handler: POST /api/pdf/mutate/upload
///
/// Multipart fields: `file` (PDF bytes), `modifications` (JSON directive
/// list) and optionally `options` (JSON). Responds with the PDF itself.
pub async fn handle_mutate_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ServerError> {
    let mut file = None;
    let mut directives = None;
    let mut options = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => file = Some(field.bytes().await?.to_vec()),
            "modifications" => {
                let text = field.text().await?;
                directives = Some(Directive::from_json_list(&text).map_err(ServerError::from)?);
            }
            "options" => {
                let text = field.text().await?;
                let parsed: MutationOptions = serde_json::from_str(&text)
                    .map_err(|e| ServerError::InvalidRequest(format!("Invalid options: {}", e)))?;
                options = Some(parsed);
            }
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    let file = file.filter(|bytes| !bytes.is_empty()).ok_or_else(|| {
        ServerError::InvalidRequest("No file provided. Use field name 'file'".into())
    })?;
    let directives = directives.unwrap_or_default();

    let job = run_mutation(&state, file, directives, options).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"patched.pdf\"".to_string(),
            ),
            (
                header::HeaderName::from_static("x-pdfpatch-applied"),
                job.report.applied().to_string(),
            ),
            (
                header::HeaderName::from_static("x-pdfpatch-skipped"),
                job.report.skipped().to_string(),
            ),
            (
                header::HeaderName::from_static("x-pdfpatch-failed"),
                job.report.failed().to_string(),
            ),
        ],
        job.bytes,
    )
        .into_response())
}
