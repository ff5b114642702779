//! Report export endpoints
//!
//! - GET /api/reports/inspections/bulk-pdf?dateFrom&dateTo - Download the export
//! - POST /api/reports/inspections/bulk-pdf - Same export, streamed as NDJSON progress

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::channel::mpsc;

use crate::auth::{authenticate, Caller};
use crate::db::ProfileRepository;
use crate::error::{AppError, Result};
use crate::export::{BodyChunk, ChannelSink, ExportArtifact, ExportRequest, NullSink};
use crate::state::AppState;

/// Progress lines buffered ahead of a slow client
const STREAM_BUFFER: usize = 16;

/// Create the reports router
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/inspections/bulk-pdf",
        get(download_bulk_pdf).post(stream_bulk_pdf),
    )
}

async fn caller(state: &AppState, headers: &HeaderMap) -> Result<Caller> {
    authenticate(&ProfileRepository::new(state.db()), headers).await
}

/// GET /api/reports/inspections/bulk-pdf
///
/// Returns the finished PDF or ZIP as an attachment.
async fn download_bulk_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(request): Query<ExportRequest>,
) -> Result<Response> {
    let caller = caller(&state, &headers).await?;
    let exporter = state.exporter();

    let job = exporter.prepare(&caller, &request).await?;
    let artifact = exporter.run(job, &mut NullSink).await?;

    Ok(attachment(artifact))
}

/// POST /api/reports/inspections/bulk-pdf
///
/// Failures before rendering starts are plain JSON errors. After that the
/// response is a stream of `init`, `progress` and one terminal line.
async fn stream_bulk_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let caller = caller(&state, &headers).await?;
    let request = parse_body(&body)?;
    let job = state.exporter().prepare(&caller, &request).await?;

    let (tx, rx) = mpsc::channel::<BodyChunk>(STREAM_BUFFER);
    let task_state = state.clone();
    tokio::spawn(async move {
        let mut sink = ChannelSink::new(tx);
        if let Err(e) = task_state.exporter().run_streaming(job, &mut sink).await {
            tracing::debug!("Export stream closed early: {}", e);
        }
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(rx))
        .map_err(|e| AppError::Internal(format!("failed to build stream response: {}", e)))
}

/// An empty body is treated as a request with no parameters
fn parse_body(body: &[u8]) -> Result<ExportRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ExportRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::InvalidParameter {
        name: "body",
        reason: e.to_string(),
    })
}

fn attachment(artifact: ExportArtifact) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(artifact.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response()
}
