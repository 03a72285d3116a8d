//! API handlers for the splice server
//!
//! Multipart bodies land in the transient upload directory, the core
//! assembler produces output documents, and the artifact store hands back
//! download names. Validation failures surface before any assembly starts;
//! accepted uploads are released on every path.

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use pdfsplice_core::{get_page_count, parse_ranges, split_document, Merger};

use crate::error::ServerError;
use crate::store::ArtifactKind;
use crate::upload::TempUpload;
use crate::AppState;

/// Most files accepted by one merge request
const MAX_MERGE_FILES: usize = 10;

/// Largest accepted request body
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Create the API router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/merge", post(handle_merge))
        .route("/api/split", post(handle_split))
        .route("/download/:filename", get(handle_download))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdfsplice-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Body returned by both assembly endpoints
#[derive(Serialize)]
pub struct OperationResponse {
    pub success: bool,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
}

/// Handler: POST /api/merge
///
/// Multipart field `pdfs`, 2 to 10 files. Pages of every source are
/// appended in upload order; each upload is removed as soon as its pages
/// have been imported, before the next source is read.
pub async fn handle_merge(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<OperationResponse>, ServerError> {
    let mut uploads: Vec<TempUpload> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("pdfs") {
            continue;
        }
        if uploads.len() == MAX_MERGE_FILES {
            return Err(ServerError::InvalidRequest(format!(
                "At most {} PDF files can be merged at once",
                MAX_MERGE_FILES
            )));
        }
        let original_name = field.file_name().map(|s| s.to_string());
        let bytes = field.bytes().await?;
        uploads.push(state.intake.save(&bytes, original_name.as_deref())?);
    }

    if uploads.len() < 2 {
        return Err(ServerError::InvalidRequest(
            "Please upload at least 2 PDF files".to_string(),
        ));
    }

    info!(files = uploads.len(), "merge request");

    let mut merger = Merger::new();
    for upload in uploads {
        let bytes = upload.read()?;
        merger.append(&bytes)?;
        // upload drops here: its backing file is gone before the next
        // source is read
    }
    let merged = merger.finish()?;

    let artifact = state.store.persist(&merged, &ArtifactKind::Merged)?;
    info!(file = %artifact.file_name, "merge complete");

    Ok(Json(OperationResponse {
        success: true,
        download_url: format!("/download/{}", artifact.file_name),
    }))
}

/// Handler: POST /api/split
///
/// Multipart field `pdf` plus form field `pages` holding the range
/// expression. One output per range group; several groups are additionally
/// bundled into a zip archive whose URL is returned.
pub async fn handle_split(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<OperationResponse>, ServerError> {
    let mut upload: Option<TempUpload> = None;
    let mut expression = String::new();

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("pdf") => {
                let original_name = field.file_name().map(|s| s.to_string());
                let bytes = field.bytes().await?;
                upload = Some(state.intake.save(&bytes, original_name.as_deref())?);
            }
            Some("pages") => expression = field.text().await?,
            _ => {}
        }
    }

    let upload =
        upload.ok_or_else(|| ServerError::InvalidRequest("Please upload a PDF file".to_string()))?;

    let bytes = upload.read()?;
    let page_count = get_page_count(&bytes)?;
    let ranges = parse_ranges(&expression, page_count)?;

    info!(pages = page_count, groups = ranges.len(), "split request");

    let outputs = split_document(&bytes, &ranges)?;
    // All groups copied; the source upload can go
    drop(upload);

    let mut artifacts = Vec::with_capacity(outputs.len());
    for (output, range) in outputs.iter().zip(&ranges) {
        let kind = ArtifactKind::Split {
            label: range.label(),
        };
        artifacts.push(state.store.persist(output, &kind)?);
    }

    let download = if artifacts.len() == 1 {
        artifacts.remove(0)
    } else {
        state.store.bundle(&artifacts)?
    };
    info!(file = %download.file_name, "split complete");

    Ok(Json(OperationResponse {
        success: true,
        download_url: format!("/download/{}", download.file_name),
    }))
}

/// Handler: GET /download/:filename
pub async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ServerError> {
    let path = state
        .store
        .resolve(&filename)
        .ok_or_else(|| ServerError::NotFound(filename.clone()))?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        // Deleted between resolve and read: an expiry timer won the race
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServerError::NotFound(filename));
        }
        Err(e) => return Err(ServerError::Io(e)),
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&filename))
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(bytes))
        .map_err(|e| ServerError::Processing(e.to_string()))
}

/// Content type from the artifact extension
fn content_type_for(name: &str) -> &'static str {
    match name.rsplit('.').next() {
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let Json(response) = handle_health().await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.service, "pdfsplice-server");
    }

    #[test]
    fn test_content_type_for_known_extensions() {
        assert_eq!(content_type_for("merged_1.pdf"), "application/pdf");
        assert_eq!(content_type_for("split_results_1.zip"), "application/zip");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
