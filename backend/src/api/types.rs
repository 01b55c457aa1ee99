//! REST API types.
//!
//! Field names are camelCase on the wire.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use uuid::Uuid;

use crate::dispatch::{BatchReport, FileOutcome};
use crate::error::{DispatchError, ServerError};
use crate::registry::TransformInfo;
use crate::transform::pipeline::FileSummary;

/// Rejection returned by handlers
pub type ApiError = (StatusCode, Json<Value>);

/// `GET /api/transforms`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformListResponse {
    pub transforms: Vec<TransformInfo>,
}

/// Response sent after a batch upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Unique job identifier
    pub job_id: String,

    /// "ok" when every file was cleaned, "partial" otherwise
    pub status: String,

    /// Canonical name of the transform that ran
    pub transform: String,

    /// Success message for display
    pub message: String,

    /// Archive name, to be fetched from `downloadUrl`
    pub download: String,

    pub download_url: String,

    pub processed: Vec<ProcessedFile>,

    pub failed: Vec<FailedFile>,
}

/// A cleaned file inside the archive
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFile {
    pub input: String,
    pub output: String,
    pub rows_written: usize,
    pub row_errors: usize,
    pub rows_dropped: usize,
    pub encoding: String,
}

/// A file that could not be cleaned
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedFile {
    pub input: String,
    pub reason: String,
}

impl UploadResponse {
    pub fn new(job_id: Uuid, report: &BatchReport, archive: &str) -> Self {
        let mut processed = Vec::new();
        let mut failed = Vec::new();
        for outcome in &report.outcomes {
            match outcome {
                FileOutcome::Processed { input, output, summary } => {
                    processed.push(ProcessedFile::new(input, output, summary))
                }
                FileOutcome::Failed { input, reason } => failed.push(FailedFile {
                    input: base_name(input),
                    reason: reason.clone(),
                }),
            }
        }

        UploadResponse {
            job_id: job_id.to_string(),
            status: if failed.is_empty() { "ok" } else { "partial" }.to_string(),
            transform: report.transform.clone(),
            message: format!("{} file(s) processed successfully", processed.len()),
            download: archive.to_string(),
            download_url: format!("/api/download/{}", archive),
            processed,
            failed,
        }
    }
}

impl ProcessedFile {
    fn new(input: &Path, output: &Path, summary: &FileSummary) -> Self {
        Self {
            input: base_name(input),
            output: base_name(output),
            rows_written: summary.rows_written,
            row_errors: summary.row_errors,
            rows_dropped: summary.rows_dropped,
            encoding: summary.encoding.clone(),
        }
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Create an error response body
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

/// HTTP status for a server error
pub fn status_for(error: &ServerError) -> StatusCode {
    match error {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::NotFound(_) => StatusCode::NOT_FOUND,
        ServerError::Dispatch(DispatchError::UnknownTransform(_)) => StatusCode::BAD_REQUEST,
        ServerError::Dispatch(_) | ServerError::Archive(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServerError::Config(_) | ServerError::Internal(_) | ServerError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Turn a server error into a handler rejection
pub fn reject(error: impl Into<ServerError>) -> ApiError {
    let error = error.into();
    (status_for(&error), Json(error_response(&error.to_string())))
}
