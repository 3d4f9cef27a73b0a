//! Document upload and summary.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info, warn};

use hrassist_core::Error;
use hrassist_engine::SUMMARY_WORDS;

use super::error_response;
use crate::state::AppState;

pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/documents/upload",
        post(upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD)),
    )
}

/// Accept only non-empty PDFs within the size limit.
pub fn check_upload(filename: Option<&str>, size: usize) -> Result<(), &'static str> {
    let is_pdf = filename.is_some_and(|name| name.to_ascii_lowercase().ends_with(".pdf"));
    if !is_pdf {
        return Err("Only PDF files are supported");
    }
    if size > MAX_UPLOAD_BYTES {
        return Err("File size too large. Maximum 50MB allowed.");
    }
    if size == 0 {
        return Err("File is empty");
    }
    Ok(())
}

/// POST /api/documents/upload: summarise one PDF (multipart field `file`).
async fn upload(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.file_name().is_none() && field.name() != Some("file") {
                    continue;
                }
                let filename = field.file_name().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => {
                        upload = Some((filename, bytes));
                        break;
                    }
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read upload: {}", e),
                        )
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e))
            }
        }
    }

    let Some((filename, bytes)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    };
    if let Err(reason) = check_upload(filename.as_deref(), bytes.len()) {
        warn!(filename = ?filename, size = bytes.len(), "Rejected upload: {}", reason);
        return error_response(StatusCode::BAD_REQUEST, reason);
    }

    // Malformed PDFs can panic inside the parser; the join error covers that.
    let extracted =
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await;
    let text = match extracted {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Failed to extract text from PDF: {}", e),
            )
        }
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Failed to extract text from PDF: unreadable document",
            )
        }
    };
    if text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No text content found in PDF");
    }

    match hrassist_engine::summarize(state.engine.generator(), &text, SUMMARY_WORDS).await {
        Ok(summary) => {
            info!(
                filename = ?filename,
                words = summary.word_count,
                generated = summary.generated,
                "document summarised"
            );
            Json(serde_json::json!({
                "filename": filename,
                "document_type": summary.document_type,
                "executive_summary": summary.executive_summary,
                "keywords": summary.keywords,
                "word_count": summary.word_count,
                "generated": summary.generated,
            }))
            .into_response()
        }
        Err(Error::Validation(reason)) => error_response(StatusCode::BAD_REQUEST, reason),
        Err(e) => {
            error!("Summary failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
