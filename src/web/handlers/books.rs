//! Book handlers: upload, list, download, delete and raw metadata.

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{Redirect, Response},
    Json,
};
use std::sync::Arc;

use crate::catalog::{NewUpload, UploadOutcome, DEFAULT_CONTENT_TYPE};
use crate::web::dto::{ApiResponse, BookResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Build a Content-Disposition header value for file downloads.
///
/// `filename` carries an ASCII-only fallback with control characters dropped
/// and quotes, backslashes and non-ASCII characters replaced by `_`.
/// `filename*` carries the full name percent-encoded as UTF-8 (RFC 5987).
fn content_disposition_header(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            c => c,
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Upload exceeds the size limit")
    } else {
        tracing::error!("Failed to read multipart data: {}", e);
        ApiError::bad_request("Invalid multipart data")
    }
}

/// POST /upload - Upload a file.
///
/// Request body: multipart/form-data with a "file" field.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "books",
    responses(
        (status = 201, description = "File stored", body = BookResponse),
        (status = 400, description = "Missing file field or invalid file name"),
        (status = 409, description = "A file with the same name already exists"),
        (status = 413, description = "File too large"),
        (status = 422, description = "Empty file")
    )
)]
pub async fn upload_book(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<BookResponse>>), ApiError> {
    let mut upload: Option<NewUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::bad_request("No file name provided"))?;
        let content_type = field.content_type().map(|s| s.to_string());
        let content = field.bytes().await.map_err(multipart_error)?.to_vec();

        let mut new_upload = NewUpload::new(filename, content);
        if let Some(content_type) = content_type {
            new_upload = new_upload.with_content_type(content_type);
        }
        upload = Some(new_upload);
        break;
    }

    let upload = upload.ok_or_else(|| ApiError::bad_request("No file provided"))?;

    if upload.size() > state.max_upload_size {
        let max_mb = state.max_upload_size / 1024 / 1024;
        return Err(ApiError::payload_too_large(format!(
            "File too large (max {}MB)",
            max_mb
        )));
    }

    match state.catalog.upload(upload)? {
        UploadOutcome::Stored(record) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::new(BookResponse::from(record))),
        )),
        UploadOutcome::Duplicate(duplicate) => {
            let message = if duplicate.size_mismatch {
                format!(
                    "A different file named {} already exists",
                    duplicate.existing.name
                )
            } else {
                format!("{} already exists", duplicate.existing.name)
            };
            Err(ApiError::conflict(message))
        }
    }
}

/// GET /api/books - List all books.
#[utoipa::path(
    get,
    path = "/api/books",
    tag = "books",
    responses(
        (status = 200, description = "All books, oldest first", body = Vec<BookResponse>)
    )
)]
pub async fn list_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<BookResponse>>>, ApiError> {
    let books = state
        .catalog
        .list()?
        .into_iter()
        .map(BookResponse::from)
        .collect();

    Ok(Json(ApiResponse::new(books)))
}

/// GET /download/:id - Download a file.
#[utoipa::path(
    get,
    path = "/download/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Record id")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown id or missing file")
    )
)]
pub async fn download_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let download = state.catalog.download(&id)?;

    let content_type = HeaderValue::from_str(&download.record.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let response = Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&download.record.name),
        )
        .header(header::CONTENT_LENGTH, download.content.len())
        .body(Body::from(download.content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })?;

    Ok(response)
}

/// GET /delete/:id - Delete a file and return to the book list.
#[utoipa::path(
    get,
    path = "/delete/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Record id")
    ),
    responses(
        (status = 303, description = "Deleted; redirects to /books"),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Redirect, ApiError> {
    state.catalog.delete(&id)?;
    Ok(Redirect::to("/books"))
}

/// GET /metadata - Raw metadata file.
#[utoipa::path(
    get,
    path = "/metadata",
    tag = "books",
    responses(
        (status = 200, description = "The metadata JSON file as stored", content_type = "application/json")
    )
)]
pub async fn raw_metadata(State(state): State<Arc<AppState>>) -> Result<Response<Body>, ApiError> {
    let json = state.catalog.metadata_json()?;

    Response::builder()
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}
