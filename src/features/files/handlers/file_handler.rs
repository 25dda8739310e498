use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppQuery;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{
    RawUploadQuery, UploadFileDto, UploadResponseDto, UserFileResponseDto,
};
use crate::features::files::range::{resolve_range, ByteRange};
use crate::features::files::services::{FileService, IncomingUpload};
use crate::shared::types::{ApiResponse, Meta};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Map a body-reading failure, keeping the size limit distinct
fn body_error(status: StatusCode, detail: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File too large".to_string())
    } else {
        AppError::BadRequest(detail)
    }
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

async fn read_multipart(request: Request, user_id: Option<i64>) -> Result<IncomingUpload> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| body_error(e.status(), e.body_text()))?;

    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut tool_usage_id: Option<i64> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        body_error(e.status(), format!("Failed to read multipart data: {}", e.body_text()))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let mime_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
                let original_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    body_error(e.status(), format!("Failed to read file data: {}", e.body_text()))
                })?;

                file = Some((original_name, mime_type, data.to_vec()));
            }
            "toolUsageId" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read toolUsageId field: {}", e))
                })?;
                let text = text.trim();
                if !text.is_empty() {
                    tool_usage_id = Some(text.parse::<i64>().map_err(|_| {
                        AppError::BadRequest("toolUsageId must be an integer".to_string())
                    })?);
                }
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let (original_name, mime_type, data) =
        file.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;

    Ok(IncomingUpload {
        data,
        original_name,
        mime_type,
        user_id,
        tool_usage_id,
    })
}

async fn read_raw(
    request: Request,
    query: RawUploadQuery,
    user_id: Option<i64>,
    received_at: DateTime<Utc>,
) -> Result<IncomingUpload> {
    let mime_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string();

    let data = Bytes::from_request(request, &())
        .await
        .map_err(|e| body_error(e.status(), e.body_text()))?;

    if data.is_empty() {
        return Err(AppError::BadRequest("No file data received".to_string()));
    }

    let original_name = query
        .filename
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| format!("upload_{}.bin", received_at.timestamp_millis()));

    Ok(IncomingUpload {
        data: data.to_vec(),
        original_name,
        mime_type,
        user_id,
        tool_usage_id: query.tool_usage_id,
    })
}

/// Upload a file
///
/// Accepts either multipart/form-data with:
/// - `file`: The file to upload (required)
/// - `toolUsageId`: Tool usage the file belongs to (optional)
///
/// or a raw body with the file's MIME type as `Content-Type` and the name in
/// `?filename=`.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "files",
    params(RawUploadQuery),
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "File upload form; a raw body with ?filename= is also accepted",
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = UploadResponseDto),
        (status = 400, description = "Invalid file or validation error"),
        (status = 401, description = "Invalid bearer token"),
        (status = 413, description = "File too large")
    )
)]
pub async fn upload_file(
    user: Option<AuthenticatedUser>,
    State(service): State<Arc<FileService>>,
    AppQuery(query): AppQuery<RawUploadQuery>,
    request: Request,
) -> Result<(StatusCode, Json<UploadResponseDto>)> {
    let user_id = user.map(|u| u.user_id);

    let upload = if is_multipart(request.headers()) {
        read_multipart(request, user_id).await?
    } else {
        read_raw(request, query, user_id, service.now()).await?
    };

    let response = service.upload(upload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Content-Disposition safe rendering of an original file name
fn disposition_name(original_name: &str, fallback: &str) -> String {
    let cleaned: String = original_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    if cleaned.trim().is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// Download a stored file
///
/// Supports a single `Range: bytes=` range.
#[utoipa::path(
    get,
    path = "/api/download/{filename}",
    tag = "files",
    params(
        ("filename" = String, Path, description = "Stored file name from the upload response")
    ),
    responses(
        (status = 200, description = "File contents"),
        (status = 206, description = "Requested byte range"),
        (status = 404, description = "File not found or expired"),
        (status = 416, description = "Range not satisfiable")
    )
)]
pub async fn download_file(
    State(service): State<Arc<FileService>>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    let (file, data) = service.download(&filename).await?;
    let len = data.len() as u64;

    let range = resolve_range(
        headers.get(header::RANGE).and_then(|v| v.to_str().ok()),
        len,
    );

    let builder = Response::builder()
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, service.cache_control());

    let response = match range {
        ByteRange::Full => builder
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, file.mime_type.as_str())
            .header(header::CONTENT_LENGTH, len)
            .header(
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"{}\"",
                    disposition_name(&file.original_name, &file.stored_name)
                ),
            )
            .body(Body::from(data)),
        ByteRange::Partial { start, end } => {
            let chunk = data[start as usize..=end as usize].to_vec();
            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, file.mime_type.as_str())
                .header(header::CONTENT_LENGTH, chunk.len())
                .header(
                    header::CONTENT_RANGE,
                    range.content_range(len).unwrap_or_default(),
                )
                .body(Body::from(chunk))
        }
        ByteRange::Unsatisfiable => builder
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(
                header::CONTENT_RANGE,
                range.content_range(len).unwrap_or_default(),
            )
            .body(Body::empty()),
    };

    response.map_err(|e| AppError::Internal(format!("Failed to build download response: {}", e)))
}

/// List the caller's files, newest first
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    responses(
        (status = 200, description = "Caller's files", body = ApiResponse<Vec<UserFileResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
) -> Result<Json<ApiResponse<Vec<UserFileResponseDto>>>> {
    let files = service.list_for_user(user.user_id).await;
    let total = files.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(files),
        None,
        Some(Meta { total }),
    )))
}
