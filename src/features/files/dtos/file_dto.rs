use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::modules::memstore::UserFile;

/// Multipart upload form for OpenAPI documentation
/// Note: the handler reads the multipart stream directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// Id of the tool usage this file belongs to
    #[schema(example = 1)]
    pub tool_usage_id: Option<i64>,
}

/// Query parameters for raw-body uploads
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RawUploadQuery {
    /// Original file name; defaults to `upload_{millis}.bin`
    pub filename: Option<String>,
    /// Id of the tool usage this file belongs to
    pub tool_usage_id: Option<i64>,
}

/// Response DTO for a completed upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponseDto {
    pub success: bool,
    pub message: String,
    pub id: i64,
    /// Name the file is stored and downloaded under
    pub filename: String,
    pub original_name: String,
    pub size: i64,
    pub mime_type: String,
    /// Hex-encoded SHA-256 of the stored bytes
    pub checksum: String,
    pub download_url: String,
    pub expires_at: DateTime<Utc>,
}

impl From<UserFile> for UploadResponseDto {
    fn from(file: UserFile) -> Self {
        Self {
            success: true,
            message: "File uploaded successfully".to_string(),
            id: file.id,
            download_url: download_url(&file.stored_name),
            filename: file.stored_name,
            original_name: file.original_name,
            size: file.file_size,
            mime_type: file.mime_type,
            checksum: file.checksum,
            expires_at: file.expires_at,
        }
    }
}

/// Response DTO for a stored file listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserFileResponseDto {
    pub id: i64,
    pub original_name: String,
    pub filename: String,
    pub file_size: i64,
    pub mime_type: String,
    pub tool_usage_id: Option<i64>,
    pub checksum: String,
    pub download_url: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<UserFile> for UserFileResponseDto {
    fn from(file: UserFile) -> Self {
        Self {
            id: file.id,
            original_name: file.original_name,
            download_url: download_url(&file.stored_name),
            filename: file.stored_name,
            file_size: file.file_size,
            mime_type: file.mime_type,
            tool_usage_id: file.tool_usage_id,
            checksum: file.checksum,
            expires_at: file.expires_at,
            created_at: file.created_at,
        }
    }
}

pub fn download_url(stored_name: &str) -> String {
    format!("/api/download/{}", stored_name)
}
