//! Checks applied to every upload before it is written to disk.

use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::shared::validation::MIME_TYPE_REGEX;

/// MIME types accepted for processing
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "video/mp4",
    "video/webm",
    "video/quicktime",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    "text/csv",
];

/// Executable or script suffixes that are never accepted
pub const DENIED_EXTENSIONS: &[&str] = &[
    ".exe", ".bat", ".cmd", ".com", ".pif", ".scr", ".vbs", ".js",
];

/// Extensions expected for each allowed MIME type; the first is canonical
const MIME_EXTENSIONS: &[(&str, &[&str])] = &[
    ("application/pdf", &["pdf"]),
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/png", &["png"]),
    ("image/gif", &["gif"]),
    ("image/webp", &["webp"]),
    ("audio/mpeg", &["mp3"]),
    ("audio/wav", &["wav"]),
    ("audio/ogg", &["ogg", "oga"]),
    ("video/mp4", &["mp4"]),
    ("video/webm", &["webm"]),
    ("video/quicktime", &["mov", "qt"]),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        &["docx"],
    ),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        &["xlsx"],
    ),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        &["pptx"],
    ),
    ("text/plain", &["txt"]),
    ("text/csv", &["csv"]),
];

/// Declared metadata of an upload
#[derive(Debug, Clone, Validate)]
pub struct FileMetadata {
    #[validate(length(min = 1, max = 255, message = "File name must be 1-255 characters"))]
    pub original_name: String,

    #[validate(regex(path = *MIME_TYPE_REGEX, message = "Invalid MIME type format"))]
    pub mime_type: String,

    /// Schema ceiling of 50MB, independent of the configured limit
    #[validate(range(max = 52428800, message = "File exceeds the 50MB upload limit"))]
    pub size: u64,
}

pub fn is_mime_type_allowed(mime_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime_type)
}

pub fn has_denied_extension(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    DENIED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Lowercased extension of a file name, without the dot
pub fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

fn expected_extensions(mime_type: &str) -> Option<&'static [&'static str]> {
    MIME_EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == mime_type)
        .map(|(_, exts)| *exts)
}

fn is_known_extension(ext: &str) -> bool {
    MIME_EXTENSIONS
        .iter()
        .any(|(_, exts)| exts.contains(&ext))
}

/// Extension to store an upload under: the canonical one for its MIME type
pub fn storage_extension(mime_type: &str) -> &'static str {
    expected_extensions(mime_type)
        .and_then(|exts| exts.first().copied())
        .unwrap_or("bin")
}

impl FileMetadata {
    /// Run every upload check. `max_size` is the configured limit; exceeding it
    /// is reported as 413, every other violation as 400.
    pub fn check(&self, max_size: u64) -> Result<()> {
        if has_denied_extension(&self.original_name) {
            return Err(AppError::Validation(
                "Executable files are not allowed".to_string(),
            ));
        }

        self.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if !is_mime_type_allowed(&self.mime_type) {
            return Err(AppError::Validation(format!(
                "File type '{}' is not supported for processing",
                self.mime_type
            )));
        }

        if let (Some(ext), Some(expected)) = (
            extension_of(&self.original_name),
            expected_extensions(&self.mime_type),
        ) {
            if is_known_extension(&ext) && !expected.contains(&ext.as_str()) {
                return Err(AppError::Validation(format!(
                    "Invalid file type: {}. MIME: {}, Extension: .{}",
                    self.original_name, self.mime_type, ext
                )));
            }
        }

        if self.size > max_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File too large. Maximum size is {} bytes",
                max_size
            )));
        }

        Ok(())
    }
}
