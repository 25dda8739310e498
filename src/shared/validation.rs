use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for declared MIME types of uploads
    /// Letters, digits, dots, hyphens and slashes only (no parameters)
    /// - Valid: "application/pdf", "image/png", "application/vnd.ms-excel"
    /// - Invalid: "text/html; charset=utf-8", "image/svg+xml", ""
    pub static ref MIME_TYPE_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9.\-/]+$").unwrap();

    /// Regex for stored file names accepted by the download endpoint
    /// Must start alphanumeric and contain only alphanumerics, dots, underscores and hyphens
    /// - Valid: "0193a1b2c3.pdf", "upload_1700000000000.bin"
    /// - Invalid: "../etc/passwd", ".hidden", "a/b.pdf", "a b.pdf"
    pub static ref STORED_NAME_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap();
}
