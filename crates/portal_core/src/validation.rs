//! Local input policy. Every check here runs before a request is built, so a
//! rejection never reaches the network.

use std::{path::Path, sync::LazyLock};

use regex::Regex;

use crate::error::{PortalError, PortalResult};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;
pub const ALLOWED_IMAGE_TYPES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/gif",
    "image/webp",
];

const FILE_TOO_LARGE: &str = "File size too large. Please upload an image smaller than 5MB.";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

/// A file picked for upload, already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads a picked file, refusing anything larger than `max_bytes` before
    /// its content is loaded.
    pub async fn from_path(path: &Path, max_bytes: u64) -> PortalResult<Self> {
        let unreadable = |err: std::io::Error| {
            PortalError::validation(format!("Could not read {}: {err}", path.display()))
        };
        let len = tokio::fs::metadata(path).await.map_err(unreadable)?.len();
        if len > max_bytes {
            return Err(PortalError::validation(FILE_TOO_LARGE));
        }
        let bytes = tokio::fs::read(path).await.map_err(unreadable)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self::new(file_name, mime_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

pub fn validate_image(file: &UploadFile, max_bytes: u64) -> PortalResult<()> {
    let mime = file.mime_type.trim().to_ascii_lowercase();
    if !ALLOWED_IMAGE_TYPES.contains(&mime.as_str()) {
        return Err(PortalError::validation(
            "Invalid file type. Please upload a PNG, JPG, JPEG, GIF, or WEBP image.",
        ));
    }
    if file.size() > max_bytes {
        return Err(PortalError::validation(FILE_TOO_LARGE));
    }
    Ok(())
}

pub fn validate_password_change(current: &str, new: &str, confirm: &str) -> PortalResult<()> {
    if current.is_empty() || new.is_empty() || confirm.is_empty() {
        return Err(PortalError::validation("All fields are required"));
    }
    if new != confirm {
        return Err(PortalError::validation("New passwords do not match"));
    }
    ensure_password_length(new)
}

pub fn validate_signup(fullname: &str, email: &str, password: &str, confirm: &str) -> PortalResult<()> {
    if fullname.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(PortalError::validation("All fields are required"));
    }
    ensure_password_length(password)?;
    if password != confirm {
        return Err(PortalError::validation("Passwords do not match"));
    }
    Ok(())
}

fn ensure_password_length(password: &str) -> PortalResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PortalError::validation(
            "Password must be at least 6 characters long",
        ));
    }
    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn require_filled(value: &str, message: &str) -> PortalResult<()> {
    if value.trim().is_empty() {
        return Err(PortalError::validation(message));
    }
    Ok(())
}
