//! Satellite Image Loading
//!
//! Reads an image from disk and prepares it as an inline model payload.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;

use crate::utils::error::{AppError, AppResult};

/// An image ready to be attached to a structured request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub base64_data: String,
    pub byte_len: usize,
}

/// Detect the image format from content, falling back to the file extension.
pub fn detect_format(bytes: &[u8], path: &Path) -> Option<ImageFormat> {
    image::guess_format(bytes)
        .ok()
        .or_else(|| ImageFormat::from_path(path).ok())
}

pub fn encode_image(bytes: &[u8], path: &Path) -> AppResult<EncodedImage> {
    if bytes.is_empty() {
        return Err(AppError::validation(format!(
            "{} is empty",
            path.display()
        )));
    }
    let format = detect_format(bytes, path).ok_or_else(|| {
        AppError::validation(format!("{} is not a recognized image", path.display()))
    })?;

    Ok(EncodedImage {
        mime_type: format.to_mime_type().to_string(),
        base64_data: STANDARD.encode(bytes),
        byte_len: bytes.len(),
    })
}

pub async fn load_image(path: &Path) -> AppResult<EncodedImage> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::not_found(path.display().to_string()),
        _ => AppError::Io(e),
    })?;
    let encoded = encode_image(&bytes, path)?;
    tracing::debug!(
        path = %path.display(),
        mime = %encoded.mime_type,
        bytes = encoded.byte_len,
        "loaded satellite image"
    );
    Ok(encoded)
}
