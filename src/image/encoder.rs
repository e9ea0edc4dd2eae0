//! Turns selected photos into inline base64 payloads.

use crate::error::{EmbraceError, Result};
use crate::image::types::{is_image_mime, EncodedImage, ImageFormat, UploadedImage};
use base64::Engine;
use std::path::Path;

/// Strips a `data:<mime>;base64,` header if present, returning only the payload.
pub fn strip_data_uri_header(input: &str) -> &str {
    if !input.starts_with("data:") {
        return input;
    }
    match input.find(',') {
        Some(pos) => &input[pos + 1..],
        None => input,
    }
}

/// Encodes an uploaded photo as base64 paired with its declared MIME type.
pub fn encode_image(image: &UploadedImage) -> EncodedImage {
    EncodedImage {
        data: base64::engine::general_purpose::STANDARD.encode(&image.data),
        mime_type: image.mime_type.clone(),
    }
}

/// Declares the MIME type of a file from its extension, falling back to its contents.
pub fn declared_mime_type(path: &Path, data: &[u8]) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(ImageFormat::from_extension)
                .or_else(|| ImageFormat::from_magic_bytes(data))
                .map(|f| f.mime_type().to_string())
        })
}

/// Reads a photo from disk.
///
/// The read error, if any, is propagated. Files whose declared type is not
/// an image are rejected with `InvalidRequest`; use [`pick_image`] for the
/// silent picker behavior.
pub async fn read_image(path: impl AsRef<Path>) -> Result<UploadedImage> {
    let path = path.as_ref();
    let data = tokio::fs::read(path).await?;
    let mime_type = declared_mime_type(path, &data)
        .filter(|m| is_image_mime(m))
        .ok_or_else(|| {
            EmbraceError::InvalidRequest(format!("{} is not an image file", path.display()))
        })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(UploadedImage::new(data, mime_type, file_name))
}

/// Picker boundary: returns `None` for files that are not images.
pub async fn pick_image(path: impl AsRef<Path>) -> Result<Option<UploadedImage>> {
    match read_image(path.as_ref()).await {
        Ok(image) => Ok(Some(image)),
        Err(EmbraceError::InvalidRequest(reason)) => {
            tracing::warn!(path = %path.as_ref().display(), "ignoring selection: {reason}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
