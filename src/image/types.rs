//! Core types for embrace generation.

use crate::error::{EmbraceError, Result};
use crate::image::encoder::strip_data_uri_header;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats accepted as input or produced by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
    /// HEIC (iPhone photos).
    Heic,
    /// HEIF container.
    Heif,
    /// GIF (first frame only is meaningful to the model).
    Gif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Heic => "heic",
            Self::Heif => "heif",
            Self::Gif => "gif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Heic => "image/heic",
            Self::Heif => "image/heif",
            Self::Gif => "image/gif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "heic" => Some(Self::Heic),
            "heif" => Some(Self::Heif),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Maps a MIME type back to a format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/heic" => Some(Self::Heic),
            "image/heif" => Some(Self::Heif),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        // ISO BMFF: ....ftyp<brand>
        if &data[4..8] == b"ftyp" {
            return match &data[8..12] {
                b"heic" | b"heix" | b"heim" | b"heis" => Some(Self::Heic),
                b"mif1" | b"msf1" => Some(Self::Heif),
                _ => None,
            };
        }

        None
    }
}

/// Returns true if a declared MIME type is in the image category.
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// A photo selected by the user: raw bytes plus declared MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Raw file contents.
    pub data: Vec<u8>,
    /// Declared MIME type, e.g. `image/jpeg`.
    pub mime_type: String,
    /// Display name of the source file.
    pub file_name: String,
}

impl UploadedImage {
    /// Creates an uploaded image from bytes and a declared MIME type.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl std::fmt::Debug for UploadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedImage")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// An image ready to be sent inline: base64 payload without any data-URI header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Base64 payload.
    pub data: String,
    /// MIME type of the decoded bytes.
    pub mime_type: String,
}

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// The image returned by the model, kept exactly as the service sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "generated image should be saved or displayed"]
pub struct GeneratedImage {
    /// MIME type reported by the service.
    pub mime_type: String,
    /// Base64 payload as returned by the service.
    pub data: String,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GeneratedImage {
    /// Creates a new generated image.
    pub fn new(
        mime_type: impl Into<String>,
        data: impl Into<String>,
        metadata: GenerationMetadata,
    ) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
            metadata,
        }
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decodes the base64 payload into raw bytes, tolerating a data-URI header.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(strip_data_uri_header(self.data.trim()))
            .map_err(|e| EmbraceError::Decode(e.to_string()))
    }

    /// Returns the format matching the reported MIME type, if known.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
    }

    /// Decodes and saves the image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<usize> {
        let bytes = self.decode()?;
        std::fs::write(path, &bytes)?;
        Ok(bytes.len())
    }
}
