//! Uploaded image types.

use crate::error::{Result, VibeError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raster formats accepted for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format.
    Png,
    /// JPEG format.
    #[default]
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Every accepted format, in display order.
    pub const ALL: [ImageFormat; 3] = [Self::Jpeg, Self::Png, Self::WebP];

    /// Returns the canonical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type declared to the service for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Parses a declared MIME type, ignoring parameters.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }

    /// Comma-separated MIME list for an HTML `accept` attribute.
    pub fn accept_list() -> String {
        Self::ALL
            .iter()
            .map(|f| f.mime_type())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// An image supplied by the user, held only for the duration of one call.
///
/// The bytes themselves are not validated: the service decides whether they
/// decode. Only the declared media type is resolved locally.
#[derive(Clone)]
pub struct ImageUpload {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Declared format.
    pub format: ImageFormat,
}

impl ImageUpload {
    /// Creates an upload with an explicitly declared format.
    pub fn new(data: Vec<u8>, format: ImageFormat) -> Self {
        Self { data, format }
    }

    /// Creates an upload, declaring the format from the content.
    ///
    /// Falls back to `hint` (an extension or MIME type) when the bytes carry
    /// no recognizable signature.
    pub fn from_bytes(data: Vec<u8>, hint: Option<&str>) -> Result<Self> {
        let format = ImageFormat::from_magic_bytes(&data)
            .or_else(|| {
                hint.and_then(|h| {
                    ImageFormat::from_mime_type(h).or_else(|| ImageFormat::from_extension(h))
                })
            })
            .ok_or_else(|| {
                VibeError::InvalidRequest(format!(
                    "unsupported image type (accepted: {})",
                    ImageFormat::accept_list()
                ))
            })?;
        Ok(Self::new(data, format))
    }

    /// Reads an image from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let ext = path.extension().and_then(|e| e.to_str());
        Self::from_bytes(data, ext)
    }

    /// Returns the declared MIME type.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns true if no bytes were uploaded.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("format", &self.format)
            .field("size", &self.data.len())
            .finish()
    }
}
