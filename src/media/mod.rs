//! Photo attachments: turns uploaded bytes into a retrievable URL.

pub mod cloudinary;
pub mod memory;

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;

pub use cloudinary::CloudinaryMediaStore;
pub use memory::MemoryMediaStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("Unsupported image format `{0}` (allowed: jpg, jpeg, png)")]
    UnsupportedFormat(String),

    #[error("Media storage failed: {0}")]
    Backend(String),
}

/// A file received in the `image` form field
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpg,
    Jpeg,
    Png,
}

impl ImageFormat {
    pub const ALLOWED: [ImageFormat; 3] = [ImageFormat::Jpg, ImageFormat::Png, ImageFormat::Jpeg];

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpg | ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }

    /// File extension wins; the declared content type is the fallback.
    pub fn detect(upload: &Upload) -> Result<Self, MediaError> {
        let extension = upload
            .file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("jpg") => return Ok(ImageFormat::Jpg),
            Some("jpeg") => return Ok(ImageFormat::Jpeg),
            Some("png") => return Ok(ImageFormat::Png),
            Some(other) => return Err(MediaError::UnsupportedFormat(other.to_string())),
            None => {}
        }

        match upload.content_type.as_deref() {
            Some("image/jpeg") | Some("image/jpg") => Ok(ImageFormat::Jpeg),
            Some("image/png") => Ok(ImageFormat::Png),
            Some(other) => Err(MediaError::UnsupportedFormat(other.to_string())),
            None => Err(MediaError::UnsupportedFormat("unknown".to_string())),
        }
    }
}

/// External object storage for photos
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist the bytes and return a durable URL.
    async fn store(&self, upload: Upload, format: ImageFormat) -> Result<String, MediaError>;
}

/// Resolve an optional upload to an optional URL.
///
/// No file (or an empty file part) is not an error and never reaches the
/// backend. Backend failures are returned to the caller unchanged.
pub async fn resolve(
    media: &dyn MediaStore,
    upload: Option<Upload>,
) -> Result<Option<String>, MediaError> {
    let upload = match upload {
        Some(upload) if !upload.bytes.is_empty() => upload,
        _ => return Ok(None),
    };

    let format = ImageFormat::detect(&upload)?;
    let url = media.store(upload, format).await?;
    tracing::debug!("Stored {} attachment at {}", format.extension(), url);
    Ok(Some(url))
}
