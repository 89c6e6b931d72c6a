use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::CloudinaryConfig;
use crate::media::{ImageFormat, MediaError, MediaStore, Upload};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Signed image uploads to Cloudinary
pub struct CloudinaryMediaStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
    folder: String,
    endpoint: String,
}

impl CloudinaryMediaStore {
    pub fn new(config: CloudinaryConfig, folder: impl Into<String>) -> Self {
        let endpoint = format!("{}/{}/image/upload", API_BASE, config.cloud_name);
        Self {
            client: reqwest::Client::new(),
            config,
            folder: folder.into(),
            endpoint,
        }
    }

    fn allowed_formats() -> String {
        ImageFormat::ALLOWED
            .iter()
            .map(ImageFormat::extension)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parameters must be listed in alphabetical order before signing.
    fn signature(&self, params: &[(&str, String)]) -> String {
        let to_sign = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn store(&self, upload: Upload, format: ImageFormat) -> Result<String, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signed = [
            ("allowed_formats", Self::allowed_formats()),
            ("folder", self.folder.clone()),
            ("timestamp", timestamp),
        ];
        let signature = self.signature(&signed);

        let file_name = upload
            .file_name
            .clone()
            .unwrap_or_else(|| format!("upload.{}", format.extension()));
        let part = Part::stream(upload.bytes)
            .file_name(file_name)
            .mime_str(format.mime_type())
            .map_err(|e| MediaError::Backend(e.to_string()))?;

        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in signed {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => format!("upload rejected with status {}", status),
            };
            return Err(MediaError::Backend(message));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Backend(format!("unexpected upload response: {}", e)))?;

        tracing::info!("Uploaded photo to {}", body.secure_url);
        Ok(body.secure_url)
    }
}
