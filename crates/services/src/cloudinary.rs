//! Unsigned image uploads to Cloudinary.
//!
//! The local image reference is a filesystem path, optionally written as a `file://` URI.
//! Content is sniffed before anything is sent: only images under the size limit leave the
//! device.

use crate::error::transport_error;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use sentinel_core::collaborators::ImageHost;
use sentinel_core::{CollaboratorError, CollaboratorResult};
use serde::Deserialize;
use std::path::Path;

pub const INVALID_IMAGE_CODE: &str = "invalid-image";
pub const TOO_LARGE_CODE: &str = "too-large";
pub const UPLOAD_FAILED_CODE: &str = "upload-failed";

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

pub struct CloudinaryHost {
    client: Client,
    base_url: String,
    cloud_name: String,
    upload_preset: String,
    max_bytes: u64,
}

/// An image that passed the local checks.
#[derive(Debug)]
pub struct CheckedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub file_name: String,
}

/// Reads and checks a local image.
pub async fn read_image(local_ref: &str, max_bytes: u64) -> CollaboratorResult<CheckedImage> {
    let path = Path::new(local_ref.strip_prefix("file://").unwrap_or(local_ref));
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        CollaboratorError::with_code(
            INVALID_IMAGE_CODE,
            format!("Could not read image {}: {}", path.display(), e),
        )
    })?;

    if bytes.len() as u64 > max_bytes {
        return Err(CollaboratorError::with_code(
            TOO_LARGE_CODE,
            format!("Image is larger than {} bytes", max_bytes),
        ));
    }

    let kind = infer::get(&bytes)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .ok_or_else(|| CollaboratorError::with_code(INVALID_IMAGE_CODE, "File is not an image"))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("upload.{}", kind.extension()));

    Ok(CheckedImage {
        bytes,
        mime_type: kind.mime_type(),
        file_name,
    })
}

impl CloudinaryHost {
    pub fn new(
        client: Client,
        base_url: &str,
        cloud_name: &str,
        upload_preset: &str,
        max_bytes: u64,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cloud_name: cloud_name.to_string(),
            upload_preset: upload_preset.to_string(),
            max_bytes,
        }
    }
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, local_image_ref: &str) -> CollaboratorResult<String> {
        let image = read_image(local_image_ref, self.max_bytes).await?;
        let size = image.bytes.len();

        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(image.mime_type)
            .map_err(transport_error)?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone());

        let url = format!("{}/v1_1/{}/image/upload", self.base_url, self.cloud_name);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "image upload rejected: {}", body);
            let code = if status.as_u16() == 503 {
                "unavailable"
            } else {
                UPLOAD_FAILED_CODE
            };
            return Err(CollaboratorError::with_code(code, "Failed to upload image"));
        }

        let uploaded: UploadResponse = response.json().await.map_err(transport_error)?;
        tracing::debug!(bytes = size, url = %uploaded.secure_url, "uploaded image");
        Ok(uploaded.secure_url)
    }
}
