//! Image-host collaborator.
//!
//! Attachments are not stored locally; uploaded images go to the Imgur API
//! and only the resulting public URL is kept. The host is consumed strictly
//! as `upload(bytes) -> url`; every failure collapses into one generic
//! "upload failed" condition for the caller.

use anyhow::{Context, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use util::config;

/// Maximum accepted payload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// The image host only takes images; everything else is rejected up front.
pub const ALLOWED_IMAGE_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/gif", "image/webp"];

static HTTP: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to build HTTP client")
});

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File type not allowed. Only images are accepted.")]
    UnsupportedType,

    #[error("File too large (max 10MB)")]
    TooLarge,

    #[error("Image upload failed")]
    Failed(#[source] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub url: String,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
}

/// Validates and uploads one image, returning its public URL and metadata.
pub async fn upload_image(
    bytes: &[u8],
    filename: &str,
    mime_type: &str,
) -> Result<UploadedImage, UploadError> {
    if !ALLOWED_IMAGE_TYPES.contains(&mime_type) {
        return Err(UploadError::UnsupportedType);
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge);
    }

    let url = push_to_host(bytes, filename)
        .await
        .map_err(UploadError::Failed)?;

    Ok(UploadedImage {
        url,
        filename: filename.to_string(),
        mime_type: mime_type.to_string(),
        size: bytes.len() as i64,
    })
}

async fn push_to_host(bytes: &[u8], filename: &str) -> anyhow::Result<String> {
    let payload = serde_json::json!({
        "image": BASE64.encode(bytes),
        "type": "base64",
        "name": filename,
    });

    let response = HTTP
        .post("https://api.imgur.com/3/image")
        .header(
            "Authorization",
            format!("Client-ID {}", config::imgur_client_id()),
        )
        .json(&payload)
        .send()
        .await
        .context("Image host unreachable")?;

    if !response.status().is_success() {
        return Err(anyhow!("Image host rejected upload: {}", response.status()));
    }

    let body: serde_json::Value = response.json().await.context("Malformed host response")?;
    body.get("data")
        .and_then(|d| d.get("link"))
        .and_then(|l| l.as_str())
        .map(str::to_owned)
        .ok_or_else(|| anyhow!("Host response missing image link"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_images_are_rejected_before_any_network_call() {
        let err = upload_image(b"%PDF-1.4", "report.pdf", "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType));
    }

    #[tokio::test]
    async fn oversized_payloads_are_rejected() {
        let blob = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let err = upload_image(&blob, "big.png", "image/png").await.unwrap_err();
        assert!(matches!(err, UploadError::TooLarge));
    }
}
