//! Cloudinary image store client
//!
//! Unsigned upload of raw image bytes into a fixed folder. Fire-and-forget
//! from the pipeline's perspective; the receipt is logged, not returned to
//! the caller.

use serde::Deserialize;
use std::time::Duration;

use crate::config::UploadConfig;
use crate::types::{BackendError, ImagePayload, ImageStore, UploadReceipt};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Cloudinary upload client
pub struct CloudinaryClient {
    http_client: reqwest::Client,
    upload_url: String,
    upload_preset: String,
    folder: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

impl CloudinaryClient {
    pub fn new(config: &UploadConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            upload_url: format!(
                "https://api.cloudinary.com/v1_1/{}/image/upload",
                config.cloud_name
            ),
            upload_preset: config.upload_preset.clone(),
            folder: config.folder.clone(),
        })
    }
}

#[async_trait::async_trait]
impl ImageStore for CloudinaryClient {
    async fn upload(&self, image: &ImagePayload) -> Result<UploadReceipt, BackendError> {
        if image.is_empty() {
            return Err(BackendError::Empty("image file is empty".to_string()));
        }

        let part = reqwest::multipart::Part::bytes(image.as_bytes().to_vec())
            .file_name("upload.jpeg");
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", self.folder.clone());

        tracing::debug!(image_bytes = image.len(), "Uploading image to store");

        let response = self
            .http_client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendError::Api(status.as_u16(), error_text));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        tracing::info!(
            url = %uploaded.secure_url,
            public_id = %uploaded.public_id,
            "Image uploaded successfully"
        );

        Ok(UploadReceipt {
            secure_url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> UploadConfig {
        UploadConfig {
            cloud_name: "demo".to_string(),
            upload_preset: "unsigned".to_string(),
            folder: "plateful".to_string(),
        }
    }

    #[test]
    fn client_builds_upload_url_from_cloud_name() {
        let client = CloudinaryClient::new(&config()).unwrap();
        assert_eq!(
            client.upload_url,
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }

    #[tokio::test]
    async fn empty_payload_fails_before_sending() {
        let client = CloudinaryClient::new(&config()).unwrap();
        let result = client.upload(&ImagePayload::new(vec![])).await;
        assert!(matches!(result, Err(BackendError::Empty(_))));
    }
}
