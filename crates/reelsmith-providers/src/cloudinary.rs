//! Cloudinary signed upload publisher.
//!
//! # Design
//! - Uploads are signed server-side: the signature is the hex digest of the sorted
//!   `key=value` pairs joined by `&`, immediately followed by the API secret.
//! - The staged file is streamed into the multipart body instead of being buffered.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reelsmith_config::{CloudinaryConfig, Secret, SignatureAlgorithm};
use reelsmith_core::{PublishError, PublishedAsset, StoragePublisher, UploadOptions};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::http::{error_message, snippet};

/// [`StoragePublisher`] backed by the Cloudinary upload API.
#[derive(Clone)]
pub struct CloudinaryPublisher {
    client: Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: Secret,
    algorithm: SignatureAlgorithm,
}

impl CloudinaryPublisher {
    /// Build a publisher from account settings.
    #[must_use]
    pub fn new(client: Client, config: &CloudinaryConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            algorithm: config.signature_algorithm,
        }
    }

    fn upload_url(&self, resource_type: &str) -> String {
        format!(
            "{}/v1_1/{}/{resource_type}/upload",
            self.base_url, self.cloud_name
        )
    }

    async fn upload_at(
        &self,
        path: &Path,
        options: &UploadOptions,
        timestamp: u64,
    ) -> Result<PublishedAsset, PublishError> {
        let io_error = |source| PublishError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = tokio::fs::File::open(path).await.map_err(io_error)?;
        let length = file.metadata().await.map_err(io_error)?.len();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();

        let timestamp = timestamp.to_string();
        let signature = sign_params(
            &[("folder", options.folder.as_str()), ("timestamp", timestamp.as_str())],
            self.api_secret.expose(),
            self.algorithm,
        );

        let part = Part::stream_with_length(reqwest::Body::from(file), length).file_name(file_name);
        let mut form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .part("file", part);
        if !options.folder.is_empty() {
            form = form.text("folder", options.folder.clone());
        }
        if self.algorithm == SignatureAlgorithm::Sha256 {
            form = form.text("signature_algorithm", "sha256");
        }

        let url = self.upload_url(&options.resource_type);
        debug!(%url, bytes = length, "uploading staged file");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| PublishError::Transport {
                source: Box::new(err),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|err| PublishError::Transport {
            source: Box::new(err),
        })?;
        if !status.is_success() {
            return Err(PublishError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let body: UploadResponse =
            serde_json::from_str(&text).map_err(|err| PublishError::Malformed {
                detail: format!("{err}; body: {}", snippet(&text)),
            })?;
        let secure_url = body
            .secure_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| PublishError::Malformed {
                detail: "response did not include secure_url".to_string(),
            })?;
        info!(url = %secure_url, "asset uploaded");
        Ok(PublishedAsset {
            secure_url,
            public_id: body.public_id,
        })
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    secure_url: Option<String>,
    #[serde(default)]
    public_id: Option<String>,
}

#[async_trait]
impl StoragePublisher for CloudinaryPublisher {
    async fn upload(
        &self,
        path: &Path,
        options: &UploadOptions,
    ) -> Result<PublishedAsset, PublishError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        self.upload_at(path, options, timestamp).await
    }
}

/// Sign upload parameters the way Cloudinary verifies them.
///
/// Pairs are sorted by key and joined as `k=v&k=v`; the secret is appended
/// and the digest is returned as lowercase hex.
#[must_use]
pub fn sign_params(params: &[(&str, &str)], secret: &str, algorithm: SignatureAlgorithm) -> String {
    let mut sorted: Vec<_> = params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .collect();
    sorted.sort_by(|left, right| left.0.cmp(right.0));
    let mut payload = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    payload.push_str(secret);

    match algorithm {
        SignatureAlgorithm::Sha1 => to_hex(&Sha1::digest(payload.as_bytes())),
        SignatureAlgorithm::Sha256 => to_hex(&Sha256::digest(payload.as_bytes())),
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_signature_matches_published_example() {
        let signature = sign_params(
            &[
                ("timestamp", "1315060510"),
                ("public_id", "sample_image"),
                ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop"),
            ],
            "abcd",
            SignatureAlgorithm::Sha1,
        );
        assert_eq!(signature, "bfd09f95f331f558cbd1320e67aa8d488770583e");
    }

    #[test]
    fn upload_signature_covers_folder_and_timestamp() {
        let params = [("timestamp", "1700000000"), ("folder", "veo2_generated_videos")];
        assert_eq!(
            sign_params(&params, "secret", SignatureAlgorithm::Sha1),
            "23ca0ad0f2c362ba1deacab63821c44961904536"
        );
        assert_eq!(
            sign_params(&params, "secret", SignatureAlgorithm::Sha256),
            "6fb11bbeabbb045463d259676d9ed2585dcbfa697ceec7b9f8043e47ecf07281"
        );
    }

    #[test]
    fn empty_values_are_not_signed() {
        let with_empty = sign_params(
            &[("folder", ""), ("timestamp", "1")],
            "s",
            SignatureAlgorithm::Sha1,
        );
        let without = sign_params(&[("timestamp", "1")], "s", SignatureAlgorithm::Sha1);
        assert_eq!(with_empty, without);
    }
}
