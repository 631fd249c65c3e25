//! Cloudinary image storage.
//!
//! Uploads use the signed upload API: every parameter except the file, the
//! API key and the signature itself is signed with the account's API secret.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use uuid::Uuid;

use roster_core::{Error, ImageUploader, Result, UploadedFile};

const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com";

/// Credentials and storage options for Cloudinary.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    /// Cloud name, part of the upload URL.
    pub cloud_name: String,
    /// API key.
    pub api_key: String,
    /// API secret used for signing. Never sent over the wire.
    pub api_secret: String,
    /// Folder uploads are stored under.
    pub folder: String,
    /// Image format every upload is converted to.
    pub format: String,
}

impl CloudinaryConfig {
    /// Creates a config storing PNGs under `accounts/`.
    #[must_use]
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            folder: "accounts".to_string(),
            format: "png".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

/// [`ImageUploader`] backed by Cloudinary.
pub struct CloudinaryUploader {
    client: reqwest::Client,
    config: CloudinaryConfig,
    base_url: String,
}

impl CloudinaryUploader {
    /// Creates an uploader for the given account.
    #[must_use]
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Points the uploader at a different API host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.base_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }
}

/// Joins parameters as `k=v&k=v`, sorted by name.
fn string_to_sign(params: &[(&str, &str)]) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Hex SHA-1 of the sorted parameters followed by the secret.
fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageUploader for CloudinaryUploader {
    async fn upload(&self, file: UploadedFile) -> Result<String> {
        let public_id = Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[
                ("folder", self.config.folder.as_str()),
                ("format", self.config.format.as_str()),
                ("public_id", public_id.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.config.api_secret,
        );

        let mut part = Part::bytes(file.bytes).file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| Error::upload(format!("invalid content type {content_type}: {e}")))?;
        }

        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("folder", self.config.folder.clone())
            .text("format", self.config.format.clone())
            .text("public_id", public_id.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .part("file", part);

        tracing::debug!(file = %file.file_name, public_id = %public_id, "Uploading image");

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upload(format!("provider returned {status}: {body}")));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| Error::upload(format!("unreadable provider response: {e}")))?;

        let url = body
            .secure_url
            .or(body.url)
            .ok_or_else(|| Error::upload("provider response has no URL"))?;

        tracing::info!(public_id = %public_id, url = %url, "Image uploaded");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::{Multipart, Path};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};

    use super::*;

    #[test]
    fn test_string_to_sign_sorts_by_name() {
        let params = [("timestamp", "1700000000"), ("folder", "accounts"), ("public_id", "x")];
        assert_eq!(string_to_sign(&params), "folder=accounts&public_id=x&timestamp=1700000000");
    }

    #[test]
    fn test_sign_appends_secret() {
        let params = [("timestamp", "1"), ("folder", "accounts")];
        let expected = hex::encode(Sha1::digest(b"folder=accounts&timestamp=1secret"));

        let signature = sign(&params, "secret");
        assert_eq!(signature, expected);
        assert_eq!(signature.len(), 40);
        assert_ne!(signature, sign(&params, "other"));
    }

    #[test]
    fn test_upload_url() {
        let uploader = CloudinaryUploader::new(CloudinaryConfig::new("demo", "key", "secret"))
            .with_base_url("http://127.0.0.1:9/");
        assert_eq!(uploader.upload_url(), "http://127.0.0.1:9/v1_1/demo/image/upload");
    }

    async fn fake_upload(Path(cloud): Path<String>, mut multipart: Multipart) -> impl IntoResponse {
        let mut fields = HashMap::new();
        let mut file_len = 0;
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                file_len = field.bytes().await.unwrap().len();
            } else {
                fields.insert(name, field.text().await.unwrap());
            }
        }

        let to_sign: Vec<(&str, &str)> = ["folder", "format", "public_id", "timestamp"]
            .iter()
            .map(|k| (*k, fields[*k].as_str()))
            .collect();
        if fields["signature"] != sign(&to_sign, "secret") || fields["api_key"] != "key" {
            return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({"error": {"message": "bad signature"}})));
        }

        (
            StatusCode::OK,
            Json(serde_json::json!({
                "secure_url": format!(
                    "https://cdn.test/{cloud}/{}/{}.{}?bytes={file_len}",
                    fields["folder"], fields["public_id"], fields["format"]
                ),
            })),
        )
    }

    async fn spawn_fake_provider() -> String {
        let app = Router::new().route("/v1_1/{cloud}/image/upload", post(fake_upload));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn file() -> UploadedFile {
        UploadedFile {
            file_name: "me.jpg".to_string(),
            content_type: Some("image/jpeg".to_string()),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
        }
    }

    #[tokio::test]
    async fn test_upload_returns_secure_url() {
        let base = spawn_fake_provider().await;
        let uploader = CloudinaryUploader::new(CloudinaryConfig::new("demo", "key", "secret"))
            .with_base_url(base);

        let url = uploader.upload(file()).await.unwrap();
        assert!(url.starts_with("https://cdn.test/demo/accounts/"));
        assert!(url.ends_with(".png?bytes=4"));
    }

    #[tokio::test]
    async fn test_upload_rejected_by_provider() {
        let base = spawn_fake_provider().await;
        let uploader = CloudinaryUploader::new(CloudinaryConfig::new("demo", "key", "wrong"))
            .with_base_url(base);

        let err = uploader.upload(file()).await.unwrap_err();
        match err {
            Error::Upload { message } => assert!(message.contains("401")),
            other => panic!("expected upload error, got {other:?}"),
        }
    }
}
