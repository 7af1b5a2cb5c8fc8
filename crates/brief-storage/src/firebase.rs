use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::{ObjectStore, StorageConfig, StorageError, StoredObject};

#[derive(Debug, Deserialize)]
struct ObjectMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "downloadTokens")]
    download_tokens: Option<String>,
}

#[derive(Debug, Clone)]
/// Firebase Storage REST client.
pub struct FirebaseStorageClient {
    client: reqwest::Client,
    config: StorageConfig,
}

impl FirebaseStorageClient {
    pub fn new(config: StorageConfig, request_timeout_ms: u64) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()?;
        Ok(Self { client, config })
    }

    fn bucket_url(&self) -> String {
        format!(
            "{}/b/{}/o",
            self.config.api_base.trim_end_matches('/'),
            self.config.bucket
        )
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.bucket_url(), urlencoding::encode(key))
    }

    async fn read_metadata(
        &self,
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<ObjectMetadata, StorageError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StorageError::Status {
                operation,
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body)
            .map_err(|error| StorageError::InvalidMetadata(format!("{operation}: {error}")))
    }
}

#[async_trait]
impl ObjectStore for FirebaseStorageClient {
    async fn upload(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        tracing::debug!(
            project = self.config.project_id.as_str(),
            bucket = self.config.bucket.as_str(),
            key,
            bytes = bytes.len(),
            "uploading object"
        );
        let response = self
            .client
            .post(self.bucket_url())
            .query(&[
                ("uploadType", "media"),
                ("name", key),
                ("key", self.config.api_key.as_str()),
            ])
            .header(CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await?;
        let uploaded = self.read_metadata("upload", response).await?;
        if let Some(stored_name) = uploaded.name.as_deref().filter(|name| *name != key) {
            return Err(StorageError::InvalidMetadata(format!(
                "upload stored `{stored_name}` instead of `{key}`"
            )));
        }

        // Read the object back to obtain its download token.
        let response = self
            .client
            .get(self.object_url(key))
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await?;
        let metadata = self.read_metadata("metadata lookup", response).await?;
        let token = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                StorageError::InvalidMetadata(format!("object `{key}` has no download token"))
            })?;

        Ok(StoredObject {
            key: key.to_string(),
            url: format!(
                "{}?alt=media&token={}",
                self.object_url(key),
                urlencoding::encode(token)
            ),
        })
    }
}
