/// HTTP implementation of the object-storage adapter
///
/// Objects are written under `{folder}/{uuid}_{filename}` with an
/// upsert-enabled PUT, and the public URL is derived from the configured
/// base URL by string convention:
///
/// ```text
/// PUT    {base_url}/storage/v1/object/{bucket}/{path}?upsert=true
/// DELETE {base_url}/storage/v1/object/{bucket}/{path}
/// public {base_url}/storage/v1/object/public/{bucket}/{path}
/// ```

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::{error, warn};
use uuid::Uuid;

use super::{ImageUpload, ObjectStore, StorageError};

/// Object-store connection settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Store base URL without a trailing slash
    pub base_url: String,

    /// Service credential sent as a bearer token
    pub api_key: String,

    /// Bucket name
    pub bucket: String,

    /// Folder prefix inside the bucket for profile images
    pub folder: String,
}

/// Object-store REST client
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    config: StorageConfig,
    client: reqwest::Client,
}

impl HttpObjectStore {
    /// Creates a client for the configured bucket and folder
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.base_url, self.config.bucket, path
        )
    }

    /// Prefix every public URL served from the configured bucket starts with
    fn public_prefix(&self) -> String {
        format!(
            "{}/storage/v1/object/public/{}/",
            self.config.base_url, self.config.bucket
        )
    }

    /// Public URL for an object path
    pub fn public_url(&self, path: &str) -> String {
        format!("{}{}", self.public_prefix(), path)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn upload(&self, image: ImageUpload) -> Result<String, StorageError> {
        let object_name = format!("{}_{}", Uuid::new_v4(), image.filename);
        let path = format!("{}/{}", self.config.folder, object_name);

        let response = self
            .client
            .put(format!("{}?upsert=true", self.object_url(&path)))
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .header(CONTENT_TYPE, image.content_type)
            .body(image.bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StorageError::Upload {
                status: status.as_u16(),
                message,
            });
        }

        Ok(self.public_url(&path))
    }

    async fn delete(&self, public_url: &str) -> bool {
        if public_url.trim().is_empty() {
            return false;
        }

        let prefix = self.public_prefix();
        let Some(path) = public_url.strip_prefix(&prefix) else {
            warn!(url = %public_url, "URL does not belong to the configured bucket, skipping delete");
            return false;
        };

        let result = self
            .client
            .delete(self.object_url(path))
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => true,
            Err(e) => {
                error!(url = %public_url, "Failed to delete stored image: {}", e);
                false
            }
        }
    }
}
