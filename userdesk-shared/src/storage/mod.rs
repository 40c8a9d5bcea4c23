/// External object-storage adapter
///
/// Profile images live in a third-party HTTP blob store addressed by
/// bucket + path, with public URLs derived by string convention. The
/// [`ObjectStore`] trait is the seam the orchestration layer uses;
/// [`http::HttpObjectStore`] is the production implementation.
///
/// Upload failures propagate as [`StorageError`]. Delete failures do NOT:
/// delete returns a plain `bool` and absorbs every error into a log line,
/// so a missing or foreign blob can never fail a user update.

pub mod http;

use async_trait::async_trait;
use bytes::Bytes;

pub use http::{HttpObjectStore, StorageConfig};

/// Error type for object-storage uploads
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The store rejected the write
    #[error("Object store returned {status}: {message}")]
    Upload {
        /// HTTP status returned by the store
        status: u16,
        /// Response body or a short description
        message: String,
    },

    /// The store could not be reached
    #[error("Object store request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A binary blob to upload, as extracted from a multipart file part
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Raw file bytes
    pub bytes: Bytes,

    /// Original filename, kept as part of the object path
    pub filename: String,

    /// Content type forwarded to the store
    pub content_type: String,
}

/// Object-storage operations for profile images
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads a blob and returns its public URL
    async fn upload(&self, image: ImageUpload) -> Result<String, StorageError>;

    /// Deletes a blob by its public URL
    ///
    /// Returns false (without error) for blank URLs, URLs outside the
    /// configured bucket/folder prefix, and any transport failure.
    async fn delete(&self, public_url: &str) -> bool;
}
