//! Where generated pages and uploaded images are kept.
//!
//! Every backend speaks the same `PageStore` interface, addressed by a relative path such as
//! `clients/<id>.html` or `uploads/<uuid>.png`.

mod github;
mod local;
mod mirrored;

use async_trait::async_trait;
use thiserror::Error;

pub use github::GitHubStore;
pub use local::LocalDiskStore;
pub use mirrored::{MirrorStatus, MirroredStore};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage path '{0}'")]
    InvalidPath(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error: {0}")]
    GitHub(String),
}

/// A stored object and the URL it can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub path: String,
    pub url: String,
}

#[async_trait]
pub trait PageStore: Send + Sync {
    /// Creates or overwrites the object at `path`.
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<StoredObject, StorageError>;

    /// The object's bytes, or None when nothing is stored at `path`.
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError>;

    fn public_url(&self, path: &str) -> String;
}

/// Rejects absolute paths, `..`, backslashes and empty segments.
pub fn validate_path(path: &str) -> Result<(), StorageError> {
    let valid = !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && path.split('/').all(|segment| !segment.is_empty() && segment != "." && segment != "..");
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidPath(path.to_string()))
    }
}

/// MIME type for the file extensions we store.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "json" => "application/json",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
