use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use super::{PageStore, StorageError, StoredObject, validate_path};

/// Files under a directory that is also served over HTTP.
#[derive(Debug, Clone)]
pub struct LocalDiskStore {
    root: PathBuf,
    base_url: String,
}

impl LocalDiskStore {
    /// `base_url` is prefixed to paths to build public URLs. An empty one yields site-relative
    /// URLs like `/clients/<id>.html`.
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl PageStore for LocalDiskStore {
    async fn put(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<StoredObject, StorageError> {
        validate_path(path)?;
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, bytes).await?;
        tracing::debug!("Wrote {} bytes to {}", bytes.len(), full_path.display());
        Ok(StoredObject {
            path: path.to_string(),
            url: self.public_url(path),
        })
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_path(path)?;
        match tokio::fs::read(self.root.join(path)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}
