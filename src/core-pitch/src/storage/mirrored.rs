use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::{PageStore, StorageError, StoredObject};

/// Progress of the best-effort copy of one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum MirrorStatus {
    Pending,
    Synced { url: String },
    Failed { error: String },
}

/// Write-through to a primary store, with an optional mirror copied in the background.
///
/// The primary is the source of truth: its errors fail the write and all reads go to it.
/// Mirror writes run as spawned tasks whose result is recorded per path.
#[derive(Clone)]
pub struct MirroredStore {
    primary: Arc<dyn PageStore>,
    mirror: Option<Arc<dyn PageStore>>,
    statuses: Arc<RwLock<HashMap<String, MirrorStatus>>>,
}

impl MirroredStore {
    pub fn new(primary: Arc<dyn PageStore>, mirror: Option<Arc<dyn PageStore>>) -> Self {
        Self {
            primary,
            mirror,
            statuses: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn has_mirror(&self) -> bool {
        self.mirror.is_some()
    }

    /// Writes to the primary, then starts the mirror copy.
    ///
    /// The returned handle resolves to the mirror's final status; dropping it does not cancel
    /// the copy. No handle when there is no mirror.
    pub async fn write_through(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(StoredObject, Option<JoinHandle<MirrorStatus>>), StorageError> {
        let stored = self.primary.put(path, &bytes, content_type).await?;

        let Some(mirror) = self.mirror.clone() else {
            return Ok((stored, None));
        };

        self.statuses
            .write()
            .await
            .insert(path.to_string(), MirrorStatus::Pending);

        let statuses = self.statuses.clone();
        let path = path.to_string();
        let content_type = content_type.to_string();
        let handle = tokio::spawn(async move {
            let status = match mirror.put(&path, &bytes, &content_type).await {
                Ok(object) => {
                    tracing::debug!("Mirrored {} to {}", path, object.url);
                    MirrorStatus::Synced { url: object.url }
                }
                Err(e) => {
                    tracing::warn!("Mirroring {} failed: {}", path, e);
                    MirrorStatus::Failed { error: e.to_string() }
                }
            };
            statuses.write().await.insert(path, status.clone());
            status
        });

        Ok((stored, Some(handle)))
    }

    /// Last known mirror status of `path`. None if it was never mirrored by this process.
    pub async fn mirror_status(&self, path: &str) -> Option<MirrorStatus> {
        self.statuses.read().await.get(path).cloned()
    }
}

#[async_trait]
impl PageStore for MirroredStore {
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<StoredObject, StorageError> {
        let (stored, _handle) = self.write_through(path, bytes.to_vec(), content_type).await?;
        Ok(stored)
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.primary.get(path).await
    }

    fn public_url(&self, path: &str) -> String {
        self.primary.public_url(path)
    }
}
