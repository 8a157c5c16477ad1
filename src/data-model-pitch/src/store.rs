//! In-memory client records with a lossy JSON snapshot on disk.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::{ClientRecord, SnapshotEntry};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unreadable snapshot moved to {}: {source}", .moved_to.display())]
    Corrupt {
        moved_to: PathBuf,
        source: serde_json::Error,
    },

    #[error("Snapshot writes are disabled: {0} could not be loaded")]
    SnapshotBlocked(PathBuf),
}

/// All client records, keyed by id.
///
/// Reads are served from memory. Every insert rewrites the snapshot, when one is configured;
/// snapshot rewrites are serialized so they never interleave. A snapshot that exists but cannot
/// be loaded is never overwritten.
pub struct ClientStore {
    clients: RwLock<HashMap<Uuid, ClientRecord>>,
    snapshot_path: Option<PathBuf>,
    snapshot_lock: Mutex<()>,
    snapshot_blocked: AtomicBool,
}

impl ClientStore {
    pub fn new(snapshot_path: Option<PathBuf>) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            snapshot_path,
            snapshot_lock: Mutex::new(()),
            snapshot_blocked: AtomicBool::new(false),
        }
    }

    /// Reads the snapshot into memory, re-deriving each record's fields from its prompt.
    /// A missing snapshot is an empty store. Returns how many records were loaded.
    ///
    /// A snapshot that is not valid JSON is renamed aside so the next write starts a fresh file.
    /// If it cannot be read or moved, snapshot writes stay disabled for the life of the store.
    pub async fn load(&self) -> Result<usize, StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(0);
        };
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                self.snapshot_blocked.store(true, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        let entries: Vec<SnapshotEntry> = match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(source) => {
                let moved_to = corrupt_path(path);
                if let Err(e) = tokio::fs::rename(path, &moved_to).await {
                    self.snapshot_blocked.store(true, Ordering::SeqCst);
                    tracing::error!("Could not move unreadable snapshot {} aside: {}", path.display(), e);
                    return Err(source.into());
                }
                return Err(StoreError::Corrupt { moved_to, source });
            }
        };
        let mut clients = self.clients.write().await;
        for entry in entries {
            let record = ClientRecord::from_snapshot(entry);
            clients.insert(record.id, record);
        }
        tracing::info!("Loaded {} clients from {}", clients.len(), path.display());
        Ok(clients.len())
    }

    /// Stores the record, replacing any with the same id, then rewrites the snapshot.
    /// Snapshot failures are logged: the record stays available from memory.
    pub async fn insert(&self, record: ClientRecord) {
        self.clients.write().await.insert(record.id, record);
        if let Err(e) = self.save_snapshot().await {
            tracing::error!("Failed to save client snapshot: {}", e);
        }
    }

    pub async fn get(&self, id: &Uuid) -> Option<ClientRecord> {
        self.clients.read().await.get(id).cloned()
    }

    /// Every record, newest first.
    pub async fn list(&self) -> Vec<ClientRecord> {
        let mut records: Vec<ClientRecord> = self.clients.read().await.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn save_snapshot(&self) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        if self.snapshot_blocked.load(Ordering::SeqCst) {
            return Err(StoreError::SnapshotBlocked(path.clone()));
        }
        let _guard = self.snapshot_lock.lock().await;

        let mut entries: Vec<SnapshotEntry> = self
            .clients
            .read()
            .await
            .values()
            .map(ClientRecord::to_snapshot)
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let json = serde_json::to_vec_pretty(&entries)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// `clients.json` becomes `clients.json.corrupt-20250301T100000`.
fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".corrupt-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S")));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_list() {
        let store = ClientStore::new(None);
        let first = ClientRecord::new("Empresa: Acme", None);
        let mut second = ClientRecord::new("Empresa: Beta", None);
        second.created_at = first.created_at + chrono::Duration::seconds(1);

        store.insert(first.clone()).await;
        store.insert(second.clone()).await;

        assert_eq!(store.get(&first.id).await, Some(first.clone()));
        assert_eq!(store.get(&Uuid::new_v4()).await, None);
        let listed: Vec<Uuid> = store.list().await.iter().map(|r| r.id).collect();
        assert_eq!(listed, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_same_id_last_writer_wins() {
        let store = ClientStore::new(None);
        let record = ClientRecord::new("one", None);
        let mut replacement = record.clone();
        replacement.prompt = "two".to_string();

        store.insert(record.clone()).await;
        store.insert(replacement).await;
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&record.id).await.unwrap().prompt, "two");
    }

    #[tokio::test]
    async fn test_snapshot_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("clients.json");

        let record = ClientRecord::new("Nombre: Ana\nPrecio: 10k", Some("https://x.test/l.png".to_string()));
        {
            let store = ClientStore::new(Some(path.clone()));
            store.insert(record.clone()).await;
        }
        assert!(path.exists());

        let store = ClientStore::new(Some(path));
        assert_eq!(store.load().await.unwrap(), 1);
        let restored = store.get(&record.id).await.unwrap();
        assert_eq!(restored.prompt, record.prompt);
        assert_eq!(restored.url, record.url);
        assert_eq!(restored.fields.name.as_deref(), Some("Ana"));
        assert_eq!(restored.fields.price.as_deref(), Some("10k"));
        assert_eq!(restored.logo_url, None);
    }

    #[tokio::test]
    async fn test_load_reads_hand_written_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clients.json");
        std::fs::write(
            &path,
            r#"[{"id":"6f1c2a1e-3b7d-4c59-9a53-2f1f6f3b8e11","prompt":"Empresa: Acme","createdAt":"2025-03-01T10:00:00.000Z","url":"/client/6f1c2a1e-3b7d-4c59-9a53-2f1f6f3b8e11"}]"#,
        )
        .unwrap();

        let store = ClientStore::new(Some(path));
        assert_eq!(store.load().await.unwrap(), 1);
        let id: Uuid = "6f1c2a1e-3b7d-4c59-9a53-2f1f6f3b8e11".parse().unwrap();
        assert_eq!(store.get(&id).await.unwrap().fields.company.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ClientStore::new(Some(dir.path().join("nope.json")));
        assert_eq!(store.load().await.unwrap(), 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_moved_aside_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clients.json");
        std::fs::write(&path, "not json").unwrap();
        let store = ClientStore::new(Some(path.clone()));

        let Err(StoreError::Corrupt { moved_to, .. }) = store.load().await else {
            panic!("expected a corrupt snapshot error");
        };
        assert!(!path.exists());
        assert_eq!(std::fs::read_to_string(&moved_to).unwrap(), "not json");
        assert!(
            moved_to
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("clients.json.corrupt-")
        );

        let record = ClientRecord::new("Empresa: Acme", None);
        store.insert(record.clone()).await;
        assert_eq!(std::fs::read_to_string(&moved_to).unwrap(), "not json");
        let reloaded = ClientStore::new(Some(path));
        assert_eq!(reloaded.load().await.unwrap(), 1);
        assert!(reloaded.get(&record.id).await.is_some());
    }

    #[tokio::test]
    async fn test_unreadable_snapshot_blocks_writes() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the snapshot file should be: reading it fails with an I/O error
        let path = dir.path().join("clients.json");
        std::fs::create_dir(&path).unwrap();
        let store = ClientStore::new(Some(path.clone()));

        assert!(matches!(store.load().await, Err(StoreError::Io(_))));
        store.insert(ClientRecord::new("Empresa: Acme", None)).await;
        assert_eq!(store.len().await, 1);
        assert!(path.is_dir());
        assert!(matches!(store.save_snapshot().await, Err(StoreError::SnapshotBlocked(_))));
    }
}
