//! Persistence gateway: one record, one key, three operations.

use crate::error::PersistenceError;
use crate::snapshot::{Snapshot, STORAGE_KEY};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::fs;

/// Storage the board store writes through.
///
/// `load` and `clear` never fail outward: problems are logged here and
/// reported as "nothing stored" / `false`. `save` returns its error so the
/// store can decide what to do. `try_load` is the raw read behind `load`,
/// for callers that want to tell a failed read from an empty one.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn try_load(&self) -> Result<Option<Snapshot>, PersistenceError>;

    async fn load(&self) -> Option<Snapshot> {
        match self.try_load().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("failed to read board: {}", e);
                None
            }
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError>;

    async fn clear(&self) -> bool;
}

/// Stores the board as pretty JSON in `<dir>/kanbanData.json`.
pub struct FileGateway {
    dir: PathBuf,
}

impl FileGateway {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn record_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", STORAGE_KEY))
    }
}

#[async_trait]
impl PersistenceGateway for FileGateway {
    async fn try_load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        let path = self.record_path();
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot = Snapshot::from_json(&content)?;
        tracing::debug!(path = %path.display(), tasks = snapshot.tasks.len(), "loaded board");
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let content = snapshot.to_json()?;
        atomic_write(&self.record_path(), content.as_bytes()).await?;
        tracing::debug!(tasks = snapshot.tasks.len(), "saved board");
        Ok(())
    }

    async fn clear(&self) -> bool {
        match fs::remove_file(self.record_path()).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                tracing::warn!("failed to clear board: {}", e);
                false
            }
        }
    }
}

/// Write to a temp file next to `path`, then rename over it.
async fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).await?;
    fs::rename(&temp_path, path).await
}

/// Keeps the serialized record in memory. Going offline makes every
/// operation fail the way an unreachable backend would.
#[derive(Default)]
pub struct MemoryGateway {
    record: Mutex<Option<String>>,
    offline: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a raw stored record.
    pub fn with_record(json: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(json.into())),
            offline: AtomicBool::new(false),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Raw stored JSON, if any.
    pub fn raw(&self) -> Option<String> {
        self.record.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn try_load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        if self.is_offline() {
            return Err(PersistenceError::unavailable("storage offline"));
        }
        match self.raw() {
            Some(raw) => Ok(Some(Snapshot::from_json(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        if self.is_offline() {
            return Err(PersistenceError::unavailable("storage offline"));
        }
        let content = snapshot.to_json()?;
        *self.record.lock().unwrap_or_else(|e| e.into_inner()) = Some(content);
        Ok(())
    }

    async fn clear(&self) -> bool {
        if self.is_offline() {
            tracing::warn!("failed to clear board: storage offline");
            return false;
        }
        *self.record.lock().unwrap_or_else(|e| e.into_inner()) = None;
        true
    }
}
