use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio::fs;

use crate::error::AppError;

/// Where the JSON documents live. The store only ever reads and writes
/// whole named documents, so backends stay trivial to swap.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn read(&self, doc: &str) -> Result<Option<Vec<u8>>, AppError>;
    async fn write(&self, doc: &str, bytes: &[u8]) -> Result<(), AppError>;
}

/// Documents as files under a root directory. Saves overwrite in place;
/// concurrent writers race and the last save wins.
#[derive(Clone)]
pub struct FileBackend {
    root: Arc<PathBuf>,
}

impl FileBackend {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    pub async fn ensure_structure(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.root.as_ref()).await?;
        Ok(())
    }

    fn path_for(&self, doc: &str) -> PathBuf {
        self.root.join(doc)
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn read(&self, doc: &str) -> Result<Option<Vec<u8>>, AppError> {
        let path = self.path_for(doc);
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        let raw = fs::read(&path).await?;
        Ok(Some(raw))
    }

    async fn write(&self, doc: &str, bytes: &[u8]) -> Result<(), AppError> {
        fs::write(self.path_for(doc), bytes).await?;
        Ok(())
    }
}

/// In-memory backend so tests run against the same store code without
/// touching disk.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    docs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn read(&self, doc: &str) -> Result<Option<Vec<u8>>, AppError> {
        let docs = self
            .docs
            .lock()
            .map_err(|_| AppError::Other(anyhow::anyhow!("memory backend poisoned")))?;
        Ok(docs.get(doc).cloned())
    }

    async fn write(&self, doc: &str, bytes: &[u8]) -> Result<(), AppError> {
        let mut docs = self
            .docs
            .lock()
            .map_err(|_| AppError::Other(anyhow::anyhow!("memory backend poisoned")))?;
        docs.insert(doc.to_string(), bytes.to_vec());
        Ok(())
    }
}
