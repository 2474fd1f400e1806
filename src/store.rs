//! Blob store capability - string-keyed storage of serialized entity arrays

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;

use crate::constants::DATA_DIR_NAME;

/// Durable key-value storage of string blobs
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the blob stored under `key`, `None` if nothing was ever written
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob stored under `key`
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<key>.json` inside a directory
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    /// `~/.freeman`, or `./.freeman` when there is no home directory
    pub fn default_location() -> Self {
        let dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DATA_DIR_NAME);
        FileStore::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl BlobStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {}", self.dir.display()))?;

        // Readers only ever see a complete array
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        fs::write(&tmp, value)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }
}

/// In-memory store for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.blobs
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path().join("data"));

        assert_eq!(store.get("environments").await.unwrap(), None);

        store.set("environments", "[]").await.unwrap();
        store.set("environments", r#"[{"id":"1"}]"#).await.unwrap();
        assert_eq!(
            store.get("environments").await.unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );
        assert!(temp.path().join("data/environments.json").exists());
        assert!(!temp.path().join("data/environments.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_keys_are_separate() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());
        store.set("collections", "[1]").await.unwrap();
        assert_eq!(store.get("environments").await.unwrap(), None);
        assert_eq!(store.get("collections").await.unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_default_location_ends_with_data_dir() {
        let store = FileStore::default_location();
        assert!(store.dir().ends_with(DATA_DIR_NAME));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
