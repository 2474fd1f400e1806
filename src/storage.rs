//! Persistence gateway - list/get/save/delete of environments and collections
//!
//! Each entity kind lives as one JSON array under its own blob store key and
//! every write rewrites the whole array. Reads degrade to empty results when
//! the stored blob is unreadable; writes propagate failures.

use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::constants::{COLLECTIONS_KEY, ENVIRONMENTS_KEY};
use crate::models::{Environment, RequestCollection};
use crate::store::BlobStore;

/// Something stored by id in a JSON array
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Blob store key holding the array
    const KEY: &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);
}

impl Entity for Environment {
    const KEY: &'static str = ENVIRONMENTS_KEY;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Entity for RequestCollection {
    const KEY: &'static str = COLLECTIONS_KEY;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Fresh unique entity id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Gateway for one entity kind
pub struct Repository<T> {
    store: Arc<dyn BlobStore>,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Repository {
            store: Arc::clone(&self.store),
            _kind: PhantomData,
        }
    }
}

pub type EnvironmentRepository = Repository<Environment>;
pub type CollectionRepository = Repository<RequestCollection>;

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Repository {
            store,
            _kind: PhantomData,
        }
    }

    async fn load(&self) -> Result<Vec<T>> {
        match self.store.get(T::KEY).await? {
            Some(data) => serde_json::from_str(&data)
                .with_context(|| format!("parsing stored {}", T::KEY)),
            None => Ok(Vec::new()),
        }
    }

    async fn write(&self, entities: &[T]) -> Result<()> {
        let data = serde_json::to_string(entities)
            .with_context(|| format!("serializing {}", T::KEY))?;
        self.store
            .set(T::KEY, &data)
            .await
            .with_context(|| format!("saving {}", T::KEY))?;
        tracing::debug!(key = T::KEY, count = entities.len(), "Stored entities");
        Ok(())
    }

    /// All stored entities in insertion order; empty if the store cannot be read
    pub async fn list(&self) -> Vec<T> {
        match self.load().await {
            Ok(entities) => entities,
            Err(e) => {
                tracing::warn!(key = T::KEY, error = %format!("{:#}", e), "Stored data unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        self.list().await.into_iter().find(|e| e.id() == id)
    }

    /// Insert or replace by id, returning the entity as stored.
    ///
    /// An entity without an id gets a fresh one and is appended. An existing
    /// id is replaced in place, keeping the position of every other entry.
    pub async fn save(&self, mut entity: T) -> Result<T> {
        if entity.id().is_empty() {
            entity.set_id(new_id());
        }

        let mut entities = self.load().await?;
        match entities.iter().position(|e| e.id() == entity.id()) {
            Some(i) => entities[i] = entity.clone(),
            None => entities.push(entity.clone()),
        }
        self.write(&entities).await?;
        Ok(entity)
    }

    /// Remove by id; nothing is written when the id is absent
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut entities = self.load().await?;
        let before = entities.len();
        entities.retain(|e| e.id() != id);
        if entities.len() == before {
            return Ok(());
        }
        self.write(&entities).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApiRequest, HttpMethod, SavedRequest};
    use crate::store::{FileStore, MemoryStore};
    use async_trait::async_trait;
    use tempfile::tempdir;

    fn memory() -> Arc<dyn BlobStore> {
        Arc::new(MemoryStore::new())
    }

    fn env(id: &str, name: &str) -> Environment {
        let mut env = Environment::new(name);
        env.id = id.to_string();
        env.set("host", format!("{}.example.com", name));
        env
    }

    #[tokio::test]
    async fn test_save_then_get_roundtrip() {
        let repo = EnvironmentRepository::new(memory());
        let saved = repo.save(env("e1", "dev")).await.unwrap();
        assert_eq!(repo.get("e1").await, Some(saved));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_none() {
        let repo = EnvironmentRepository::new(memory());
        repo.save(env("e1", "dev")).await.unwrap();
        repo.delete("e1").await.unwrap();
        assert_eq!(repo.get("e1").await, None);
        repo.delete("e1").await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place() {
        let repo = EnvironmentRepository::new(memory());
        repo.save(env("a", "one")).await.unwrap();
        repo.save(env("b", "two")).await.unwrap();
        repo.save(env("c", "three")).await.unwrap();

        repo.save(env("b", "renamed")).await.unwrap();
        let names: Vec<_> = repo.list().await.into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["one", "renamed", "three"]);
    }

    #[tokio::test]
    async fn test_empty_id_appends_with_generated_id() {
        let repo = EnvironmentRepository::new(memory());
        repo.save(env("a", "one")).await.unwrap();
        let saved = repo.save(Environment::new("fresh")).await.unwrap();

        assert!(!saved.id.is_empty());
        let all = repo.list().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[1], saved);
    }

    #[tokio::test]
    async fn test_collections_roundtrip() {
        let repo = CollectionRepository::new(memory());
        let mut col = RequestCollection::new("Users API");
        col.requests.push(SavedRequest {
            id: "r1".into(),
            name: "List users".into(),
            request: ApiRequest::new(HttpMethod::GET, "{{base}}/users"),
        });

        let saved = repo.save(col).await.unwrap();
        let loaded = repo.get(&saved.id).await.unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.request("r1").map(|r| r.name.as_str()), Some("List users"));
    }

    #[tokio::test]
    async fn test_kinds_use_separate_keys() {
        let store = memory();
        let envs = EnvironmentRepository::new(Arc::clone(&store));
        let cols = CollectionRepository::new(Arc::clone(&store));

        envs.save(env("x", "dev")).await.unwrap();
        assert!(cols.list().await.is_empty());
        assert!(store.get(ENVIRONMENTS_KEY).await.unwrap().is_some());
        assert!(store.get(COLLECTIONS_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_store_reads_empty_but_write_fails() {
        let store = memory();
        store.set(ENVIRONMENTS_KEY, "{not an array").await.unwrap();
        let repo = EnvironmentRepository::new(store);

        assert!(repo.list().await.is_empty());
        assert_eq!(repo.get("anything").await, None);
        assert!(repo.save(env("a", "dev")).await.is_err());
        assert!(repo.delete("a").await.is_err());
    }

    /// Always fails writes
    struct ReadOnlyStore;

    #[async_trait]
    impl BlobStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn set(&self, key: &str, _value: &str) -> Result<()> {
            anyhow::bail!("{} is read-only", key)
        }
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let repo = EnvironmentRepository::new(Arc::new(ReadOnlyStore));
        let err = repo.save(env("a", "dev")).await.unwrap_err();
        assert!(format!("{:#}", err).contains("read-only"));
    }

    #[tokio::test]
    async fn test_persisted_as_json_array_on_disk() {
        let temp = tempdir().unwrap();
        let store: Arc<dyn BlobStore> = Arc::new(FileStore::new(temp.path()));
        let repo = EnvironmentRepository::new(Arc::clone(&store));
        repo.save(env("e1", "dev")).await.unwrap();

        let raw = std::fs::read_to_string(temp.path().join("environments.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "id": "e1",
                "name": "dev",
                "variables": {"host": "dev.example.com"}
            }])
        );

        let reopened = EnvironmentRepository::new(Arc::new(FileStore::new(temp.path())));
        assert_eq!(reopened.get("e1").await.map(|e| e.name), Some("dev".to_string()));
    }
}
