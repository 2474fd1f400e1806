//! Registry - in-memory collections and environments, written through the gateway

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::constants::MAX_HISTORY;
use crate::models::{ApiRequest, ApiResponse, Environment, HistoryEntry, RequestCollection, SavedRequest};
use crate::network::dispatcher::Dispatcher;
use crate::network::executor::RequestExecutor;
use crate::storage::{new_id, CollectionRepository, EnvironmentRepository};
use crate::store::BlobStore;

/// Cached view of everything the UI lists, plus the active environment selection.
///
/// Writes go to the store first; the cache is only updated once the write succeeded.
pub struct Registry {
    environment_repo: EnvironmentRepository,
    collection_repo: CollectionRepository,
    environments: Vec<Environment>,
    collections: Vec<RequestCollection>,
    active_environment: Option<String>,
    history: VecDeque<HistoryEntry>,
}

impl Registry {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Registry {
            environment_repo: EnvironmentRepository::new(Arc::clone(&store)),
            collection_repo: CollectionRepository::new(store),
            environments: Vec::new(),
            collections: Vec::new(),
            active_environment: None,
            history: VecDeque::with_capacity(MAX_HISTORY),
        }
    }

    /// Refresh both caches from the store
    pub async fn load(&mut self) {
        self.environments = self.environment_repo.list().await;
        self.collections = self.collection_repo.list().await;

        let still_present = self
            .active_environment
            .as_deref()
            .is_some_and(|id| self.environments.iter().any(|e| e.id == id));
        if !still_present {
            self.active_environment = None;
        }

        tracing::info!(
            environments = self.environments.len(),
            collections = self.collections.len(),
            "Loaded registry"
        );
    }

    // ========================
    // Environments
    // ========================

    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }

    pub fn environment(&self, id: &str) -> Option<&Environment> {
        self.environments.iter().find(|e| e.id == id)
    }

    pub async fn save_environment(&mut self, environment: Environment) -> Result<Environment> {
        let saved = self.environment_repo.save(environment).await?;
        upsert(&mut self.environments, saved.clone(), |e| &e.id);
        Ok(saved)
    }

    pub async fn delete_environment(&mut self, id: &str) -> Result<()> {
        self.environment_repo.delete(id).await?;
        self.environments.retain(|e| e.id != id);
        if self.active_environment.as_deref() == Some(id) {
            self.active_environment = None;
        }
        Ok(())
    }

    /// Select the environment used for sends; `None` clears the selection.
    ///
    /// Returns `false` and leaves the selection alone for an unknown id.
    pub fn set_active_environment(&mut self, id: Option<&str>) -> bool {
        match id {
            None => {
                self.active_environment = None;
                true
            }
            Some(id) if self.environment(id).is_some() => {
                self.active_environment = Some(id.to_string());
                true
            }
            Some(_) => false,
        }
    }

    pub fn active_environment(&self) -> Option<&Environment> {
        self.active_environment
            .as_deref()
            .and_then(|id| self.environment(id))
    }

    // ========================
    // Collections
    // ========================

    pub fn collections(&self) -> &[RequestCollection] {
        &self.collections
    }

    pub fn collection(&self, id: &str) -> Option<&RequestCollection> {
        self.collections.iter().find(|c| c.id == id)
    }

    pub async fn save_collection(&mut self, collection: RequestCollection) -> Result<RequestCollection> {
        let saved = self.collection_repo.save(collection).await?;
        upsert(&mut self.collections, saved.clone(), |c| &c.id);
        Ok(saved)
    }

    pub async fn delete_collection(&mut self, id: &str) -> Result<()> {
        self.collection_repo.delete(id).await?;
        self.collections.retain(|c| c.id != id);
        Ok(())
    }

    /// Append a request to a collection and persist the collection
    pub async fn add_request(
        &mut self,
        collection_id: &str,
        name: impl Into<String>,
        request: ApiRequest,
    ) -> Result<SavedRequest> {
        let mut collection = self
            .collection(collection_id)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown collection: {}", collection_id))?;

        let saved = SavedRequest {
            id: new_id(),
            name: name.into(),
            request,
        };
        collection.requests.push(saved.clone());
        self.save_collection(collection).await?;
        Ok(saved)
    }

    /// Remove a request from a collection; an unknown request id is a no-op
    pub async fn remove_request(&mut self, collection_id: &str, request_id: &str) -> Result<()> {
        let mut collection = self
            .collection(collection_id)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown collection: {}", collection_id))?;

        let before = collection.requests.len();
        collection.requests.retain(|r| r.id != request_id);
        if collection.requests.len() != before {
            self.save_collection(collection).await?;
        }
        Ok(())
    }

    // ========================
    // Sending & history
    // ========================

    /// Send through `dispatcher` with the active environment and record the outcome
    pub async fn send<E: RequestExecutor>(&mut self, dispatcher: &Dispatcher<E>, request: &ApiRequest) -> ApiResponse {
        let response = dispatcher.send(request, self.active_environment()).await;
        self.add_to_history(HistoryEntry {
            request: request.clone(),
            response: response.clone(),
            timestamp: chrono::Utc::now(),
        });
        response
    }

    /// Add entry to history
    pub fn add_to_history(&mut self, entry: HistoryEntry) {
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_back();
        }
        self.history.push_front(entry);
    }

    /// History, most recent first
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

fn upsert<T>(items: &mut Vec<T>, item: T, id: impl Fn(&T) -> &String) {
    match items.iter().position(|existing| id(existing) == id(&item)) {
        Some(i) => items[i] = item,
        None => items.push(item),
    }
}
