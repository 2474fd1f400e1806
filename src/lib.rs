//! # Freeman Core
//!
//! Request composition, environment interpolation and dispatch engine behind
//! the Freeman API testing client.
//!
//! ## Features
//! - HTTP methods: GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS
//! - Editable params/headers with index-based key renames
//! - Raw or JSON request bodies
//! - `{{variable}}` substitution from the active environment
//! - Environments and collections persisted as JSON arrays
//! - Request history
//! - cURL import/export
//!
//! ## Architecture
//! - Builder - pure edits on [`ApiRequest`]
//! - Dispatcher - substitution, executor call, response normalization
//! - Storage - persistence gateway over a [`store::BlobStore`]
//! - Registry - cached entities and the active environment

pub mod builder;
pub mod constants;
pub mod curl;
pub mod logging;
pub mod messages;
pub mod models;
pub mod network;
pub mod pairs;
pub mod registry;
pub mod storage;
pub mod store;
pub mod substitute;

// Re-export commonly used types
pub use curl::{parse_curl, to_curl};
pub use messages::{DispatchCommand, DispatchEvent};
pub use models::{
    ApiRequest, ApiResponse, Environment, HistoryEntry, HttpMethod, RequestBody, RequestCollection, SavedRequest,
};
pub use network::{
    DispatchActor, Dispatcher, NormalizedRequest, RawResponse, RequestExecutor, ReqwestExecutor, TransportError,
};
pub use pairs::KeyValueList;
pub use registry::Registry;
pub use storage::{CollectionRepository, EnvironmentRepository, Repository};
pub use store::{BlobStore, FileStore, MemoryStore};
pub use substitute::substitute;
