//! Application constants
//!
//! Centralized location for storage keys and configuration defaults.

/// Timeout applied to a request that does not carry its own `timeout_ms`
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Blob store key holding the JSON array of environments
pub const ENVIRONMENTS_KEY: &str = "environments";

/// Blob store key holding the JSON array of request collections
pub const COLLECTIONS_KEY: &str = "collections";

/// Data directory created under the user's home directory
pub const DATA_DIR_NAME: &str = ".freeman";

/// Log file written by [`crate::logging::init`]
pub const LOG_FILE_NAME: &str = "freeman.log";

/// Number of dispatched requests kept in the registry history
pub const MAX_HISTORY: usize = 50;

/// User agent sent by the reqwest executor
pub const USER_AGENT: &str = concat!("freeman/", env!("CARGO_PKG_VERSION"));
