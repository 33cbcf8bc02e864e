//! Contract for the remote analytics backend consumed by the shell core.
//!
//! The HTTP client is an external collaborator; the core only depends on
//! this trait. [`MemoryBackend`](memory::MemoryBackend) implements it
//! in-process for tests and the offline demo profile.

pub mod heartbeat;
pub mod memory;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque identifier of a running search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchId(pub String);

impl std::fmt::Display for SearchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle to a search the backend accepted.
#[derive(Debug, Clone)]
pub struct Search {
    pub id: SearchId,
    /// Keep-alive interval the server asked for, if it reported one.
    pub ping_interval: Option<Duration>,
}

/// Progress report for a running search.
#[derive(Debug, Clone, Copy)]
pub struct SearchStatus {
    pub done: bool,
    /// Entries stored so far.
    pub stored: u64,
}

/// A generic named record (macro, kit, user, ...) as the backend stores it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    /// Ordered field map; the List scaffold derives its columns from here.
    pub fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: &str) -> Self {
        self.fields.insert(key.to_string(), value.to_string());
        self
    }
}

/// Errors the backend reports to the shell.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    Conflict(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("{0}")]
    Other(String),
}

/// Operations the shell core requires of the backend.
///
/// All methods are synchronous from the caller's perspective; the prompt
/// invokes them from task threads, never from the event loop itself.
pub trait Backend: Send + Sync {
    /// Liveness probe; also used by the keep-alive heartbeat.
    fn ping(&self) -> Result<(), BackendError>;

    // === Search lifecycle ===

    fn start_search(&self, query: &str, range: Duration) -> Result<Search, BackendError>;
    fn search_status(&self, id: &SearchId) -> Result<SearchStatus, BackendError>;
    fn search_results(&self, id: &SearchId, limit: usize) -> Result<Vec<String>, BackendError>;
    /// Refresh the server-side lease on a running search.
    fn keepalive_search(&self, id: &SearchId) -> Result<(), BackendError>;
    fn close_search(&self, id: &SearchId) -> Result<(), BackendError>;

    // === Record CRUD, keyed by kind ("macros", "kits", ...) ===

    fn list(&self, kind: &str) -> Result<Vec<Record>, BackendError>;
    fn get(&self, kind: &str, id: &str) -> Result<Record, BackendError>;
    fn create(&self, kind: &str, record: Record) -> Result<Record, BackendError>;
    fn update(&self, kind: &str, record: Record) -> Result<Record, BackendError>;
    fn delete(&self, kind: &str, id: &str) -> Result<(), BackendError>;
}
