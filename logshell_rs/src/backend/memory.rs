//! In-process backend used by tests and the offline demo profile.
//!
//! Searches complete instantly against a canned event store; records live
//! in a mutex-guarded map per kind. Interior mutability keeps the trait's
//! `&self` surface.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::{Backend, BackendError, Record, Search, SearchId, SearchStatus};

struct SearchState {
    query: String,
    open: bool,
}

/// Backend that answers from process-local state.
pub struct MemoryBackend {
    records: Mutex<HashMap<String, Vec<Record>>>,
    searches: Mutex<HashMap<String, SearchState>>,
    next_search: AtomicU64,
    /// Keepalive pings observed; tests assert on this.
    pub keepalive_count: AtomicU64,
    events: Vec<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            searches: Mutex::new(HashMap::new()),
            next_search: AtomicU64::new(1),
            keepalive_count: AtomicU64::new(0),
            events: Vec::new(),
        }
    }

    /// A backend pre-seeded with demo macros, kits, users, and event lines.
    pub fn with_demo_data() -> Self {
        let mut b = Self::new();
        b.events = vec![
            "2026-07-31T10:00:01Z host=web-1 level=info msg=\"session opened\"".to_string(),
            "2026-07-31T10:00:04Z host=web-2 level=warn msg=\"slow response\"".to_string(),
            "2026-07-31T10:00:09Z host=db-1 level=error msg=\"connection reset\"".to_string(),
            "2026-07-31T10:00:12Z host=web-1 level=info msg=\"session closed\"".to_string(),
        ];
        {
            let mut records = b.records.lock().unwrap_or_else(|e| e.into_inner());
            records.insert(
                "macros".to_string(),
                vec![
                    Record::new("ERRORS")
                        .with_field("expansion", "level=error")
                        .with_field("owner", "admin"),
                    Record::new("WEBHOSTS")
                        .with_field("expansion", "host~web")
                        .with_field("owner", "admin"),
                ],
            );
            records.insert(
                "kits".to_string(),
                vec![
                    Record::new("network-observability")
                        .with_field("version", "2.1.0")
                        .with_field("state", "installed"),
                ],
            );
            records.insert(
                "users".to_string(),
                vec![
                    Record::new("admin")
                        .with_field("name", "Administrator")
                        .with_field("locked", "false"),
                ],
            );
        }
        b
    }

    fn with_kind<T>(
        &self,
        kind: &str,
        f: impl FnOnce(&mut Vec<Record>) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        f(records.entry(kind.to_string()).or_default())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryBackend {
    fn ping(&self) -> Result<(), BackendError> {
        Ok(())
    }

    fn start_search(&self, query: &str, _range: Duration) -> Result<Search, BackendError> {
        if query.trim().is_empty() {
            return Err(BackendError::Other("empty query".to_string()));
        }
        let n = self.next_search.fetch_add(1, Ordering::SeqCst);
        let id = format!("search-{n}");
        self.searches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                id.clone(),
                SearchState {
                    query: query.to_string(),
                    open: true,
                },
            );
        Ok(Search {
            id: SearchId(id),
            ping_interval: Some(Duration::from_secs(10)),
        })
    }

    fn search_status(&self, id: &SearchId) -> Result<SearchStatus, BackendError> {
        let searches = self.searches.lock().unwrap_or_else(|e| e.into_inner());
        let state = searches
            .get(&id.0)
            .ok_or_else(|| BackendError::NotFound(id.0.clone()))?;
        let stored = self.matching(&state.query).len() as u64;
        Ok(SearchStatus { done: true, stored })
    }

    fn search_results(&self, id: &SearchId, limit: usize) -> Result<Vec<String>, BackendError> {
        let searches = self.searches.lock().unwrap_or_else(|e| e.into_inner());
        let state = searches
            .get(&id.0)
            .ok_or_else(|| BackendError::NotFound(id.0.clone()))?;
        Ok(self.matching(&state.query).into_iter().take(limit).collect())
    }

    fn keepalive_search(&self, id: &SearchId) -> Result<(), BackendError> {
        let searches = self.searches.lock().unwrap_or_else(|e| e.into_inner());
        match searches.get(&id.0) {
            Some(s) if s.open => {
                self.keepalive_count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            _ => Err(BackendError::NotFound(id.0.clone())),
        }
    }

    fn close_search(&self, id: &SearchId) -> Result<(), BackendError> {
        let mut searches = self.searches.lock().unwrap_or_else(|e| e.into_inner());
        match searches.get_mut(&id.0) {
            Some(s) => {
                s.open = false;
                Ok(())
            }
            None => Err(BackendError::NotFound(id.0.clone())),
        }
    }

    fn list(&self, kind: &str) -> Result<Vec<Record>, BackendError> {
        self.with_kind(kind, |recs| Ok(recs.clone()))
    }

    fn get(&self, kind: &str, id: &str) -> Result<Record, BackendError> {
        self.with_kind(kind, |recs| {
            recs.iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| BackendError::NotFound(id.to_string()))
        })
    }

    fn create(&self, kind: &str, record: Record) -> Result<Record, BackendError> {
        self.with_kind(kind, |recs| {
            if recs.iter().any(|r| r.id == record.id) {
                return Err(BackendError::Conflict(record.id.clone()));
            }
            recs.push(record.clone());
            Ok(record)
        })
    }

    fn update(&self, kind: &str, record: Record) -> Result<Record, BackendError> {
        self.with_kind(kind, |recs| {
            match recs.iter_mut().find(|r| r.id == record.id) {
                Some(slot) => {
                    *slot = record.clone();
                    Ok(record)
                }
                None => Err(BackendError::NotFound(record.id.clone())),
            }
        })
    }

    fn delete(&self, kind: &str, id: &str) -> Result<(), BackendError> {
        self.with_kind(kind, |recs| {
            let before = recs.len();
            recs.retain(|r| r.id != id);
            if recs.len() == before {
                return Err(BackendError::NotFound(id.to_string()));
            }
            Ok(())
        })
    }
}

impl MemoryBackend {
    fn matching(&self, query: &str) -> Vec<String> {
        // tag=default matches everything; otherwise substring filter on the
        // needle after the last '=' (or the whole query).
        let needle = query.rsplit('=').next().unwrap_or(query).trim();
        self.events
            .iter()
            .filter(|line| needle == "default" || needle == "*" || line.contains(needle))
            .cloned()
            .collect()
    }
}
