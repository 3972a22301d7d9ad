//! Per-client log of failed calls.
//!
//! Entries are keyed by request id and kept until `clear` is called. There is
//! no eviction: a client that keeps failing grows the log, and trimming it is
//! the operator's call. A sequence index keeps `recent` proportional to the
//! number of entries asked for.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::integration::types::IntegrationError;

#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: DashMap<String, (u64, IntegrationError)>,
    /// Insertion sequence → request id.
    order: RwLock<BTreeMap<u64, String>>,
    sequence: AtomicU64,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, error: IntegrationError) {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let id = error.id.clone();
        let previous = self.entries.insert(id.clone(), (seq, error));

        let mut order = self.write_order();
        if let Some((old_seq, _)) = previous {
            order.remove(&old_seq);
        }
        order.insert(seq, id);
    }

    /// Up to `limit` entries, most recent first.
    pub fn recent(&self, limit: usize) -> Vec<IntegrationError> {
        let ids: Vec<String> = self
            .read_order()
            .values()
            .rev()
            .take(limit)
            .cloned()
            .collect();
        ids.iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn latest(&self) -> Option<IntegrationError> {
        let id = self.read_order().values().next_back().cloned()?;
        self.get(&id)
    }

    pub fn get(&self, id: &str) -> Option<IntegrationError> {
        self.entries.get(id).map(|r| r.value().1.clone())
    }

    /// Mark an entry as handled. Returns false for unknown ids.
    pub fn resolve(&self, id: &str) -> bool {
        match self.entries.get_mut(id) {
            Some(mut entry) => {
                entry.value_mut().1.resolved = true;
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        let mut order = self.write_order();
        self.entries.clear();
        order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn read_order(&self) -> RwLockReadGuard<'_, BTreeMap<u64, String>> {
        self.order.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_order(&self) -> RwLockWriteGuard<'_, BTreeMap<u64, String>> {
        self.order.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::classifier::{ErrorKind, Severity};
    use crate::transport::IntegrationRequest;

    fn error(id: &str) -> IntegrationError {
        IntegrationError {
            id: id.to_string(),
            endpoint_id: "crm".to_string(),
            kind: ErrorKind::ServerError,
            severity: Severity::High,
            code: None,
            message: "boom".to_string(),
            request: IntegrationRequest::get("/"),
            response: None,
            retry_count: 0,
            timestamp: 0,
            resolved: false,
        }
    }

    #[test]
    fn test_recent_is_most_recent_first() {
        let log = ErrorLog::new();
        for id in ["a", "b", "c", "d"] {
            log.record(error(id));
        }
        let ids: Vec<String> = log.recent(3).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["d", "c", "b"]);
        assert_eq!(log.latest().unwrap().id, "d");
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn test_resolve_and_clear() {
        let log = ErrorLog::new();
        log.record(error("a"));

        assert!(log.resolve("a"));
        assert!(!log.resolve("missing"));
        assert!(log.get("a").unwrap().resolved);

        log.clear();
        assert!(log.is_empty());
        assert!(log.recent(10).is_empty());
        assert!(log.latest().is_none());
    }

    #[test]
    fn test_rerecorded_id_moves_to_front() {
        let log = ErrorLog::new();
        for id in ["a", "b", "c"] {
            log.record(error(id));
        }
        let mut again = error("a");
        again.message = "boom again".into();
        log.record(again);

        let recent = log.recent(10);
        let ids: Vec<&str> = recent.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
        assert_eq!(recent[0].message, "boom again");
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_recent_on_large_log_takes_newest() {
        let log = ErrorLog::new();
        for i in 0..10_000 {
            log.record(error(&format!("e{}", i)));
        }
        let ids: Vec<String> = log.recent(3).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["e9999", "e9998", "e9997"]);
        assert_eq!(log.recent(0).len(), 0);
    }
}
