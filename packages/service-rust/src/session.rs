//! Concurrent in-memory store of processing sessions.
//!
//! A session lets a caller share state across a sequence of operation
//! invocations. Sessions live from begin-session until explicit
//! end-session; nothing here expires them, so abandoned sessions accumulate
//! until the process exits. Fault tolerance across restarts would need an
//! external store.

use std::collections::HashMap;
use std::fmt;

use dashmap::DashMap;
use millrun_core::Value;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Opaque unique token identifying one processing session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh random identifier (hyphenated UUID v4).
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for SessionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Errors raised by session mutations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    /// Write against a session that does not exist (never created, or
    /// already destroyed).
    #[error("unknown processing session [{0}]")]
    NotFound(SessionId),
}

/// Concurrent store of active sessions and their attributes.
///
/// Backed by a sharded concurrent map, so operations on unrelated sessions
/// never contend on a global lock. Within one session, concurrent writes to
/// the same key are last-write-wins; the store provides data-race safety
/// only, and callers needing compound read-modify-write atomicity must
/// coordinate externally.
///
/// The live internal map is never exposed: reads go through per-key
/// accessors and [`snapshot`](Self::snapshot) returns detached copies.
pub struct SessionStore {
    sessions: DashMap<SessionId, HashMap<String, Value>>,
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Creates a new session with an empty attribute mapping and returns
    /// its generated identifier.
    pub fn create(&self) -> SessionId {
        self.create_with(std::iter::empty())
    }

    /// Creates a new session seeded with the given initial attributes.
    pub fn create_with(&self, seed: impl IntoIterator<Item = (String, Value)>) -> SessionId {
        let id = SessionId::generate();
        self.sessions.insert(id.clone(), seed.into_iter().collect());
        debug!("Created processing session [{id}]");
        id
    }

    /// Removes the session and its attributes.
    ///
    /// Idempotent: destroying an unknown or already-destroyed id is a
    /// no-op, so duplicate teardown calls are harmless.
    pub fn destroy(&self, id: &SessionId) {
        if self.sessions.remove(id).is_some() {
            debug!("Destroyed processing session [{id}]");
        }
    }

    /// Reads one attribute of a session.
    ///
    /// Returns `None` both when the session does not exist and when the key
    /// is unset within an existing session; callers cannot distinguish the
    /// two causes from this call alone.
    #[must_use]
    pub fn get(&self, id: &SessionId, key: &str) -> Option<Value> {
        self.sessions
            .get(id)
            .and_then(|attrs| attrs.get(key).cloned())
    }

    /// Writes one attribute of a session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] when the session does not exist:
    /// writing into a non-existent session indicates a caller error, unlike
    /// the read-tolerant [`get`](Self::get).
    pub fn set(
        &self,
        id: &SessionId,
        key: impl Into<String>,
        value: Value,
    ) -> Result<(), SessionError> {
        match self.sessions.get_mut(id) {
            Some(mut attrs) => {
                attrs.insert(key.into(), value);
                Ok(())
            }
            None => Err(SessionError::NotFound(id.clone())),
        }
    }

    /// Point-in-time snapshot of every session's attributes, for
    /// diagnostics.
    ///
    /// The snapshot is detached: mutations made after it is taken are not
    /// visible through it and cannot corrupt it. Entries are copied shard
    /// by shard, so sessions mutated mid-iteration may appear in either
    /// their old or new state, but each entry is internally consistent.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<SessionId, HashMap<String, Value>> {
        self.sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of active sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn create_installs_empty_session() {
        let store = SessionStore::new();
        let id = store.create();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&id, "anything"), None);
    }

    #[test]
    fn create_with_seeds_initial_attributes() {
        let store = SessionStore::new();
        let id = store.create_with(vec![
            ("mode".to_string(), Value::from("batch")),
            ("limit".to_string(), Value::Int(5)),
        ]);
        assert_eq!(store.get(&id, "mode"), Some(Value::from("batch")));
        assert_eq!(store.get(&id, "limit"), Some(Value::Int(5)));
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = SessionStore::new();
        let id = store.create();
        store.set(&id, "result", Value::from("HELLO")).unwrap();
        assert_eq!(store.get(&id, "result"), Some(Value::from("HELLO")));
    }

    #[test]
    fn set_overwrites_last_write_wins() {
        let store = SessionStore::new();
        let id = store.create();
        store.set(&id, "k", Value::Int(1)).unwrap();
        store.set(&id, "k", Value::Int(2)).unwrap();
        assert_eq!(store.get(&id, "k"), Some(Value::Int(2)));
    }

    #[test]
    fn get_unknown_session_is_absent_not_error() {
        let store = SessionStore::new();
        assert_eq!(store.get(&SessionId::from("no-such-id"), "k"), None);
    }

    #[test]
    fn set_unknown_session_fails() {
        let store = SessionStore::new();
        let id = SessionId::from("no-such-id");
        let err = store.set(&id, "k", Value::Null).unwrap_err();
        assert_eq!(err, SessionError::NotFound(id));
    }

    #[test]
    fn destroy_removes_session_and_is_idempotent() {
        let store = SessionStore::new();
        let id = store.create();
        store.set(&id, "k", Value::Int(1)).unwrap();

        store.destroy(&id);
        assert!(store.is_empty());
        assert_eq!(store.get(&id, "k"), None);
        assert!(store.set(&id, "k", Value::Int(2)).is_err());

        // Second teardown is a no-op, not an error.
        store.destroy(&id);
    }

    #[test]
    fn snapshot_is_detached_from_later_mutations() {
        let store = SessionStore::new();
        let id = store.create();
        store.set(&id, "k", Value::Int(1)).unwrap();

        let snapshot = store.snapshot();

        store.set(&id, "k", Value::Int(2)).unwrap();
        let other = store.create();
        store.destroy(&id);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[&id].get("k"), Some(&Value::Int(1)));
        assert!(!snapshot.contains_key(&other));
    }

    #[test]
    fn ids_are_unique_over_many_creates() {
        let store = SessionStore::new();
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(store.create()));
        }
        assert_eq!(store.len(), 10_000);
    }

    #[test]
    fn concurrent_creates_produce_distinct_destroyable_ids() {
        let store = Arc::new(SessionStore::new());
        let ids = Arc::new(parking_lot::Mutex::new(Vec::new()));

        thread::scope(|s| {
            for _ in 0..8 {
                let store = Arc::clone(&store);
                let ids = Arc::clone(&ids);
                s.spawn(move || {
                    for _ in 0..100 {
                        ids.lock().push(store.create());
                    }
                });
            }
        });

        let ids = ids.lock();
        let distinct: HashSet<&SessionId> = ids.iter().collect();
        assert_eq!(distinct.len(), 800);
        assert_eq!(store.len(), 800);

        for id in ids.iter() {
            store.destroy(id);
        }
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_writes_to_distinct_sessions_do_not_interfere() {
        let store = Arc::new(SessionStore::new());
        let ids: Vec<SessionId> = (0..16).map(|_| store.create()).collect();

        thread::scope(|s| {
            for (i, id) in ids.iter().enumerate() {
                let store = Arc::clone(&store);
                s.spawn(move || {
                    store
                        .set(id, "owner", Value::Int(i64::try_from(i).unwrap()))
                        .unwrap();
                });
            }
        });

        for (i, id) in ids.iter().enumerate() {
            assert_eq!(
                store.get(id, "owner"),
                Some(Value::Int(i64::try_from(i).unwrap()))
            );
        }
    }

    #[test]
    fn concurrent_readers_and_writers_on_one_session() {
        let store = Arc::new(SessionStore::new());
        let id = store.create();
        store.set(&id, "k", Value::Int(0)).unwrap();

        thread::scope(|s| {
            for i in 0..4_i64 {
                let store = Arc::clone(&store);
                let id = id.clone();
                s.spawn(move || {
                    for j in 0..50 {
                        store.set(&id, "k", Value::Int(i * 1000 + j)).unwrap();
                    }
                });
            }
            for _ in 0..4 {
                let store = Arc::clone(&store);
                let id = id.clone();
                s.spawn(move || {
                    for _ in 0..50 {
                        // Whatever value is observed must be a written one.
                        let value = store.get(&id, "k").unwrap();
                        assert!(value.as_int().is_some());
                    }
                });
            }
        });
    }
}
