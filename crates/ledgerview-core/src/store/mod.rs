//! # Record Store Boundary
//!
//! The record store is an external collaborator. This module only fixes the
//! contract the engine consumes:
//!
//! - [`RecordStore::subscribe`] opens a live query; every emission is a full
//!   replacement snapshot of the matching records
//! - [`RecordStore::fetch_by_id`] is a one-shot lookup used for detail views
//! - [`RecordStore::submit_action`] is used by action collaborators only
//!
//! ```text
//! store emission ──► LiveQuery (watch) ──► RecordStreamBinding ──► ViewData
//!                                              │
//!                                              └──► fetch_by_id (override)
//! ```
//!
//! Dropping a [`LiveQuery`] unsubscribes it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;

use crate::errors::StoreError;
use crate::record::{JoinKey, Record, RecordId, RecordKind};

#[cfg(feature = "memory-store")]
pub mod memory;

#[cfg(feature = "memory-store")]
pub use memory::MemoryStore;

// ─────────────────────────────────────────────────────────────────────────────
// Query Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Store-side query parameters.
///
/// The engine never filters by arbitrary predicates; a query selects either
/// everything of a kind or the records whose join key is in a set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordQuery {
    /// Every live record of the kind
    All,
    /// Records whose join key is one of these
    ByKeys(BTreeSet<JoinKey>),
}

impl RecordQuery {
    /// Check if a record with this join key is selected by the query.
    pub fn matches(&self, key: &JoinKey) -> bool {
        match self {
            Self::All => true,
            Self::ByKeys(keys) => keys.contains(key),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Live Queries
// ─────────────────────────────────────────────────────────────────────────────

/// Latest state of a live query.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveState<P> {
    /// No snapshot received yet
    Loading,
    /// Full replacement snapshot
    Ready(Arc<Vec<Record<P>>>),
    /// The store signalled an error on this query
    Failed(StoreError),
}

impl<P> LiveState<P> {
    /// Check if a snapshot is available.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// A live subscription handle.
///
/// Wraps a watch receiver; the store holds the sender and pushes a new
/// [`LiveState`] on every relevant change.
#[derive(Debug)]
pub struct LiveQuery<P> {
    kind: &'static str,
    query: RecordQuery,
    receiver: watch::Receiver<LiveState<P>>,
}

impl<P: Clone> LiveQuery<P> {
    /// Create a live query from a store-side receiver.
    pub fn new(kind: &'static str, query: RecordQuery, receiver: watch::Receiver<LiveState<P>>) -> Self {
        Self {
            kind,
            query,
            receiver,
        }
    }

    /// Record kind name this query is for.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Parameters this query was opened with.
    pub fn query(&self) -> &RecordQuery {
        &self.query
    }

    /// Latest state, marking it as seen.
    pub fn current(&mut self) -> LiveState<P> {
        self.receiver.borrow_and_update().clone()
    }

    /// Check if an emission arrived since the last `current()`.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for the next emission.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the store dropped the query.
    pub async fn changed(&mut self) -> Result<(), StoreError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| StoreError::unavailable(format!("{} subscription closed", self.kind)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Actions
// ─────────────────────────────────────────────────────────────────────────────

/// A record-scoped action request (a choice exercised on a record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPayload {
    /// Choice name
    pub choice: String,
    /// Choice argument
    pub argument: serde_json::Value,
}

impl ActionPayload {
    /// Create an action payload.
    pub fn new(choice: impl Into<String>, argument: serde_json::Value) -> Self {
        Self {
            choice: choice.into(),
            argument,
        }
    }
}

/// Result of a successful action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Choice return value
    pub result: serde_json::Value,
    /// Records created by the action
    pub created: Vec<RecordId>,
    /// Records archived by the action
    pub archived: Vec<RecordId>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Record Store Trait
// ─────────────────────────────────────────────────────────────────────────────

/// The record store client consumed by the engine.
///
/// Conflict resolution, retries and caching are the store's business; the
/// engine only reads snapshots and submits actions.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Open a live query for kind `K`.
    ///
    /// The returned handle starts at the current snapshot (or `Loading`) and
    /// must be re-issued by the caller when `query` changes.
    async fn subscribe<K: RecordKind>(
        &self,
        query: RecordQuery,
    ) -> Result<LiveQuery<K::Payload>, StoreError>;

    /// One-shot lookup of a single record. Absence is `Ok(None)`.
    async fn fetch_by_id<K: RecordKind>(
        &self,
        record_id: &RecordId,
    ) -> Result<Option<Record<K::Payload>>, StoreError>;

    /// Exercise an action on a record of kind `K`.
    async fn submit_action<K: RecordKind>(
        &self,
        record_id: &RecordId,
        action: ActionPayload,
    ) -> Result<ActionOutcome, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_query_matches() {
        let keys: BTreeSet<JoinKey> = [JoinKey::from("p1")].into_iter().collect();
        let by_keys = RecordQuery::ByKeys(keys);

        assert!(RecordQuery::All.matches(&JoinKey::from("anything")));
        assert!(by_keys.matches(&JoinKey::from("p1")));
        assert!(!by_keys.matches(&JoinKey::from("p2")));
    }

    #[tokio::test]
    async fn test_live_query_tracks_sender() {
        let (tx, rx) = watch::channel(LiveState::<u32>::Loading);
        let mut live = LiveQuery::new("Counter", RecordQuery::All, rx);
        assert_eq!(live.current(), LiveState::Loading);

        let snapshot = Arc::new(vec![Record::new("#1", 7u32)]);
        tx.send_replace(LiveState::Ready(snapshot.clone()));
        live.changed().await.unwrap();
        assert_eq!(live.current(), LiveState::Ready(snapshot));

        drop(tx);
        assert!(live.changed().await.is_err());
    }
}
