//! In-process record store.
//!
//! `MemoryStore` keeps one table per record kind and pushes a fresh filtered
//! snapshot to every live query whose result changed. Action handlers are
//! registered per (kind, choice) and run synchronously against the store.
//!
//! Test knobs:
//! - [`MemoryStore::set_fetch_latency`] delays `fetch_by_id` for one record
//! - [`MemoryStore::fail_kind`] makes subscriptions and fetches of a kind fail
//!   until [`MemoryStore::recover_kind`] is called

use async_trait::async_trait;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

use super::{ActionOutcome, ActionPayload, LiveQuery, LiveState, RecordQuery, RecordStore};
use crate::errors::StoreError;
use crate::record::{JoinKey, Record, RecordId, RecordKind};

/// Handler invoked for a registered action choice.
pub type ActionHandler = Arc<
    dyn Fn(&MemoryStore, &RecordId, &ActionPayload) -> Result<ActionOutcome, StoreError>
        + Send
        + Sync,
>;

struct Table<P> {
    records: Vec<Record<P>>,
    key_fn: fn(&P) -> JoinKey,
    subscribers: Vec<(RecordQuery, watch::Sender<LiveState<P>>)>,
    failure: Option<StoreError>,
}

impl<P: Clone + PartialEq> Table<P> {
    fn new(key_fn: fn(&P) -> JoinKey) -> Self {
        Self {
            records: Vec::new(),
            key_fn,
            subscribers: Vec::new(),
            failure: None,
        }
    }

    fn state_for(&self, query: &RecordQuery) -> LiveState<P> {
        if let Some(err) = &self.failure {
            return LiveState::Failed(err.clone());
        }
        let matching: Vec<Record<P>> = self
            .records
            .iter()
            .filter(|record| query.matches(&(self.key_fn)(&record.payload)))
            .cloned()
            .collect();
        LiveState::Ready(Arc::new(matching))
    }

    /// Push the current snapshot to every open query whose result changed.
    fn publish(&mut self) {
        self.subscribers.retain(|(_, tx)| !tx.is_closed());
        for (query, tx) in &self.subscribers {
            let next = self.state_for(query);
            tx.send_if_modified(|current| {
                if *current == next {
                    false
                } else {
                    *current = next;
                    true
                }
            });
        }
    }
}

#[derive(Default)]
struct Inner {
    tables: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
    handlers: HashMap<(&'static str, String), ActionHandler>,
    fetch_latency: HashMap<RecordId, Duration>,
}

impl Inner {
    fn table<K: RecordKind>(&self) -> Result<&Table<K::Payload>, StoreError> {
        self.tables
            .get(K::NAME)
            .ok_or_else(|| StoreError::unknown_kind(K::NAME))?
            .downcast_ref()
            .ok_or_else(|| payload_mismatch::<K>())
    }

    fn table_mut<K: RecordKind>(&mut self) -> Result<&mut Table<K::Payload>, StoreError> {
        self.tables
            .entry(K::NAME)
            .or_insert_with(|| Box::new(Table::<K::Payload>::new(K::join_key)))
            .downcast_mut()
            .ok_or_else(|| payload_mismatch::<K>())
    }
}

fn payload_mismatch<K: RecordKind>() -> StoreError {
    StoreError::internal(format!(
        "record kind {} registered with a different payload type",
        K::NAME
    ))
}

/// An in-process [`RecordStore`].
///
/// Cloning shares the underlying tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MemoryStore")
            .field("kinds", &inner.tables.keys().collect::<Vec<_>>())
            .field("handlers", &inner.handlers.len())
            .finish()
    }
}

impl MemoryStore {
    /// Create an empty store with no registered kinds.
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Tables ──────────────────────────────────────────────

    /// Register kind `K` so it can be queried before any record exists.
    pub fn register<K: RecordKind>(&self) -> Result<(), StoreError> {
        self.inner.lock().table_mut::<K>().map(|_| ())
    }

    /// Insert a record with a fresh identifier.
    pub fn insert<K: RecordKind>(&self, payload: K::Payload) -> Result<RecordId, StoreError> {
        let record_id = RecordId::new(format!("#{}", Uuid::new_v4().simple()));
        self.insert_with_id::<K>(record_id, payload)
    }

    /// Insert or replace a record under a caller-chosen identifier.
    pub fn insert_with_id<K: RecordKind>(
        &self,
        record_id: impl Into<RecordId>,
        payload: K::Payload,
    ) -> Result<RecordId, StoreError> {
        let record_id = record_id.into();
        let mut inner = self.inner.lock();
        let table = inner.table_mut::<K>()?;
        match table
            .records
            .iter_mut()
            .find(|record| record.record_id == record_id)
        {
            Some(existing) => existing.payload = payload,
            None => table.records.push(Record::new(record_id.clone(), payload)),
        }
        table.publish();
        Ok(record_id)
    }

    /// Remove a record, returning it if it existed.
    pub fn archive<K: RecordKind>(
        &self,
        record_id: &RecordId,
    ) -> Result<Option<Record<K::Payload>>, StoreError> {
        let mut inner = self.inner.lock();
        let table = inner.table_mut::<K>()?;
        let Some(position) = table
            .records
            .iter()
            .position(|record| &record.record_id == record_id)
        else {
            return Ok(None);
        };
        let removed = table.records.remove(position);
        table.publish();
        Ok(Some(removed))
    }

    /// All live records of kind `K`, in insertion order.
    pub fn records<K: RecordKind>(&self) -> Vec<Record<K::Payload>> {
        self.inner
            .lock()
            .table::<K>()
            .map(|table| table.records.clone())
            .unwrap_or_default()
    }

    /// Number of open live queries on kind `K`.
    pub fn subscriber_count<K: RecordKind>(&self) -> usize {
        let mut inner = self.inner.lock();
        match inner.table_mut::<K>() {
            Ok(table) => {
                table.subscribers.retain(|(_, tx)| !tx.is_closed());
                table.subscribers.len()
            }
            Err(_) => 0,
        }
    }

    // ─── Failure Injection ───────────────────────────────────

    /// Fail every live query and fetch on kind `K` with `error`.
    pub fn fail_kind<K: RecordKind>(&self, error: StoreError) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let table = inner.table_mut::<K>()?;
        table.failure = Some(error);
        table.publish();
        Ok(())
    }

    /// Clear an injected failure and republish snapshots.
    pub fn recover_kind<K: RecordKind>(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let table = inner.table_mut::<K>()?;
        table.failure = None;
        table.publish();
        Ok(())
    }

    /// Delay `fetch_by_id` for one record.
    pub fn set_fetch_latency(&self, record_id: impl Into<RecordId>, latency: Duration) {
        self.inner
            .lock()
            .fetch_latency
            .insert(record_id.into(), latency);
    }

    // ─── Actions ─────────────────────────────────────────────

    /// Register the handler for `choice` on kind `K`.
    pub fn on_action<K, F>(&self, choice: impl Into<String>, handler: F)
    where
        K: RecordKind,
        F: Fn(&MemoryStore, &RecordId, &ActionPayload) -> Result<ActionOutcome, StoreError>
            + Send
            + Sync
            + 'static,
    {
        self.inner
            .lock()
            .handlers
            .insert((K::NAME, choice.into()), Arc::new(handler));
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn subscribe<K: RecordKind>(
        &self,
        query: RecordQuery,
    ) -> Result<LiveQuery<K::Payload>, StoreError> {
        let mut inner = self.inner.lock();
        let table = inner
            .tables
            .get_mut(K::NAME)
            .ok_or_else(|| StoreError::unknown_kind(K::NAME))?
            .downcast_mut::<Table<K::Payload>>()
            .ok_or_else(payload_mismatch::<K>)?;

        let (tx, rx) = watch::channel(table.state_for(&query));
        table.subscribers.push((query.clone(), tx));
        tracing::trace!(kind = K::NAME, ?query, "Opened live query");
        Ok(LiveQuery::new(K::NAME, query, rx))
    }

    async fn fetch_by_id<K: RecordKind>(
        &self,
        record_id: &RecordId,
    ) -> Result<Option<Record<K::Payload>>, StoreError> {
        let latency = self.inner.lock().fetch_latency.get(record_id).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let inner = self.inner.lock();
        let table = inner.table::<K>()?;
        if let Some(err) = &table.failure {
            return Err(err.clone());
        }
        Ok(table
            .records
            .iter()
            .find(|record| &record.record_id == record_id)
            .cloned())
    }

    async fn submit_action<K: RecordKind>(
        &self,
        record_id: &RecordId,
        action: ActionPayload,
    ) -> Result<ActionOutcome, StoreError> {
        let handler = {
            let inner = self.inner.lock();
            let table = inner.table::<K>()?;
            if !table
                .records
                .iter()
                .any(|record| &record.record_id == record_id)
            {
                return Err(StoreError::not_found(K::NAME, record_id.as_str()));
            }
            inner
                .handlers
                .get(&(K::NAME, action.choice.clone()))
                .cloned()
                .ok_or_else(|| {
                    StoreError::action_rejected(&action.choice, format!("no handler on {}", K::NAME))
                })?
        };
        handler(self, record_id, &action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        topic: String,
        body: String,
    }

    struct Notes;

    impl RecordKind for Notes {
        const NAME: &'static str = "Note";
        type Payload = Note;

        fn join_key(payload: &Note) -> JoinKey {
            JoinKey::new(payload.topic.clone())
        }
    }

    fn note(topic: &str, body: &str) -> Note {
        Note {
            topic: topic.to_string(),
            body: body.to_string(),
        }
    }

    fn ready_len(state: &LiveState<Note>) -> usize {
        match state {
            LiveState::Ready(records) => records.len(),
            other => panic!("expected ready state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unregistered_kind_is_unknown() {
        let store = MemoryStore::new();
        let err = store.subscribe::<Notes>(RecordQuery::All).await.unwrap_err();
        assert_matches!(err, StoreError::UnknownKind { .. });
    }

    #[tokio::test]
    async fn test_subscription_receives_filtered_snapshots() {
        let store = MemoryStore::new();
        store.register::<Notes>().unwrap();

        let keys = [JoinKey::from("a")].into_iter().collect();
        let mut live = store.subscribe::<Notes>(RecordQuery::ByKeys(keys)).await.unwrap();
        assert_eq!(ready_len(&live.current()), 0);

        store.insert::<Notes>(note("a", "first")).unwrap();
        live.changed().await.unwrap();
        assert_eq!(ready_len(&live.current()), 1);

        // A record outside the key set does not wake the query.
        store.insert::<Notes>(note("b", "other")).unwrap();
        assert!(!live.has_changed());
    }

    #[tokio::test]
    async fn test_insert_with_id_replaces() {
        let store = MemoryStore::new();
        store.insert_with_id::<Notes>("#1", note("a", "v1")).unwrap();
        store.insert_with_id::<Notes>("#1", note("a", "v2")).unwrap();

        let records = store.records::<Notes>();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload.body, "v2");
    }

    #[tokio::test]
    async fn test_fetch_by_id_absent_is_none() {
        let store = MemoryStore::new();
        let id = store.insert::<Notes>(note("a", "x")).unwrap();

        assert!(store.fetch_by_id::<Notes>(&id).await.unwrap().is_some());
        assert!(store
            .fetch_by_id::<Notes>(&RecordId::from("#missing"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_dropped_query_unsubscribes() {
        let store = MemoryStore::new();
        store.register::<Notes>().unwrap();
        let live = store.subscribe::<Notes>(RecordQuery::All).await.unwrap();
        assert_eq!(store.subscriber_count::<Notes>(), 1);

        drop(live);
        assert_eq!(store.subscriber_count::<Notes>(), 0);
    }

    #[tokio::test]
    async fn test_failure_and_recovery() {
        let store = MemoryStore::new();
        let id = store.insert::<Notes>(note("a", "x")).unwrap();
        let mut live = store.subscribe::<Notes>(RecordQuery::All).await.unwrap();

        store.fail_kind::<Notes>(StoreError::unavailable("offline")).unwrap();
        live.changed().await.unwrap();
        assert_matches!(live.current(), LiveState::Failed(StoreError::Unavailable { .. }));
        assert!(store.fetch_by_id::<Notes>(&id).await.is_err());

        store.recover_kind::<Notes>().unwrap();
        live.changed().await.unwrap();
        assert_eq!(ready_len(&live.current()), 1);
    }

    #[tokio::test]
    async fn test_action_handler_runs_against_store() {
        let store = MemoryStore::new();
        let id = store.insert::<Notes>(note("a", "x")).unwrap();
        store.on_action::<Notes, _>("Archive", |store, record_id, _| {
            store.archive::<Notes>(record_id)?;
            Ok(ActionOutcome {
                archived: vec![record_id.clone()],
                ..ActionOutcome::default()
            })
        });

        let outcome = store
            .submit_action::<Notes>(&id, ActionPayload::new("Archive", serde_json::Value::Null))
            .await
            .unwrap();
        assert_eq!(outcome.archived, vec![id.clone()]);
        assert!(store.records::<Notes>().is_empty());

        let err = store
            .submit_action::<Notes>(&id, ActionPayload::new("Archive", serde_json::Value::Null))
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::NotFound { .. });
    }

    #[tokio::test]
    async fn test_unknown_choice_is_rejected() {
        let store = MemoryStore::new();
        let id = store.insert::<Notes>(note("a", "x")).unwrap();
        let err = store
            .submit_action::<Notes>(&id, ActionPayload::new("Nope", serde_json::Value::Null))
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::ActionRejected { .. });
    }
}
