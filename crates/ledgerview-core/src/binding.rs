//! # Record Stream Binding
//!
//! Keeps a left and a right record stream live for one [`ViewQuery`] and
//! publishes consistent `(left, right)` snapshot pairs.
//!
//! ## Data flow
//!
//! ```text
//! ViewQuery::All          ──► subscribe(L, All) ──┐
//! ViewQuery::Single(id)   ──► fetch_by_id(L, id) ─┤
//!                                                 ▼
//!                                           left snapshot
//!                                                 │ key set (KeyedMemo)
//!                                                 ▼
//!                                 subscribe(R, ByKeys(keys)) ──► right snapshot
//!                                                 │
//!                                                 ▼
//!                                   BindingSnapshot (watch channel)
//! ```
//!
//! ## Guarantees
//!
//! - A `Ready` snapshot is only published once the right side corresponds to
//!   the current left key set. Consumers never see a left update paired with
//!   a right snapshot keyed for the previous left side.
//! - The most recent query wins. Every `set_query` that changes the query
//!   bumps a request generation, carried to the driver with the query and
//!   stamped on every snapshot. Subscriptions and fetches of older
//!   generations are dropped and any result tagged with an older generation
//!   is discarded. Currency is judged by generation, not by query equality,
//!   so returning to an earlier query still starts over.
//! - Failures are surfaced as [`BindingStatus::Failed`] and never retried.
//!   A new query starts over.
//! - Dropping the binding aborts its task.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::errors::{StoreError, ViewError};
use crate::reactive::KeyedMemo;
use crate::record::{JoinKey, Record, RecordId, RecordKind};
use crate::store::{LiveQuery, LiveState, RecordQuery, RecordStore};

// ─────────────────────────────────────────────────────────────────────────────
// Queries and Snapshots
// ─────────────────────────────────────────────────────────────────────────────

/// Which left-side records a view wants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewQuery {
    /// Every live record, via a live subscription
    All,
    /// One record by identifier, via an override fetch
    Single(RecordId),
}

/// Status of a published snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingStatus {
    /// Waiting for the first consistent pair
    Loading,
    /// Left and right are consistent
    Ready,
    /// A subscription or fetch failed
    Failed(ViewError),
}

/// A published `(left, right)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingSnapshot<L, R> {
    /// Query generation this snapshot belongs to
    pub generation: u64,
    /// Publication counter, monotonically increasing across generations
    pub revision: u64,
    /// Query this snapshot answers
    pub query: ViewQuery,
    /// Snapshot status
    pub status: BindingStatus,
    /// Left-side records
    pub left: Arc<Vec<Record<L>>>,
    /// Right-side records matching the left key set
    pub right: Arc<Vec<Record<R>>>,
}

impl<L, R> BindingSnapshot<L, R> {
    /// Check if this snapshot is consistent and usable.
    pub fn is_ready(&self) -> bool {
        self.status == BindingStatus::Ready
    }

    /// Check if this snapshot is final for its query (ready or failed).
    pub fn is_settled(&self) -> bool {
        self.status != BindingStatus::Loading
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Binding State
// ─────────────────────────────────────────────────────────────────────────────

/// What the driver must do with the right subscription after a left update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RightAction {
    /// Key set unchanged; keep the current subscription
    Keep,
    /// Key set changed; drop the old subscription and open this one
    Resubscribe(RecordQuery),
    /// Key set is empty; no right subscription is needed
    Clear,
}

/// Pure binding state, driven by the async task.
///
/// Kept free of I/O so the consistency and staleness rules can be tested
/// directly.
#[derive(Debug)]
pub struct BindingState<L: RecordKind, R: RecordKind> {
    generation: u64,
    revision: u64,
    query: ViewQuery,
    left: Option<Arc<Vec<Record<L::Payload>>>>,
    right: Option<Arc<Vec<Record<R::Payload>>>>,
    right_query: KeyedMemo<BTreeSet<JoinKey>, Option<RecordQuery>>,
    failure: Option<ViewError>,
    _kinds: PhantomData<fn() -> (L, R)>,
}

impl<L: RecordKind, R: RecordKind> BindingState<L, R> {
    /// Create state for the first query (generation 0).
    pub fn new(query: ViewQuery) -> Self {
        Self {
            generation: 0,
            revision: 0,
            query,
            left: None,
            right: None,
            right_query: KeyedMemo::new(),
            failure: None,
            _kinds: PhantomData,
        }
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current query.
    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    /// Check if a failure has been recorded for this generation.
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Switch to the query of request `generation`, forgetting everything
    /// derived from the old one.
    pub fn reset(&mut self, generation: u64, query: ViewQuery) {
        self.generation = generation;
        self.query = query;
        self.left = None;
        self.right = None;
        self.right_query.invalidate();
        self.failure = None;
    }

    /// Accept a new left snapshot and derive the right-side query.
    pub fn apply_left(&mut self, records: Arc<Vec<Record<L::Payload>>>) -> RightAction {
        let keys: BTreeSet<JoinKey> = records
            .iter()
            .map(|record| L::join_key(&record.payload))
            .collect();
        self.left = Some(records);

        let recomputed = self.right_query.update(keys, |keys| {
            (!keys.is_empty()).then(|| RecordQuery::ByKeys(keys.clone()))
        });
        if !recomputed {
            return RightAction::Keep;
        }

        match self.right_query.get() {
            Some(Some(query)) => {
                // The old right snapshot no longer matches the key set.
                self.right = None;
                RightAction::Resubscribe(query.clone())
            }
            _ => {
                self.right = Some(Arc::new(Vec::new()));
                RightAction::Clear
            }
        }
    }

    /// Accept a right-side live state.
    pub fn apply_right(&mut self, state: LiveState<R::Payload>) {
        match state {
            LiveState::Loading => {}
            LiveState::Ready(records) => self.right = Some(records),
            LiveState::Failed(err) => self.fail(ViewError::subscription(R::NAME, err)),
        }
    }

    /// Accept an override fetch result tagged with the generation it was
    /// issued for. Returns `None` if the result is stale or failed.
    pub fn apply_fetched(
        &mut self,
        generation: u64,
        result: Result<Option<Record<L::Payload>>, StoreError>,
    ) -> Option<RightAction> {
        if generation != self.generation {
            tracing::debug!(
                kind = L::NAME,
                stale = generation,
                current = self.generation,
                "Discarding stale fetch result"
            );
            return None;
        }
        match result {
            Ok(found) => Some(self.apply_left(Arc::new(found.into_iter().collect()))),
            Err(err) => {
                self.fail(ViewError::fetch(L::NAME, err));
                None
            }
        }
    }

    /// Record a failure for this generation.
    pub fn fail(&mut self, error: ViewError) {
        tracing::warn!(
            kind = L::NAME,
            generation = self.generation,
            error = %error,
            "Record stream binding failed"
        );
        self.failure = Some(error);
    }

    /// Snapshot announcing that the current generation is loading.
    pub fn loading(&mut self) -> BindingSnapshot<L::Payload, R::Payload> {
        self.build(BindingStatus::Loading)
    }

    /// Next snapshot to publish, if the state is consistent or failed.
    pub fn publish(&mut self) -> Option<BindingSnapshot<L::Payload, R::Payload>> {
        if let Some(err) = self.failure.clone() {
            return Some(self.build(BindingStatus::Failed(err)));
        }
        if self.left.is_some() && self.right.is_some() {
            return Some(self.build(BindingStatus::Ready));
        }
        None
    }

    fn build(&mut self, status: BindingStatus) -> BindingSnapshot<L::Payload, R::Payload> {
        self.revision += 1;
        BindingSnapshot {
            generation: self.generation,
            revision: self.revision,
            query: self.query.clone(),
            status,
            left: self.left.clone().unwrap_or_default(),
            right: self.right.clone().unwrap_or_default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Driver Task
// ─────────────────────────────────────────────────────────────────────────────

type FetchFuture<P> = BoxFuture<'static, (u64, Result<Option<Record<P>>, StoreError>)>;

enum LeftSource<P> {
    Idle,
    Live(LiveQuery<P>),
    Fetch(FetchFuture<P>),
}

enum LeftEvent<P> {
    Live(LiveState<P>),
    Fetched(u64, Result<Option<Record<P>>, StoreError>),
    Closed(StoreError),
}

async fn next_left<P: Clone>(source: &mut LeftSource<P>) -> LeftEvent<P> {
    match source {
        LeftSource::Idle => std::future::pending().await,
        LeftSource::Live(live) => match live.changed().await {
            Ok(()) => LeftEvent::Live(live.current()),
            Err(err) => LeftEvent::Closed(err),
        },
        LeftSource::Fetch(fetch) => {
            let (generation, result) = fetch.await;
            *source = LeftSource::Idle;
            LeftEvent::Fetched(generation, result)
        }
    }
}

async fn next_right<P: Clone>(right: &mut Option<LiveQuery<P>>) -> Result<LiveState<P>, StoreError> {
    match right {
        Some(live) => {
            live.changed().await?;
            Ok(live.current())
        }
        None => std::future::pending().await,
    }
}

struct Driver<S, L: RecordKind, R: RecordKind> {
    store: Arc<S>,
    state: BindingState<L, R>,
    left: LeftSource<L::Payload>,
    right: Option<LiveQuery<R::Payload>>,
    snapshots: watch::Sender<BindingSnapshot<L::Payload, R::Payload>>,
}

impl<S: RecordStore, L: RecordKind, R: RecordKind> Driver<S, L, R> {
    async fn run(mut self, mut queries: watch::Receiver<QueryRequest>) {
        self.open_left().await;
        loop {
            tokio::select! {
                changed = queries.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let (generation, query) = queries.borrow_and_update().clone();
                    self.switch(generation, query).await;
                }
                event = next_left(&mut self.left) => self.on_left(event).await,
                state = next_right(&mut self.right) => self.on_right(state),
            }
        }
        tracing::trace!(kind = L::NAME, "Record stream binding stopped");
    }

    async fn switch(&mut self, generation: u64, query: ViewQuery) {
        // Drop superseded subscriptions and in-flight fetches first.
        self.left = LeftSource::Idle;
        self.right = None;
        self.state.reset(generation, query);
        tracing::debug!(
            kind = L::NAME,
            generation = self.state.generation(),
            query = ?self.state.query(),
            "View query changed"
        );
        self.snapshots.send_replace(self.state.loading());
        self.open_left().await;
    }

    async fn open_left(&mut self) {
        match self.state.query().clone() {
            ViewQuery::All => match self.store.subscribe::<L>(RecordQuery::All).await {
                Ok(mut live) => {
                    let initial = live.current();
                    self.left = LeftSource::Live(live);
                    self.on_left(LeftEvent::Live(initial)).await;
                }
                Err(err) => self.fail(ViewError::subscription(L::NAME, err)),
            },
            ViewQuery::Single(record_id) => {
                let generation = self.state.generation();
                let store = Arc::clone(&self.store);
                tracing::debug!(kind = L::NAME, %record_id, generation, "Fetching override record");
                self.left = LeftSource::Fetch(
                    async move {
                        let result = store.fetch_by_id::<L>(&record_id).await;
                        (generation, result)
                    }
                    .boxed(),
                );
            }
        }
    }

    async fn on_left(&mut self, event: LeftEvent<L::Payload>) {
        let action = match event {
            LeftEvent::Live(LiveState::Loading) => return,
            LeftEvent::Live(LiveState::Ready(records)) => self.state.apply_left(records),
            LeftEvent::Live(LiveState::Failed(err)) | LeftEvent::Closed(err) => {
                self.fail(ViewError::subscription(L::NAME, err));
                return;
            }
            LeftEvent::Fetched(generation, result) => {
                match self.state.apply_fetched(generation, result) {
                    Some(action) => action,
                    None => {
                        self.publish();
                        return;
                    }
                }
            }
        };
        self.apply_right_action(action).await;
        self.publish();
    }

    async fn apply_right_action(&mut self, action: RightAction) {
        match action {
            RightAction::Keep => {}
            RightAction::Clear => self.right = None,
            RightAction::Resubscribe(query) => {
                self.right = None;
                tracing::debug!(kind = R::NAME, ?query, "Resubscribing right side");
                match self.store.subscribe::<R>(query).await {
                    Ok(mut live) => {
                        let initial = live.current();
                        self.right = Some(live);
                        self.state.apply_right(initial);
                    }
                    Err(err) => self.state.fail(ViewError::subscription(R::NAME, err)),
                }
            }
        }
    }

    fn on_right(&mut self, state: Result<LiveState<R::Payload>, StoreError>) {
        match state {
            Ok(state) => self.state.apply_right(state),
            Err(err) => self.state.fail(ViewError::subscription(R::NAME, err)),
        }
        self.publish();
    }

    fn fail(&mut self, error: ViewError) {
        self.state.fail(error);
        self.publish();
    }

    fn publish(&mut self) {
        if self.state.is_failed() {
            // Not retried: stop listening until the next query.
            self.left = LeftSource::Idle;
            self.right = None;
        }
        if let Some(snapshot) = self.state.publish() {
            self.snapshots.send_replace(snapshot);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Binding Handle
// ─────────────────────────────────────────────────────────────────────────────

/// A requested query and the generation it was requested as.
type QueryRequest = (u64, ViewQuery);

/// Handle to a running record stream binding.
///
/// Reading never blocks: [`current`](Self::current) returns the latest
/// published snapshot. Dropping the handle stops the binding.
#[derive(Debug)]
pub struct RecordStreamBinding<L: RecordKind, R: RecordKind> {
    queries: watch::Sender<QueryRequest>,
    snapshots: watch::Receiver<BindingSnapshot<L::Payload, R::Payload>>,
    task: JoinHandle<()>,
}

impl<L: RecordKind, R: RecordKind> RecordStreamBinding<L, R> {
    /// Start a binding for `query` on the current tokio runtime.
    pub fn spawn<S: RecordStore>(store: Arc<S>, query: ViewQuery) -> Self {
        let mut state = BindingState::<L, R>::new(query.clone());
        let (snapshot_tx, snapshot_rx) = watch::channel(state.loading());
        let (query_tx, query_rx) = watch::channel((state.generation(), query));

        let driver = Driver {
            store,
            state,
            left: LeftSource::Idle,
            right: None,
            snapshots: snapshot_tx,
        };
        let task = tokio::spawn(driver.run(query_rx));

        Self {
            queries: query_tx,
            snapshots: snapshot_rx,
            task,
        }
    }

    /// Switch to a new query. Returns `false` if it equals the current one.
    pub fn set_query(&self, query: ViewQuery) -> bool {
        self.queries.send_if_modified(|(generation, current)| {
            if *current == query {
                false
            } else {
                *generation += 1;
                *current = query;
                true
            }
        })
    }

    /// Most recently requested query.
    pub fn query(&self) -> ViewQuery {
        self.queries.borrow().1.clone()
    }

    /// Generation of the most recently requested query.
    pub fn generation(&self) -> u64 {
        self.queries.borrow().0
    }

    /// Latest published snapshot.
    pub fn current(&self) -> BindingSnapshot<L::Payload, R::Payload> {
        self.snapshots.borrow().clone()
    }

    /// Check if a snapshot answers the most recently requested query.
    pub fn is_current(&self, snapshot: &BindingSnapshot<L::Payload, R::Payload>) -> bool {
        snapshot.generation == self.generation()
    }

    /// Wait for the next published snapshot. Returns `false` once the
    /// binding has stopped.
    pub async fn changed(&mut self) -> bool {
        self.snapshots.changed().await.is_ok()
    }

    /// Wait until the latest requested query has a ready or failed snapshot.
    pub async fn settled(&mut self) -> Option<BindingSnapshot<L::Payload, R::Payload>> {
        let wanted = self.generation();
        self.snapshots
            .wait_for(|snapshot| snapshot.generation == wanted && snapshot.is_settled())
            .await
            .ok()
            .map(|snapshot| snapshot.clone())
    }
}

impl<L: RecordKind, R: RecordKind> Drop for RecordStreamBinding<L, R> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
