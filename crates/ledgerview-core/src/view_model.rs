//! # View Models
//!
//! Per-domain glue between a [`RecordStreamBinding`] and the generic views.
//!
//! A [`ViewModel`] declares the two record kinds to bind and how a joined
//! pair is shaped into a composite record. [`ViewModelBuilder`] starts a
//! binding for a query and hands back a [`ViewData`] accessor that views read
//! from without awaiting.
//!
//! Composites are recomputed from scratch for every published snapshot and
//! cached per snapshot revision, so repeated renders of one snapshot share a
//! single shaping pass.

use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::binding::{BindingSnapshot, BindingStatus, RecordStreamBinding, ViewQuery};
use crate::collection::KeyedCollection;
use crate::errors::ViewError;
use crate::join::{left_join, JoinedPair};
use crate::lazy::map_iter;
use crate::reactive::KeyedMemo;
use crate::record::{Record, RecordId, RecordKind};
use crate::store::RecordStore;

/// Payload of a view model's left kind.
pub type LeftPayload<M> = <<M as ViewModel>::Left as RecordKind>::Payload;

/// Payload of a view model's right kind.
pub type RightPayload<M> = <<M as ViewModel>::Right as RecordKind>::Payload;

/// A joined pair of records as seen by a view model.
pub type RecordPair<M> = JoinedPair<Record<LeftPayload<M>>, Record<RightPayload<M>>>;

/// Declares a left-joined view over two record kinds.
pub trait ViewModel: Send + Sync + 'static {
    /// Primary kind; every left record yields one composite
    type Left: RecordKind;
    /// Secondary kind, matched on the shared join key
    type Right: RecordKind;
    /// Shaped record handed to views
    type Composite: Clone + Send + Sync + 'static;

    /// Shape one joined pair. Must not depend on anything but the pair.
    fn shape(pair: RecordPair<Self>) -> Self::Composite;
}

/// Join two snapshots and shape the result.
///
/// Output order follows the left snapshot (last occurrence wins on a
/// duplicate join key).
pub fn compose<M: ViewModel>(
    left: &[Record<LeftPayload<M>>],
    right: &[Record<RightPayload<M>>],
) -> Vec<M::Composite> {
    let left = KeyedCollection::from_records::<M::Left>(left);
    let right = KeyedCollection::from_records::<M::Right>(right);
    let joined = left_join(&left, &right);
    map_iter(M::shape, joined.into_values()).into_iter().collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// View State
// ─────────────────────────────────────────────────────────────────────────────

/// What a view should show.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    /// No consistent snapshot for the current query yet
    Loading,
    /// Composites of the latest snapshot
    Ready(Arc<Vec<T>>),
    /// The binding failed
    Failed(ViewError),
}

impl<T> ViewState<T> {
    /// Composites, or an empty slice while loading or failed.
    pub fn records(&self) -> &[T] {
        match self {
            Self::Ready(records) => records.as_slice(),
            Self::Loading | Self::Failed(_) => &[],
        }
    }

    /// Check if the view is still waiting for data.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// View Data
// ─────────────────────────────────────────────────────────────────────────────

type CompositeCache<T> = KeyedMemo<(u64, u64), Arc<Vec<T>>>;

/// Live data accessor for one view.
///
/// Owns the underlying binding: dropping the accessor unmounts the view.
pub struct ViewData<M: ViewModel> {
    binding: RecordStreamBinding<M::Left, M::Right>,
    composites: Mutex<CompositeCache<M::Composite>>,
}

impl<M: ViewModel> ViewData<M> {
    fn new(binding: RecordStreamBinding<M::Left, M::Right>) -> Self {
        Self {
            binding,
            composites: Mutex::new(KeyedMemo::new()),
        }
    }

    /// Current view state. Never awaits.
    pub fn state(&self) -> ViewState<M::Composite> {
        let snapshot = self.binding.current();
        if !self.binding.is_current(&snapshot) {
            return ViewState::Loading;
        }
        match &snapshot.status {
            BindingStatus::Loading => ViewState::Loading,
            BindingStatus::Failed(err) => ViewState::Failed(err.clone()),
            BindingStatus::Ready => ViewState::Ready(self.composites(&snapshot)),
        }
    }

    /// Composites of the current snapshot (empty while loading or failed).
    pub fn records(&self) -> Vec<M::Composite> {
        self.state().records().to_vec()
    }

    /// First composite, used by single-record views.
    pub fn first(&self) -> Option<M::Composite> {
        self.state().records().first().cloned()
    }

    /// Most recently requested query.
    pub fn query(&self) -> ViewQuery {
        self.binding.query()
    }

    /// Switch the view to a new query.
    pub fn set_query(&self, query: ViewQuery) -> bool {
        self.binding.set_query(query)
    }

    /// Wait for the next published snapshot.
    pub async fn changed(&mut self) -> bool {
        self.binding.changed().await
    }

    /// Wait until the current query has a ready or failed snapshot.
    pub async fn settled(&mut self) -> ViewState<M::Composite> {
        match self.binding.settled().await {
            Some(_) => self.state(),
            None => ViewState::Loading,
        }
    }

    fn composites(
        &self,
        snapshot: &BindingSnapshot<LeftPayload<M>, RightPayload<M>>,
    ) -> Arc<Vec<M::Composite>> {
        let mut cache = self.composites.lock();
        cache.update((snapshot.generation, snapshot.revision), |_| {
            Arc::new(compose::<M>(&snapshot.left, &snapshot.right))
        });
        cache.get().cloned().unwrap_or_default()
    }
}

impl<M: ViewModel> std::fmt::Debug for ViewData<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewData")
            .field("query", &self.binding.query())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Starts view data for a [`ViewModel`] against a record store.
pub struct ViewModelBuilder<M, S> {
    store: Arc<S>,
    _model: PhantomData<fn() -> M>,
}

impl<M, S> Clone for ViewModelBuilder<M, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _model: PhantomData,
        }
    }
}

impl<M: ViewModel, S: RecordStore> ViewModelBuilder<M, S> {
    /// Create a builder over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _model: PhantomData,
        }
    }

    /// The store views are bound to.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Every composite, kept live.
    ///
    /// Must be called from within a tokio runtime.
    pub fn use_data(&self) -> ViewData<M> {
        self.bind(ViewQuery::All)
    }

    /// At most one composite for `record_id`, via the override fetch.
    pub fn use_single(&self, record_id: impl Into<RecordId>) -> ViewData<M> {
        self.bind(ViewQuery::Single(record_id.into()))
    }

    /// Bind an arbitrary view query.
    pub fn bind(&self, query: ViewQuery) -> ViewData<M> {
        tracing::debug!(
            left = <M::Left as RecordKind>::NAME,
            right = <M::Right as RecordKind>::NAME,
            ?query,
            "Binding view data"
        );
        ViewData::new(RecordStreamBinding::spawn(Arc::clone(&self.store), query))
    }
}
