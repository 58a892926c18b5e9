//! # ledgerview-core
//!
//! Reactive join-and-present engine for live record views.
//!
//! Two independently updating streams of keyed records (a primary "left"
//! kind and a secondary "right" kind sharing a join key) are kept live by a
//! [`RecordStreamBinding`], left-joined into one composite per left record,
//! and presented through declarative list and detail views.
//!
//! ## Layers
//!
//! - **Primitives**: [`record`], [`collection`], [`join`], [`lazy`],
//!   [`reactive`]
//! - **Store boundary**: [`store`] (the [`RecordStore`] trait plus an
//!   in-process [`MemoryStore`])
//! - **Binding**: [`binding`] keeps left/right subscriptions consistent and
//!   publishes snapshot pairs
//! - **View models**: [`view_model`] shapes joined pairs into composites
//! - **Views**: [`fields`], [`view`] (list, detail, router), [`action`],
//!   and [`screen`] which ties them to a router
//!
//! ## Example
//!
//! ```rust,ignore
//! let builder = ViewModelBuilder::<BillsViewModel, _>::new(store);
//! let mut bills = builder.use_data();
//! let state = bills.settled().await;
//! let page = list_view.render("/bills", state.records());
//! ```

pub mod action;
pub mod binding;
pub mod collection;
pub mod config;
pub mod errors;
pub mod fields;
pub mod join;
pub mod lazy;
pub mod reactive;
pub mod record;
pub mod screen;
pub mod store;
pub mod view;
pub mod view_model;

pub use action::{submit_action, ActionDescriptor, Message};
pub use binding::{BindingSnapshot, BindingStatus, RecordStreamBinding, ViewQuery};
pub use collection::KeyedCollection;
pub use config::ViewsConfig;
pub use errors::{ErrorCategory, Result, StoreError, ViewError};
pub use fields::{FieldDeclaration, FieldShape, RenderedField};
pub use join::{left_join, JoinedPair};
pub use lazy::{map_iter, LazyMap};
pub use reactive::KeyedMemo;
pub use record::{JoinKey, Record, RecordId, RecordKind};
pub use screen::{Page, TabularScreen};
#[cfg(feature = "memory-store")]
pub use store::MemoryStore;
pub use store::{ActionOutcome, ActionPayload, LiveQuery, LiveState, RecordQuery, RecordStore};
pub use view::{
    DetailOutcome, DetailView, ListView, RenderedDetail, RenderedList, ResolvedRoute, RouteMatch,
    ViewRouter,
};
pub use view_model::{compose, RecordPair, ViewData, ViewModel, ViewModelBuilder, ViewState};
