//! # Views
//!
//! Declarative list and detail views plus the router that mounts them.
//! Views are pure renderers: they take composite records and produce
//! rendered structures, and never talk to the record store themselves.

pub mod detail;
pub mod list;
pub mod router;

pub use detail::{ActionRenderer, DetailOutcome, DetailView, RenderedDetail};
pub use list::{ListView, RenderedList, RenderedRow, SearchPredicate};
pub use router::{ResolvedRoute, RouteMatch, RoutePattern, ViewRouter};
