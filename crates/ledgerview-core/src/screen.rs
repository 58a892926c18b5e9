//! # Tabular Screen
//!
//! Binds a [`ViewRouter`], a [`ListView`], a [`DetailView`] and a
//! [`ViewModelBuilder`] into one navigable screen.
//!
//! The screen owns the lifetime of the active view's data: navigating from
//! the list to a detail drops the list binding and starts a single-record
//! binding. Navigating between two details re-targets the existing binding,
//! so the newest identifier always wins.

use std::fmt;

use crate::binding::ViewQuery;
use crate::errors::ViewError;
use crate::store::RecordStore;
use crate::view::{
    DetailOutcome, DetailView, ListView, RenderedDetail, RenderedList, ResolvedRoute, RouteMatch,
    ViewRouter,
};
use crate::view_model::{ViewData, ViewModel, ViewModelBuilder, ViewState};

/// What the screen currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    /// The list view
    List(RenderedList),
    /// One record's detail view
    Detail(RenderedDetail),
    /// Detail view with no matching record
    Empty,
    /// Waiting for the first consistent snapshot
    Loading,
    /// The active binding failed
    Failed(ViewError),
    /// The detail view asked to navigate to its root
    Redirect {
        /// Target path
        to: String,
    },
    /// No route matched the path
    NotFound {
        /// Path that was requested
        path: String,
    },
}

enum ActiveView<M: ViewModel> {
    List {
        route: RouteMatch,
        data: ViewData<M>,
    },
    Detail {
        route: RouteMatch,
        data: ViewData<M>,
    },
    Unmatched {
        path: String,
    },
}

/// A list screen with a linked detail screen.
pub struct TabularScreen<M: ViewModel, S> {
    router: ViewRouter,
    list: ListView<M::Composite>,
    detail: DetailView<M::Composite>,
    builder: ViewModelBuilder<M, S>,
    active: ActiveView<M>,
}

impl<M: ViewModel, S: RecordStore> TabularScreen<M, S> {
    /// Assemble a screen. Nothing is bound until the first navigation.
    pub fn new(
        router: ViewRouter,
        list: ListView<M::Composite>,
        detail: DetailView<M::Composite>,
        builder: ViewModelBuilder<M, S>,
    ) -> Self {
        Self {
            router,
            list,
            detail,
            builder,
            active: ActiveView::Unmatched {
                path: String::new(),
            },
        }
    }

    /// The screen's router.
    pub fn router(&self) -> &ViewRouter {
        &self.router
    }

    /// The view model builder (and through it, the store).
    pub fn builder(&self) -> &ViewModelBuilder<M, S> {
        &self.builder
    }

    /// Update the list view's search text.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.list.set_search(text);
    }

    /// Navigate to `path`. Returns `false` if no route matched.
    ///
    /// Must be called from within a tokio runtime.
    pub fn navigate(&mut self, path: &str) -> bool {
        let Some(resolved) = self.router.resolve(path) else {
            tracing::debug!(path, "No route for path");
            self.active = ActiveView::Unmatched {
                path: path.to_string(),
            };
            return false;
        };

        match resolved {
            ResolvedRoute::Detail { id, route } => {
                if let ActiveView::Detail { route: current, data } = &mut self.active {
                    data.set_query(ViewQuery::Single(id));
                    *current = route;
                } else {
                    self.active = ActiveView::Detail {
                        route,
                        data: self.builder.use_single(id),
                    };
                }
            }
            ResolvedRoute::List { route } => {
                if let ActiveView::List { route: current, .. } = &mut self.active {
                    *current = route;
                } else {
                    self.active = ActiveView::List {
                        route,
                        data: self.builder.use_data(),
                    };
                }
            }
        }
        true
    }

    /// Wait until the active view's query has settled.
    pub async fn settle(&mut self) {
        match &mut self.active {
            ActiveView::List { data, .. } | ActiveView::Detail { data, .. } => {
                data.settled().await;
            }
            ActiveView::Unmatched { .. } => {}
        }
    }

    /// Render the active view from the latest snapshot. Never awaits.
    pub fn render(&self) -> Page {
        match &self.active {
            ActiveView::Unmatched { path } => Page::NotFound { path: path.clone() },
            ActiveView::List { route, data } => match data.state() {
                ViewState::Loading => Page::Loading,
                ViewState::Failed(err) => Page::Failed(err),
                ViewState::Ready(records) => Page::List(self.list.render(&route.url, &records)),
            },
            ActiveView::Detail { route, data } => {
                let state = data.state();
                let records = match &state {
                    ViewState::Failed(err) => return Page::Failed(err.clone()),
                    ViewState::Loading if route.is_exact => return Page::Loading,
                    other => other.records(),
                };
                match self.detail.render(route, records) {
                    DetailOutcome::Content(detail) => Page::Detail(detail),
                    DetailOutcome::Empty => Page::Empty,
                    DetailOutcome::Redirect { to } => Page::Redirect { to },
                }
            }
        }
    }

    /// Navigate, wait for data and render, following one redirect.
    pub async fn show(&mut self, path: &str) -> Page {
        if !self.navigate(path) {
            return self.render();
        }
        self.settle().await;
        match self.render() {
            Page::Redirect { to } => {
                tracing::debug!(from = path, %to, "Following redirect");
                self.navigate(&to);
                self.settle().await;
                self.render()
            }
            page => page,
        }
    }
}

impl<M: ViewModel, S> fmt::Debug for TabularScreen<M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = match &self.active {
            ActiveView::List { route, .. } | ActiveView::Detail { route, .. } => route.url.as_str(),
            ActiveView::Unmatched { path } => path.as_str(),
        };
        f.debug_struct("TabularScreen")
            .field("router", &self.router)
            .field("active", &active)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::List(list) => write!(f, "{list}"),
            Page::Detail(detail) => write!(f, "{detail}"),
            Page::Empty => Ok(()),
            Page::Loading => writeln!(f, "Loading..."),
            Page::Failed(err) => {
                writeln!(f, "{}: {err}", err.category())?;
                writeln!(f, "{}", err.category().resolution_hint())
            }
            Page::Redirect { to } => writeln!(f, "Redirect to {to}"),
            Page::NotFound { path } => writeln!(f, "No view at {path}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{opt_text, FieldDeclaration};
    use crate::record::{JoinKey, RecordKind};
    use crate::store::MemoryStore;
    use crate::view_model::RecordPair;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    struct Books;
    struct Loans;

    impl RecordKind for Books {
        const NAME: &'static str = "Book";
        type Payload = (String, String);

        fn join_key(payload: &Self::Payload) -> JoinKey {
            JoinKey::new(payload.0.clone())
        }
    }

    impl RecordKind for Loans {
        const NAME: &'static str = "Loan";
        type Payload = (String, String);

        fn join_key(payload: &Self::Payload) -> JoinKey {
            JoinKey::new(payload.0.clone())
        }
    }

    #[derive(Debug, Clone)]
    struct Shelf {
        id: String,
        title: String,
        borrower: Option<String>,
    }

    struct Library;

    impl ViewModel for Library {
        type Left = Books;
        type Right = Loans;
        type Composite = Shelf;

        fn shape(pair: RecordPair<Self>) -> Shelf {
            Shelf {
                id: pair.left.record_id.to_string(),
                title: pair.left.payload.1,
                borrower: pair.right.map(|loan| loan.payload.1),
            }
        }
    }

    fn screen(store: MemoryStore) -> TabularScreen<Library, MemoryStore> {
        let fields = || {
            vec![
                FieldDeclaration::new("Title", |s: &Shelf| s.title.clone()),
                FieldDeclaration::new("Borrower", |s: &Shelf| opt_text(s.borrower.as_ref())),
            ]
        };
        TabularScreen::new(
            ViewRouter::new("/books", "bookId").unwrap(),
            ListView::new("Books", fields(), |s: &Shelf| s.id.clone(), |s: &Shelf| s.id.clone()),
            DetailView::new("Book", fields(), |s: &Shelf| s.id.clone()),
            ViewModelBuilder::new(Arc::new(store)),
        )
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.register::<Loans>().unwrap();
        store
            .insert_with_id::<Books>("b1", ("isbn1".into(), "Dune".into()))
            .unwrap();
        store
            .insert_with_id::<Books>("b2", ("isbn2".into(), "Emma".into()))
            .unwrap();
        store
            .insert::<Loans>(("isbn1".into(), "ada".into()))
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_list_then_detail() {
        let mut screen = screen(store());

        let page = screen.show("/books").await;
        assert_matches!(&page, Page::List(list) => {
            assert_eq!(list.column("Borrower"), vec!["ada", ""]);
            assert_eq!(list.rows[1].url, "/books/b2");
        });

        let page = screen.show("/books/b1").await;
        assert_matches!(page, Page::Detail(detail) => {
            assert_eq!(detail.value("Title"), Some("Dune"));
        });
    }

    #[tokio::test]
    async fn test_unknown_detail_renders_empty() {
        let mut screen = screen(store());
        assert_eq!(screen.show("/books/b404").await, Page::Empty);
    }

    #[tokio::test]
    async fn test_detail_sub_path_redirects_once() {
        let mut screen = screen(store());
        assert_matches!(screen.show("/books/b2/loans").await, Page::Detail(detail) => {
            assert_eq!(detail.key, "b2");
        });
    }

    #[tokio::test]
    async fn test_unmatched_path() {
        let mut screen = screen(store());
        assert!(!screen.navigate("/authors"));
        assert_eq!(
            screen.render(),
            Page::NotFound {
                path: "/authors".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_detail_to_detail_retargets() {
        let mut screen = screen(store());
        screen.show("/books/b1").await;
        let page = screen.show("/books/b2").await;
        assert_matches!(page, Page::Detail(detail) => assert_eq!(detail.key, "b2"));
    }
}
