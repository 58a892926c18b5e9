//! # Generic Detail View
//!
//! Renders exactly one composite record as grouped `(label, value)` pairs
//! with the actions its renderer offers. A detail view owns exactly one
//! route: any deeper path redirects back to the route's root.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use super::list::RecordFn;
use super::router::RouteMatch;
use crate::action::ActionDescriptor;
use crate::fields::{FieldDeclaration, FieldShape, RenderedField};

/// Produces the actions offered on a record.
pub type ActionRenderer<T> = Arc<dyn Fn(&T) -> Vec<ActionDescriptor> + Send + Sync>;

/// A declarative single-record view over composites of type `T`.
pub struct DetailView<T> {
    title: String,
    groups: Vec<Vec<FieldDeclaration<T>>>,
    key: RecordFn<T>,
    actions: ActionRenderer<T>,
    empty_value: String,
}

impl<T: 'static> DetailView<T> {
    /// Declare a detail view. `fields` may be flat or grouped.
    pub fn new<K>(title: impl Into<String>, fields: impl FieldShape<T>, key: K) -> Self
    where
        K: Fn(&T) -> String + Send + Sync + 'static,
    {
        let groups = fields.groups().into_iter().map(<[_]>::to_vec).collect();
        Self {
            title: title.into(),
            groups,
            key: Arc::new(key),
            actions: Arc::new(no_actions::<T>),
            empty_value: String::new(),
        }
    }

    /// Attach the action renderer.
    #[must_use]
    pub fn with_actions<F>(mut self, renderer: F) -> Self
    where
        F: Fn(&T) -> Vec<ActionDescriptor> + Send + Sync + 'static,
    {
        self.actions = Arc::new(renderer);
        self
    }

    /// Set the text shown for empty field values.
    #[must_use]
    pub fn with_empty_value(mut self, empty: impl Into<String>) -> Self {
        self.empty_value = empty.into();
        self
    }

    /// View title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Render the first of `records` for `route`.
    pub fn render(&self, route: &RouteMatch, records: &[T]) -> DetailOutcome {
        if !route.is_exact {
            tracing::debug!(view = %self.title, to = %route.url, "Redirecting detail sub-path");
            return DetailOutcome::Redirect {
                to: route.url.clone(),
            };
        }
        let Some(record) = records.first() else {
            return DetailOutcome::Empty;
        };

        let groups = self
            .groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|field| field.render(record, &self.empty_value))
                    .collect()
            })
            .collect();

        DetailOutcome::Content(RenderedDetail {
            title: self.title.clone(),
            subtitle: String::new(),
            key: (self.key)(record),
            actions: (self.actions)(record),
            groups,
        })
    }
}

fn no_actions<T>(_: &T) -> Vec<ActionDescriptor> {
    Vec::new()
}

impl<T> fmt::Debug for DetailView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailView")
            .field("title", &self.title)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

/// Result of rendering a detail view.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    /// The record's content
    Content(RenderedDetail),
    /// No record: render nothing
    Empty,
    /// Navigated below the view's root
    Redirect {
        /// Root path to navigate to
        to: String,
    },
}

/// A rendered detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDetail {
    /// View title
    pub title: String,
    /// Subtitle (always empty for now)
    pub subtitle: String,
    /// Record key
    pub key: String,
    /// Actions offered on the record
    pub actions: Vec<ActionDescriptor>,
    /// Field groups in declaration order
    pub groups: Vec<Vec<RenderedField>>,
}

impl RenderedDetail {
    /// Value of a field by label, searching all groups.
    pub fn value(&self, label: &str) -> Option<&str> {
        self.groups
            .iter()
            .flatten()
            .find(|field| field.label == label)
            .map(|field| field.value.as_str())
    }

    /// Action by choice name.
    pub fn action(&self, choice: &str) -> Option<&ActionDescriptor> {
        self.actions.iter().find(|action| action.choice == choice)
    }
}

impl fmt::Display for RenderedDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        if !self.subtitle.is_empty() {
            writeln!(f, "{}", self.subtitle)?;
        }
        for action in &self.actions {
            writeln!(f, "[{}]", action.button_title)?;
        }

        let width = self
            .groups
            .iter()
            .flatten()
            .map(|field| field.label.chars().count())
            .max()
            .unwrap_or(0);
        for group in &self.groups {
            writeln!(f, "{}", "-".repeat(width + 2))?;
            for field in group {
                writeln!(f, "{:<width$}  {}", field.label, field.value)?;
            }
        }
        Ok(())
    }
}
