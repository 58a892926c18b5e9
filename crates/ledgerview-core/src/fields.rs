//! Field declarations shared by list and detail views.
//!
//! A [`FieldDeclaration`] is a label plus a getter that turns a composite
//! record into display text. Getters never fail: absent data renders as an
//! empty string.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

type Getter<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// A labelled field extractor.
pub struct FieldDeclaration<T> {
    label: String,
    getter: Getter<T>,
}

impl<T> FieldDeclaration<T> {
    /// Declare a field.
    pub fn new<F>(label: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            getter: Arc::new(getter),
        }
    }

    /// Column or row label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Extract the display value.
    pub fn value(&self, record: &T) -> String {
        (self.getter)(record)
    }

    /// Render the field, substituting `empty` for an empty value.
    pub fn render(&self, record: &T, empty: &str) -> RenderedField {
        let value = self.value(record);
        RenderedField {
            label: self.label.clone(),
            value: if value.is_empty() {
                empty.to_string()
            } else {
                value
            },
        }
    }
}

impl<T> Clone for FieldDeclaration<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            getter: Arc::clone(&self.getter),
        }
    }
}

impl<T> fmt::Debug for FieldDeclaration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDeclaration")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// A rendered `(label, value)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedField {
    /// Field label
    pub label: String,
    /// Display value (possibly empty)
    pub value: String,
}

/// Layout of field declarations: flat for lists, grouped for detail views.
pub trait FieldShape<T> {
    /// Fields split into display groups.
    fn groups(&self) -> Vec<&[FieldDeclaration<T>]>;
}

impl<T> FieldShape<T> for Vec<FieldDeclaration<T>> {
    fn groups(&self) -> Vec<&[FieldDeclaration<T>]> {
        vec![self.as_slice()]
    }
}

impl<T> FieldShape<T> for Vec<Vec<FieldDeclaration<T>>> {
    fn groups(&self) -> Vec<&[FieldDeclaration<T>]> {
        self.iter().map(Vec::as_slice).collect()
    }
}

// ─── Getter Helpers ──────────────────────────────────────────

/// Display any value.
pub fn text<D: fmt::Display>(value: D) -> String {
    value.to_string()
}

/// Display an optional value; absent renders as `""`.
pub fn opt_text<D: fmt::Display>(value: Option<D>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// `"Yes"` or `"No"`.
pub fn yes_no(value: bool) -> String {
    let text = if value { "Yes" } else { "No" };
    text.to_string()
}
