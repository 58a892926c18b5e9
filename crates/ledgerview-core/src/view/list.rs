//! # Generic List View
//!
//! Renders composite records as a searchable table: a header row of field
//! labels plus a trailing navigation column, then one row per record that
//! passes the search predicate. Each row links to the record's detail URL.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::fields::FieldDeclaration;
use crate::view::router::join_path;

/// Per-record string extractor (row keys, item URLs).
pub type RecordFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Predicate over records, built from the live search text.
pub type SearchPredicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Builds a [`SearchPredicate`] from the current search text.
pub type SearchFactory<T> = Arc<dyn Fn(&str) -> SearchPredicate<T> + Send + Sync>;

/// Marker rendered in the navigation column.
pub const NAV_MARKER: &str = ">";

/// Default search box placeholder.
pub const DEFAULT_SEARCH_PLACEHOLDER: &str = "Search by name or insurance ID...";

/// A declarative list view over composite records of type `T`.
pub struct ListView<T> {
    title: String,
    fields: Vec<FieldDeclaration<T>>,
    key: RecordFn<T>,
    item_url: RecordFn<T>,
    search: Option<SearchFactory<T>>,
    search_text: String,
    search_placeholder: String,
    empty_value: String,
}

impl<T> ListView<T> {
    /// Declare a list view.
    pub fn new<K, U>(title: impl Into<String>, fields: Vec<FieldDeclaration<T>>, key: K, item_url: U) -> Self
    where
        K: Fn(&T) -> String + Send + Sync + 'static,
        U: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            title: title.into(),
            fields,
            key: Arc::new(key),
            item_url: Arc::new(item_url),
            search: None,
            search_text: String::new(),
            search_placeholder: DEFAULT_SEARCH_PLACEHOLDER.to_string(),
            empty_value: String::new(),
        }
    }

    /// Attach a search predicate factory. Without one every record passes.
    #[must_use]
    pub fn with_search<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str) -> SearchPredicate<T> + Send + Sync + 'static,
    {
        self.search = Some(Arc::new(factory));
        self
    }

    /// Set the search box placeholder.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.search_placeholder = placeholder.into();
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

    /// Field declarations in column order.
    pub fn fields(&self) -> &[FieldDeclaration<T>] {
        &self.fields
    }

    /// Current search text.
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Update the live search text.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    /// Render `records` with row URLs under `base_url`.
    pub fn render(&self, base_url: &str, records: &[T]) -> RenderedList {
        let predicate = self.search.as_ref().map(|factory| factory(&self.search_text));

        let mut headers: Vec<String> = self.fields.iter().map(|f| f.label().to_string()).collect();
        headers.push(String::new());

        let mut rows: IndexMap<String, RenderedRow> = IndexMap::with_capacity(records.len());
        let mut duplicate_keys = Vec::new();
        for record in records {
            if let Some(predicate) = &predicate {
                if !predicate(record) {
                    continue;
                }
            }

            let key = (self.key)(record);
            let mut cells: Vec<String> = self
                .fields
                .iter()
                .map(|field| field.render(record, &self.empty_value).value)
                .collect();
            cells.push(NAV_MARKER.to_string());
            let row = RenderedRow {
                key: key.clone(),
                url: join_path(base_url, &(self.item_url)(record)),
                cells,
            };

            if rows.insert(key.clone(), row).is_some() {
                tracing::warn!(view = %self.title, %key, "Duplicate row key in list view");
                duplicate_keys.push(key);
            }
        }

        RenderedList {
            title: self.title.clone(),
            search_placeholder: self.search_placeholder.clone(),
            search: self.search_text.clone(),
            headers,
            rows: rows.into_values().collect(),
            duplicate_keys,
        }
    }
}

impl<T> fmt::Debug for ListView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListView")
            .field("title", &self.title)
            .field("fields", &self.fields)
            .field("search_text", &self.search_text)
            .finish_non_exhaustive()
    }
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedRow {
    /// Row key
    pub key: String,
    /// Detail URL
    pub url: String,
    /// Cell values, ending with the navigation marker
    pub cells: Vec<String>,
}

/// A rendered list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedList {
    /// View title
    pub title: String,
    /// Search box placeholder
    pub search_placeholder: String,
    /// Current search text
    pub search: String,
    /// Column labels, ending with the (empty) navigation column
    pub headers: Vec<String>,
    /// Rows in record order
    pub rows: Vec<RenderedRow>,
    /// Keys seen more than once while rendering
    pub duplicate_keys: Vec<String>,
}

impl RenderedList {
    /// Cell text of a column by header label.
    pub fn column(&self, label: &str) -> Vec<&str> {
        let Some(index) = self.headers.iter().position(|h| h == label) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|row| row.cells.get(index).map(String::as_str))
            .collect()
    }
}

impl fmt::Display for RenderedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        if self.search.is_empty() {
            writeln!(f, "[{}]", self.search_placeholder)?;
        } else {
            writeln!(f, "[{}]", self.search)?;
        }

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(&row.cells) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        writeln!(f, "{}", line(self.headers.as_slice()))?;
        for row in &self.rows {
            writeln!(f, "{}    {}", line(row.cells.as_slice()), row.url)?;
        }
        Ok(())
    }
}
