//! # View Router
//!
//! Minimal path matcher for a list view and its detail view.
//!
//! Routes are matched by segment prefix, so `/bills/:billId` also matches
//! `/bills/#1/extra` with `is_exact == false`. The detail route is tried
//! before the list route so an identifier segment never falls through to the
//! list.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::ViewError;
use crate::record::RecordId;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
}

/// A parsed route pattern such as `/bills/:billId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a pattern. Segments starting with `:` are parameters.
    pub fn parse(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Static(segment.to_string()),
            })
            .collect();
        Self {
            source: pattern.to_string(),
            segments,
        }
    }

    /// Pattern text as given.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match `path` against this pattern by segment prefix.
    pub fn matches(&self, path: &str) -> Option<RouteMatch> {
        let parts: Vec<&str> = split_path(path).collect();
        if parts.len() < self.segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Static(expected) if expected == part => {}
                Segment::Static(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), (*part).to_string());
                }
            }
        }

        let matched = &parts[..self.segments.len()];
        Some(RouteMatch {
            pattern: self.source.clone(),
            url: format!("/{}", matched.join("/")),
            params,
            is_exact: parts.len() == self.segments.len(),
        })
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Check that `path` is `/` or an absolute path without a trailing `/`.
pub fn is_valid_base_path(path: &str) -> bool {
    path == "/" || (path.starts_with('/') && !path.ends_with('/'))
}

/// Append one segment to `base`, which may be the root `/`.
pub fn join_path(base: &str, segment: &str) -> String {
    format!("{}/{segment}", base.trim_end_matches('/'))
}

/// Result of matching a path against a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    /// Pattern that matched
    pub pattern: String,
    /// Matched portion of the path (the route's own root)
    pub url: String,
    /// Captured parameters
    pub params: BTreeMap<String, String>,
    /// `false` if the path continues past the route
    pub is_exact: bool,
}

impl RouteMatch {
    /// Captured parameter value.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Outcome of resolving a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRoute {
    /// Detail view for one record
    Detail {
        /// Identifier taken from the path parameter
        id: RecordId,
        /// Route match
        route: RouteMatch,
    },
    /// List view
    List {
        /// Route match
        route: RouteMatch,
    },
}

/// Mounts a list view at `base` and its detail view at `base/:param`.
#[derive(Debug, Clone)]
pub struct ViewRouter {
    base_path: String,
    param: String,
    detail: RoutePattern,
    list: RoutePattern,
}

impl ViewRouter {
    /// Create a router.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Config` if `base_path` is not absolute, ends with
    /// `/` (other than the root `/` itself), or `param` is empty.
    pub fn new(base_path: impl Into<String>, param: impl Into<String>) -> Result<Self, ViewError> {
        let base_path = base_path.into();
        let param = param.into();
        if !is_valid_base_path(&base_path) {
            return Err(ViewError::config(format!(
                "route base path must start with '/' and not end with '/': {base_path:?}"
            )));
        }
        if param.is_empty() || param.contains('/') {
            return Err(ViewError::config(format!("invalid route parameter: {param:?}")));
        }

        Ok(Self {
            detail: RoutePattern::parse(&join_path(&base_path, &format!(":{param}"))),
            list: RoutePattern::parse(&base_path),
            base_path,
            param,
        })
    }

    /// Base path the list is mounted at.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Detail route parameter name.
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Resolve a path: detail first, then list.
    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute> {
        if let Some(route) = self.detail.matches(path) {
            let id = RecordId::new(route.param(&self.param)?);
            return Some(ResolvedRoute::Detail { id, route });
        }
        self.list
            .matches(path)
            .filter(|route| route.is_exact)
            .map(|route| ResolvedRoute::List { route })
    }

    /// URL of the detail view for `id`.
    pub fn detail_url(&self, id: &RecordId) -> String {
        join_path(&self.base_path, id.as_str())
    }

    /// URL of the list view.
    pub fn list_url(&self) -> &str {
        &self.base_path
    }
}

impl fmt::Display for ViewRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.detail.as_str(), self.list.as_str())
    }
}
