//! Categorized view-layer errors
//!
//! Two error types cross module boundaries:
//! - [`StoreError`] is what a [`RecordStore`](crate::store::RecordStore) reports
//! - [`ViewError`] is what the engine surfaces to a view, tagged with the
//!   record kind and operation that produced it
//!
//! Expected absence (no matching receipt, unknown detail identifier) is never
//! an error; it is an `Option` all the way through.

use std::fmt;

// ============================================================================
// Error Categories
// ============================================================================

/// High-level error categories for display and retry decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Record store failures (subscriptions and fetches)
    Store,
    /// Action submissions rejected or failed
    Action,
    /// Configuration errors (correctable by modifying settings)
    Config,
}

impl ErrorCategory {
    /// Check if this error category is likely transient.
    ///
    /// The engine never retries on its own; this is a hint for the caller.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store)
    }

    /// Get a short label for this category.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Store => "Store",
            Self::Action => "Action",
            Self::Config => "Config",
        }
    }

    /// Get a hint for the user on how to resolve this category of error.
    #[must_use]
    pub fn resolution_hint(&self) -> &'static str {
        match self {
            Self::Store => "The record store could not be reached; try again later",
            Self::Action => "The action was not accepted by the record store",
            Self::Config => "Review your configuration settings",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Store Errors
// ============================================================================

/// Error reported by the record store boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not serve the request
    #[error("Record store unavailable: {reason}")]
    Unavailable {
        /// Why the store is unavailable
        reason: String,
    },

    /// The store does not know this record kind
    #[error("Unknown record kind: {kind}")]
    UnknownKind {
        /// Record kind name
        kind: String,
    },

    /// A record addressed by id does not exist (only used for actions; fetches
    /// report absence as `None`)
    #[error("Record not found: {kind} {record_id}")]
    NotFound {
        /// Record kind name
        kind: String,
        /// Identifier that was not found
        record_id: String,
    },

    /// The store refused an action
    #[error("Action {choice} rejected: {reason}")]
    ActionRejected {
        /// Choice name
        choice: String,
        /// Rejection reason
        reason: String,
    },

    /// Internal store error
    #[error("Internal store error: {reason}")]
    Internal {
        /// Error description
        reason: String,
    },
}

impl StoreError {
    /// Create an unavailable error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Create an unknown kind error
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::UnknownKind { kind: kind.into() }
    }

    /// Create a not found error
    pub fn not_found(kind: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            record_id: record_id.into(),
        }
    }

    /// Create an action rejected error
    pub fn action_rejected(choice: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ActionRejected {
            choice: choice.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }
}

// ============================================================================
// View Errors
// ============================================================================

/// Error surfaced by the engine to a view.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    /// A live subscription failed or could not be opened
    #[error("Subscription to {kind} failed: {source}")]
    Subscription {
        /// Record kind name
        kind: &'static str,
        /// Underlying store error
        source: StoreError,
    },

    /// An override fetch-by-id failed (absence is not a failure)
    #[error("Fetching {kind} failed: {source}")]
    Fetch {
        /// Record kind name
        kind: &'static str,
        /// Underlying store error
        source: StoreError,
    },

    /// An action submission failed
    #[error("Action {choice} on {kind} failed: {source}")]
    Action {
        /// Record kind name
        kind: &'static str,
        /// Choice name
        choice: String,
        /// Underlying store error
        source: StoreError,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error description
        message: String,
    },
}

impl ViewError {
    /// Create a subscription error
    pub fn subscription(kind: &'static str, source: StoreError) -> Self {
        Self::Subscription { kind, source }
    }

    /// Create a fetch error
    pub fn fetch(kind: &'static str, source: StoreError) -> Self {
        Self::Fetch { kind, source }
    }

    /// Create an action error
    pub fn action(kind: &'static str, choice: impl Into<String>, source: StoreError) -> Self {
        Self::Action {
            kind,
            choice: choice.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get the category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Subscription { .. } | Self::Fetch { .. } => ErrorCategory::Store,
            Self::Action { .. } => ErrorCategory::Action,
            Self::Config { .. } => ErrorCategory::Config,
        }
    }
}

/// Standard Result type for view operations
pub type Result<T> = std::result::Result<T, ViewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_error_categories() {
        let store = StoreError::unavailable("offline");
        assert_eq!(
            ViewError::subscription("Bill", store.clone()).category(),
            ErrorCategory::Store
        );
        assert_eq!(
            ViewError::fetch("Bill", store.clone()).category(),
            ErrorCategory::Store
        );
        assert_eq!(
            ViewError::action("Bill", "Pay", store).category(),
            ErrorCategory::Action
        );
        assert_eq!(ViewError::config("bad").category(), ErrorCategory::Config);
    }

    #[test]
    fn test_only_store_errors_are_transient() {
        assert!(ErrorCategory::Store.is_transient());
        assert!(!ErrorCategory::Action.is_transient());
        assert!(!ErrorCategory::Config.is_transient());
    }

    #[test]
    fn test_error_display_includes_source() {
        let err = ViewError::subscription("PaymentReceipt", StoreError::unavailable("offline"));
        let text = err.to_string();
        assert!(text.contains("PaymentReceipt"));
        assert!(text.contains("offline"));
    }
}
