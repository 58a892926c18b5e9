//! Record-scoped actions.
//!
//! Detail views know nothing about actions beyond the descriptors their
//! action renderer returns. A descriptor carries the choice to exercise and
//! the display text for its button, confirmation prompt and success message;
//! [`submit_action`] sends it to the record store.

use serde::Serialize;

use crate::errors::{Result, StoreError, ViewError};
use crate::record::{RecordId, RecordKind};
use crate::store::{ActionOutcome, ActionPayload, RecordStore};

/// Title and body of a prompt or notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Heading
    pub title: String,
    /// Body text
    pub content: String,
}

impl Message {
    /// Create a message.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// An action offered on one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionDescriptor {
    /// Record kind the choice belongs to
    pub kind: &'static str,
    /// Target record
    pub record_id: RecordId,
    /// Choice name
    pub choice: String,
    /// Text of the button that opens the prompt
    pub button_title: String,
    /// Text of the confirm button inside the prompt
    pub submit_title: String,
    /// Confirmation prompt
    pub prompt: Message,
    /// Shown after a successful submission
    pub success: Message,
    /// Initial choice argument
    pub argument: serde_json::Value,
}

impl ActionDescriptor {
    /// Describe `choice` on a record of kind `K`. Titles default to the
    /// choice name.
    pub fn new<K: RecordKind>(record_id: RecordId, choice: impl Into<String>) -> Self {
        let choice = choice.into();
        Self {
            kind: K::NAME,
            record_id,
            button_title: choice.clone(),
            submit_title: choice.clone(),
            prompt: Message::new(choice.clone(), ""),
            success: Message::new(choice.clone(), ""),
            choice,
            argument: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the button title.
    #[must_use]
    pub fn with_button_title(mut self, title: impl Into<String>) -> Self {
        self.button_title = title.into();
        self
    }

    /// Set the confirm button title.
    #[must_use]
    pub fn with_submit_title(mut self, title: impl Into<String>) -> Self {
        self.submit_title = title.into();
        self
    }

    /// Set the confirmation prompt.
    #[must_use]
    pub fn with_prompt(mut self, title: impl Into<String>, content: impl Into<String>) -> Self {
        self.prompt = Message::new(title, content);
        self
    }

    /// Set the success message.
    #[must_use]
    pub fn with_success(mut self, title: impl Into<String>, content: impl Into<String>) -> Self {
        self.success = Message::new(title, content);
        self
    }

    /// Set the initial choice argument.
    #[must_use]
    pub fn with_argument(mut self, argument: serde_json::Value) -> Self {
        self.argument = argument;
        self
    }

    /// Store payload for this action.
    pub fn payload(&self) -> ActionPayload {
        ActionPayload::new(self.choice.clone(), self.argument.clone())
    }
}

/// Submit `descriptor` to the store as an action on kind `K`.
///
/// # Errors
///
/// Returns `ViewError::Action` if the descriptor targets another kind or the
/// store rejects the action.
pub async fn submit_action<K, S>(store: &S, descriptor: &ActionDescriptor) -> Result<ActionOutcome>
where
    K: RecordKind,
    S: RecordStore,
{
    if descriptor.kind != K::NAME {
        return Err(ViewError::action(
            K::NAME,
            descriptor.choice.clone(),
            StoreError::unknown_kind(descriptor.kind),
        ));
    }

    match store
        .submit_action::<K>(&descriptor.record_id, descriptor.payload())
        .await
    {
        Ok(outcome) => {
            tracing::info!(
                kind = K::NAME,
                choice = %descriptor.choice,
                record_id = %descriptor.record_id,
                created = outcome.created.len(),
                "Action submitted"
            );
            Ok(outcome)
        }
        Err(err) => {
            tracing::warn!(
                kind = K::NAME,
                choice = %descriptor.choice,
                record_id = %descriptor.record_id,
                error = %err,
                "Action failed"
            );
            Err(ViewError::action(K::NAME, descriptor.choice.clone(), err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::JoinKey;
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;

    struct Tickets;
    struct Invoices;

    impl RecordKind for Tickets {
        const NAME: &'static str = "Ticket";
        type Payload = String;

        fn join_key(payload: &String) -> JoinKey {
            JoinKey::new(payload.clone())
        }
    }

    impl RecordKind for Invoices {
        const NAME: &'static str = "Invoice";
        type Payload = String;

        fn join_key(payload: &String) -> JoinKey {
            JoinKey::new(payload.clone())
        }
    }

    #[test]
    fn test_descriptor_defaults_to_choice_name() {
        let action = ActionDescriptor::new::<Tickets>("#1".into(), "Close");
        assert_eq!(action.button_title, "Close");
        assert_eq!(action.submit_title, "Close");
        assert_eq!(action.kind, "Ticket");
        assert_eq!(action.payload().choice, "Close");
    }

    #[tokio::test]
    async fn test_submit_routes_to_store_handler() {
        let store = MemoryStore::new();
        let id = store.insert::<Tickets>("t1".to_string()).unwrap();
        store.on_action::<Tickets, _>("Close", |_, _, payload| {
            Ok(ActionOutcome {
                result: payload.argument.clone(),
                ..ActionOutcome::default()
            })
        });

        let action = ActionDescriptor::new::<Tickets>(id, "Close")
            .with_argument(serde_json::json!({ "reason": "done" }));
        let outcome = submit_action::<Tickets, _>(&store, &action).await.unwrap();
        assert_eq!(outcome.result["reason"], "done");
    }

    #[tokio::test]
    async fn test_submit_rejects_kind_mismatch() {
        let store = MemoryStore::new();
        let action = ActionDescriptor::new::<Invoices>("#1".into(), "Close");
        let err = submit_action::<Tickets, _>(&store, &action).await.unwrap_err();
        assert_matches!(
            err,
            ViewError::Action {
                source: StoreError::UnknownKind { .. },
                ..
            }
        );
    }

    #[tokio::test]
    async fn test_store_rejection_is_action_error() {
        let store = MemoryStore::new();
        let id = store.insert::<Tickets>("t1".to_string()).unwrap();
        let action = ActionDescriptor::new::<Tickets>(id, "Reopen");

        let err = submit_action::<Tickets, _>(&store, &action).await.unwrap_err();
        assert_eq!(err.category(), crate::errors::ErrorCategory::Action);
    }
}
