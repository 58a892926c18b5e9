//! # Records
//!
//! Records are immutable domain objects owned by the record store. The view
//! layer only ever holds clones of them.
//!
//! A [`RecordKind`] ties together a stable kind name, a payload type, and the
//! join key extractor used to correlate one kind with another.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Debug;

/// Opaque, store-assigned record identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap a store-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Domain value shared by two record kinds (e.g. a payment identifier).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinKey(String);

impl JoinKey {
    /// Wrap a join key value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JoinKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A kind of record the store can serve.
///
/// Implemented on zero-sized marker types so that store operations can be
/// selected by kind at compile time (`store.subscribe::<Bills>(..)`).
pub trait RecordKind: Send + Sync + 'static {
    /// Stable kind name used by the store and in diagnostics.
    const NAME: &'static str;

    /// Domain payload carried by records of this kind.
    type Payload: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Extract the join key from a payload.
    fn join_key(payload: &Self::Payload) -> JoinKey;
}

/// An immutable record: a store-assigned id plus a domain payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<P> {
    /// Store-assigned identifier
    pub record_id: RecordId,
    /// Domain fields
    pub payload: P,
}

impl<P> Record<P> {
    /// Create a record.
    pub fn new(record_id: impl Into<RecordId>, payload: P) -> Self {
        Self {
            record_id: record_id.into(),
            payload,
        }
    }
}

impl<P: Clone + Debug + PartialEq + Send + Sync + 'static> Record<P> {
    /// Join key of this record under kind `K`.
    pub fn join_key<K>(&self) -> JoinKey
    where
        K: RecordKind<Payload = P>,
    {
        K::join_key(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Notes;

    impl RecordKind for Notes {
        const NAME: &'static str = "Note";
        type Payload = (String, u32);

        fn join_key(payload: &Self::Payload) -> JoinKey {
            JoinKey::new(payload.0.clone())
        }
    }

    #[test]
    fn test_record_join_key_uses_kind_extractor() {
        let record = Record::new("#1", ("k1".to_string(), 7));
        assert_eq!(record.join_key::<Notes>(), JoinKey::from("k1"));
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&RecordId::new("#abc")).unwrap();
        assert_eq!(json, "\"#abc\"");
    }
}
