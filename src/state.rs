//! Synchronized Replicated State
//!
//! Key-value state replicated across all participants by the agreement
//! engine. Round tasks only read it; it is replaced wholesale by the
//! value returned from `end_block`, never mutated in place.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Key under which the agreed participant set is stored
pub const ALL_PARTICIPANTS_KEY: &str = "all_participants";

/// Replicated key-value state shared across participants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynchronizedData {
    db: BTreeMap<String, Value>,
}

impl SynchronizedData {
    /// Create empty synchronized data
    pub fn new() -> Self {
        Self::default()
    }

    /// Create synchronized data seeded with a participant set
    pub fn with_participants<I, S>(participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list: Vec<Value> = participants
            .into_iter()
            .map(|p| Value::String(p.into()))
            .collect();

        let mut db = BTreeMap::new();
        db.insert(ALL_PARTICIPANTS_KEY.to_string(), Value::Array(list));
        Self { db }
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.db.get(key)
    }

    /// Return a copy with one key replaced. The original is untouched;
    /// transitions install the copy atomically.
    pub fn with(&self, key: impl Into<String>, value: Value) -> Self {
        let mut next = self.clone();
        next.db.insert(key.into(), value);
        next
    }

    /// Get the agreed participant set.
    ///
    /// An unset or empty set is a fatal precondition violation: agreement
    /// thresholds are undefined without participants.
    pub fn participants(&self) -> Result<BTreeSet<String>> {
        let raw = self
            .db
            .get(ALL_PARTICIPANTS_KEY)
            .ok_or(Error::EmptyParticipantSet)?;

        let list = raw.as_array().ok_or(Error::EmptyParticipantSet)?;

        let participants: BTreeSet<String> = list
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();

        if participants.is_empty() {
            return Err(Error::EmptyParticipantSet);
        }

        Ok(participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participants_present() {
        let data = SynchronizedData::with_participants(["a", "b", "c"]);
        let participants = data.participants().unwrap();
        assert_eq!(participants.len(), 3);
        assert!(participants.contains("b"));
    }

    #[test]
    fn test_participants_unset_is_fatal() {
        let data = SynchronizedData::new();
        let err = data.participants().unwrap_err();
        assert!(matches!(err, Error::EmptyParticipantSet));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_participants_empty_is_fatal() {
        let data = SynchronizedData::with_participants(Vec::<String>::new());
        assert!(matches!(
            data.participants().unwrap_err(),
            Error::EmptyParticipantSet
        ));
    }

    #[test]
    fn test_with_does_not_mutate_original() {
        let data = SynchronizedData::with_participants(["a"]);
        let next = data.with("cycle", serde_json::json!(7));

        assert!(data.get("cycle").is_none());
        assert_eq!(next.get("cycle"), Some(&serde_json::json!(7)));
        assert!(next.participants().is_ok());
    }
}
