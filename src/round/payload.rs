//! Round Payloads
//!
//! One participant's proposed contribution within a round. The collection
//! round's real output (record delivery) happens out of band while the
//! payload is produced, so collection and wait payloads carry only the
//! sender identity.

use serde::{Deserialize, Serialize};

use super::Round;

/// A participant's payload for one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// Submitted after a harvest cycle
    Collection { sender: String },

    /// Submitted after the pacing sleep
    Wait { sender: String },

    /// Submitted by the keeper with a diagnostic
    Error { sender: String, error_content: String },
}

impl Payload {
    /// The submitting participant's identifier
    pub fn sender(&self) -> &str {
        match self {
            Payload::Collection { sender } => sender,
            Payload::Wait { sender } => sender,
            Payload::Error { sender, .. } => sender,
        }
    }

    /// The round type this payload belongs to
    pub fn round(&self) -> Round {
        match self {
            Payload::Collection { .. } => Round::Collection,
            Payload::Wait { .. } => Round::Wait,
            Payload::Error { .. } => Round::Error,
        }
    }

    /// Serialize payload to bytes for submission
    pub fn serialize(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize payload from bytes
    pub fn deserialize(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
