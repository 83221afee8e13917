//! Mevharvest Error Types

use thiserror::Error;

use crate::round::{Event, Round};

/// Result type alias for mevharvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Mevharvest error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Harvest errors
    #[error("Failed to parse log line '{line}': {reason}")]
    ParseLine { line: String, reason: String },

    #[error("Record delivery rejected with HTTP status {status}")]
    Delivery { status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Round/transition errors
    #[error("No transition declared for round {round} on event {event}")]
    MissingTransition { round: Round, event: Event },

    #[error("Round {0} is unreachable in the transition table")]
    UnreachableRound(Round),

    #[error("Payload serialization error: {0}")]
    PayloadSerialization(#[from] bincode::Error),

    // Agreement errors
    #[error("Agreement error: {0}")]
    Agreement(String),

    // State errors
    #[error("Participant set is unset or empty in synchronized data")]
    EmptyParticipantSet,

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if this error must abort the replica rather than be
    /// absorbed by the current round or record
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::EmptyParticipantSet
                | Error::MissingTransition { .. }
                | Error::UnreachableRound(_)
        )
    }
}
