//! Round Module
//!
//! Round and event types, per-round payloads, the validated transition
//! table, and threshold-gated payload aggregation.

pub mod aggregator;
pub mod payload;
pub mod table;

pub use aggregator::{CompletionRule, PayloadAggregator};
pub use payload::Payload;
pub use table::TransitionTable;

use serde::{Deserialize, Serialize};

use crate::state::SynchronizedData;

/// One state of the replica's finite state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Round {
    /// Harvest the previous hour's log and deliver records
    Collection,
    /// Pace the cycle with a fixed local sleep
    Wait,
    /// Surface a diagnostic through the designated keeper
    Error,
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Round::Collection => write!(f, "collection"),
            Round::Wait => write!(f, "wait"),
            Round::Error => write!(f, "error"),
        }
    }
}

/// The outcome a round emits once its completion rule is satisfied,
/// driving the next transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// Round completed normally
    Done,
    /// Round surfaced an error
    Error,
    /// Pacing wait elapsed
    WaitTimeout,
    /// Agreement deadline expired without reaching the threshold
    RoundTimeout,
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Done => write!(f, "done"),
            Event::Error => write!(f, "error"),
            Event::WaitTimeout => write!(f, "wait_timeout"),
            Event::RoundTimeout => write!(f, "round_timeout"),
        }
    }
}

impl Round {
    /// Compute the round's outcome once its completion rule is satisfied.
    ///
    /// Deterministic and side-effect-free given the accepted payload set:
    /// every replica computes this independently and must agree.
    pub fn end_block(&self, synced: &SynchronizedData) -> (SynchronizedData, Event) {
        let event = match self {
            Round::Collection => Event::Done,
            Round::Wait => Event::WaitTimeout,
            Round::Error => Event::Error,
        };
        (synced.clone(), event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_block_events() {
        let synced = SynchronizedData::with_participants(["a"]);

        assert_eq!(Round::Collection.end_block(&synced).1, Event::Done);
        assert_eq!(Round::Wait.end_block(&synced).1, Event::WaitTimeout);
        assert_eq!(Round::Error.end_block(&synced).1, Event::Error);
    }

    #[test]
    fn test_end_block_preserves_state() {
        let synced = SynchronizedData::with_participants(["a", "b"]);
        let (next, _) = Round::Collection.end_block(&synced);
        assert_eq!(next, synced);
    }
}
