//! Agreement Engine Boundary
//!
//! The Byzantine-agreement engine that synchronizes payloads across
//! replicas lives outside this crate. This module defines the capability
//! interface the replica consumes, plus an in-process loopback
//! implementation for single-replica operation and tests.

mod memory;

pub use memory::{InMemoryAgreement, InMemoryHandle};

use async_trait::async_trait;

use crate::error::Result;
use crate::round::{Event, Payload};

/// One update delivered by the engine while a round is open
#[derive(Debug, Clone, PartialEq)]
pub enum RoundUpdate {
    /// A payload (ours or a peer's) was accepted into the round
    Accepted(Payload),

    /// The engine's deadline expired before the round completed
    Timeout(Event),
}

/// Capability interface onto the external agreement engine.
///
/// Composed into the replica as a dependency; round types never subtype
/// engine machinery.
#[async_trait]
pub trait AgreementEngine: Send + Sync {
    /// Propose this replica's payload for the given round
    async fn submit(&self, round_id: &str, payload: Payload) -> Result<()>;

    /// Suspend until the engine delivers the next update for the round.
    ///
    /// Updates arrive in the engine's acceptance order; every replica
    /// observes the same accepted payload set for a given round.
    async fn next_update(&self, round_id: &str) -> Result<RoundUpdate>;

    /// Agreement threshold for the given participant count
    fn threshold(&self, participants: usize) -> usize;
}
