//! Mevharvest - Round-Synchronized MEV Log Harvesting Replica
//!
//! One replica of a multi-agent periodic task: every cycle, harvest the
//! previous hour's MEV transaction log, parse each line into a structured
//! record, deliver each record to a reporting endpoint, then pace and
//! repeat. Every local state transition is gated on cross-replica
//! agreement: a replica proposes a per-round payload, suspends until a
//! quorum of peers has submitted theirs, and only then advances.
//!
//! # Architecture
//!
//! The replica is a round-based finite state machine (`Collection`,
//! `Wait`, `Error`) driven by a validated transition table. Each round
//! runs a local task to produce a payload, submits it to the agreement
//! engine, and aggregates accepted peer payloads under a per-round
//! completion rule (distinct-sender threshold, or single designated
//! keeper) before computing the round's outcome event.
//!
//! # Features
//!
//! - Validated round transition table (undeclared transitions fail fast)
//! - Threshold-gated payload aggregation with duplicate-sender dedup
//! - Hourly log file discovery, line-level fault-isolated parsing
//! - Best-effort per-record HTTP delivery to a reporting endpoint
//! - Replicated key-value state replaced only at agreed transitions

pub mod agreement;
pub mod config;
pub mod error;
pub mod harvest;
pub mod replica;
pub mod round;
pub mod state;

pub use config::MevHarvestConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agreement::{AgreementEngine, RoundUpdate};
    pub use crate::config::MevHarvestConfig;
    pub use crate::error::{Error, Result};
    pub use crate::harvest::{LogHarvestPipeline, LogRecord};
    pub use crate::replica::ReplicaStateMachine;
    pub use crate::round::{Event, Payload, Round, TransitionTable};
    pub use crate::state::SynchronizedData;
}
