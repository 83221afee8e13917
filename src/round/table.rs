//! Round Transition Table
//!
//! Static mapping from (current round, emitted event) to the next round.
//! The table is validated at construction: a target that never appears as
//! a source (and is not the initial round) would strand the machine, so
//! it is rejected at startup rather than discovered mid-run.

use std::collections::{HashMap, HashSet};

use super::{Event, Round};
use crate::error::{Error, Result};

/// Validated transition table for the replica state machine
#[derive(Debug, Clone)]
pub struct TransitionTable {
    initial: Round,
    transitions: HashMap<(Round, Event), Round>,
}

impl TransitionTable {
    /// Build and validate a transition table
    pub fn new(initial: Round, declared: &[(Round, Event, Round)]) -> Result<Self> {
        let mut transitions = HashMap::new();
        let mut sources = HashSet::new();

        for (round, event, target) in declared {
            transitions.insert((*round, *event), *target);
            sources.insert(*round);
        }

        // Every referenced target must itself be a source or the initial
        // round, otherwise the machine would dead-end there.
        for target in transitions.values() {
            if *target != initial && !sources.contains(target) {
                return Err(Error::UnreachableRound(*target));
            }
        }

        Ok(Self { initial, transitions })
    }

    /// The fixed table for the harvesting replica:
    ///
    /// ```text
    /// Collection --Done-->        Wait
    /// Collection --Error-->       Error
    /// Wait       --WaitTimeout--> Collection
    /// Error      --RoundTimeout-> Collection
    /// Error      --WaitTimeout--> Collection
    /// ```
    ///
    /// The terminal round set is empty: the machine cycles until the
    /// process is stopped externally.
    pub fn harvesting() -> Result<Self> {
        Self::new(
            Round::Collection,
            &[
                (Round::Collection, Event::Done, Round::Wait),
                (Round::Collection, Event::Error, Round::Error),
                (Round::Wait, Event::WaitTimeout, Round::Collection),
                (Round::Error, Event::RoundTimeout, Round::Collection),
                (Round::Error, Event::WaitTimeout, Round::Collection),
            ],
        )
    }

    /// The designated initial round
    pub fn initial(&self) -> Round {
        self.initial
    }

    /// Resolve the next round for (round, event).
    ///
    /// Total over the declared set; an undeclared pair is a configuration
    /// error, not a recoverable condition.
    pub fn next(&self, round: Round, event: Event) -> Result<Round> {
        self.transitions
            .get(&(round, event))
            .copied()
            .ok_or(Error::MissingTransition { round, event })
    }
}
