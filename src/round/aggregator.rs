//! Payload Aggregation
//!
//! Collects one payload per participant within a round and decides when
//! the round has ended under a round-specific completion rule.

use std::collections::HashMap;

use super::{Payload, Round};

/// Per-round completion rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionRule {
    /// Complete once this many distinct senders have submitted
    CollectUntilThreshold { threshold: usize },

    /// Complete once the designated keeper's payload is accepted
    OnlyKeeperSends { keeper: String },
}

/// Aggregates accepted payloads for one round until its completion rule
/// is satisfied
#[derive(Debug)]
pub struct PayloadAggregator {
    rule: CompletionRule,
    accepted: HashMap<String, Payload>,
}

impl PayloadAggregator {
    /// Create an aggregator with an explicit rule
    pub fn new(rule: CompletionRule) -> Self {
        Self {
            rule,
            accepted: HashMap::new(),
        }
    }

    /// Select the rule for a round type. `Collection` and `Wait` gather
    /// distinct senders up to the engine-supplied threshold; `Error`
    /// expects only the keeper.
    pub fn for_round(round: Round, threshold: usize, keeper: &str) -> Self {
        let rule = match round {
            Round::Collection | Round::Wait => {
                CompletionRule::CollectUntilThreshold { threshold }
            }
            Round::Error => CompletionRule::OnlyKeeperSends {
                keeper: keeper.to_string(),
            },
        };
        Self::new(rule)
    }

    /// Record an accepted payload.
    ///
    /// Duplicate submissions from one sender are not double-counted; a
    /// non-keeper payload in a keeper round is ignored. Returns whether
    /// the payload was retained.
    pub fn record(&mut self, payload: Payload) -> bool {
        let sender = payload.sender().to_string();

        if let CompletionRule::OnlyKeeperSends { keeper } = &self.rule {
            if &sender != keeper {
                tracing::warn!(
                    "Ignoring payload from '{}': round expects only keeper '{}'",
                    sender,
                    keeper
                );
                return false;
            }
        }

        if self.accepted.contains_key(&sender) {
            tracing::debug!("Duplicate payload from '{}' ignored", sender);
            return false;
        }

        self.accepted.insert(sender, payload);
        true
    }

    /// Check whether the completion rule is satisfied
    pub fn is_complete(&self) -> bool {
        match &self.rule {
            CompletionRule::CollectUntilThreshold { threshold } => {
                self.accepted.len() >= *threshold
            }
            CompletionRule::OnlyKeeperSends { keeper } => {
                self.accepted.contains_key(keeper)
            }
        }
    }

    /// Number of distinct senders accepted so far
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    /// The accepted payload set
    pub fn accepted(&self) -> impl Iterator<Item = &Payload> {
        self.accepted.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wait_payload(sender: &str) -> Payload {
        Payload::Wait { sender: sender.to_string() }
    }

    #[test]
    fn test_threshold_completion() {
        let mut agg = PayloadAggregator::for_round(Round::Collection, 3, "a");

        assert!(agg.record(wait_payload("a")));
        assert!(!agg.is_complete());
        assert!(agg.record(wait_payload("b")));
        assert!(!agg.is_complete());
        assert!(agg.record(wait_payload("c")));
        assert!(agg.is_complete());
    }

    #[test]
    fn test_duplicate_sender_not_double_counted() {
        let mut agg = PayloadAggregator::for_round(Round::Wait, 2, "a");

        assert!(agg.record(wait_payload("a")));
        assert!(!agg.record(wait_payload("a")));
        assert_eq!(agg.accepted_count(), 1);
        assert!(!agg.is_complete());

        assert!(agg.record(wait_payload("b")));
        assert!(agg.is_complete());
    }

    #[test]
    fn test_only_keeper_sends() {
        let mut agg = PayloadAggregator::for_round(Round::Error, 3, "keeper");

        let intruder = Payload::Error {
            sender: "other".to_string(),
            error_content: "not mine to report".to_string(),
        };
        assert!(!agg.record(intruder));
        assert!(!agg.is_complete());

        let keeper = Payload::Error {
            sender: "keeper".to_string(),
            error_content: "An error occurred in the FSM.".to_string(),
        };
        assert!(agg.record(keeper));
        assert!(agg.is_complete());
        assert_eq!(agg.accepted_count(), 1);
    }
}
