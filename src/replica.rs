//! Replica State Machine
//!
//! Drives the round cycle: run the current round's task to produce a
//! payload, submit it for cross-replica agreement, suspend until the
//! round's completion rule is satisfied (or the engine times out), compute
//! the outcome event, and advance through the transition table. Rounds are
//! strictly sequential; synchronized data is only replaced at an agreed
//! transition.

use std::sync::Arc;

use chrono::Local;

use crate::agreement::{AgreementEngine, RoundUpdate};
use crate::config::MevHarvestConfig;
use crate::error::{Error, Result};
use crate::harvest::LogHarvestPipeline;
use crate::round::{Event, Payload, PayloadAggregator, Round, TransitionTable};
use crate::state::SynchronizedData;

/// Diagnostic submitted by the keeper in the error round
const ERROR_ROUND_MESSAGE: &str = "An error occurred in the FSM.";

/// One replica's round-synchronized state machine
pub struct ReplicaStateMachine {
    node_id: String,
    config: MevHarvestConfig,
    table: TransitionTable,
    engine: Arc<dyn AgreementEngine>,
    pipeline: LogHarvestPipeline,
    current: Round,
    synced: SynchronizedData,
    /// Monotonic round sequence, part of each round id
    sequence: u64,
}

impl ReplicaStateMachine {
    /// Create a replica positioned at the table's initial round
    pub fn new(
        config: MevHarvestConfig,
        table: TransitionTable,
        engine: Arc<dyn AgreementEngine>,
        synced: SynchronizedData,
    ) -> Self {
        let pipeline = LogHarvestPipeline::new(&config);
        let current = table.initial();

        Self {
            node_id: config.node.id.clone(),
            config,
            table,
            engine,
            pipeline,
            current,
            synced,
            sequence: 0,
        }
    }

    /// The round currently in flight (or about to start)
    pub fn current_round(&self) -> Round {
        self.current
    }

    /// The replica's view of the synchronized data
    pub fn synchronized_data(&self) -> &SynchronizedData {
        &self.synced
    }

    /// Run rounds forever. The table has no terminal rounds; the loop
    /// only returns on a fatal error.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let event = self.run_round().await?;
            tracing::debug!("Round ended with event {}", event);
        }
    }

    /// Execute a single round end to end and advance. Returns the event
    /// the round emitted.
    pub async fn run_round(&mut self) -> Result<Event> {
        let round = self.current;
        self.sequence += 1;
        let round_id = format!("{}#{}", round, self.sequence);

        tracing::info!("Entering {} round ({})", round, round_id);

        // Thresholds are undefined without an agreed participant set.
        let participants = self.synced.participants()?;
        let threshold = self.engine.threshold(participants.len());
        let keeper = participants
            .iter()
            .next()
            .cloned()
            .ok_or(Error::EmptyParticipantSet)?;

        // Local task phase: side effects commit here, before agreement,
        // and are never re-run if the round later times out.
        let payload = self.produce_payload(round).await;

        // Agreement phase.
        self.engine.submit(&round_id, payload).await?;
        let event = self.await_round_end(&round_id, round, threshold, &keeper).await?;

        let next = self.table.next(round, event)?;
        tracing::info!(
            "Round {} ended with event {}, transitioning to {}",
            round_id,
            event,
            next
        );
        self.current = next;

        Ok(event)
    }

    /// Run the round's local task and build this replica's payload
    async fn produce_payload(&self, round: Round) -> Payload {
        match round {
            Round::Collection => {
                tracing::info!("Collecting logs");
                let report = self.pipeline.harvest(Local::now().naive_local()).await;
                tracing::info!(
                    "Harvest cycle complete: {} parsed, {} delivered, {} skipped",
                    report.parsed,
                    report.delivered,
                    report.skipped
                );
                Payload::Collection {
                    sender: self.node_id.clone(),
                }
            }
            Round::Wait => {
                let wait = self.config.wait_time();
                tracing::info!(
                    "Sleeping for {}s before fetching another set of logs",
                    wait.as_secs()
                );
                tokio::time::sleep(wait).await;
                Payload::Wait {
                    sender: self.node_id.clone(),
                }
            }
            Round::Error => {
                tracing::error!("{}", ERROR_ROUND_MESSAGE);
                Payload::Error {
                    sender: self.node_id.clone(),
                    error_content: ERROR_ROUND_MESSAGE.to_string(),
                }
            }
        }
    }

    /// Suspend on the agreement engine, feeding accepted payloads into
    /// the round's aggregator until its completion rule is satisfied or a
    /// timeout event arrives.
    async fn await_round_end(
        &mut self,
        round_id: &str,
        round: Round,
        threshold: usize,
        keeper: &str,
    ) -> Result<Event> {
        let mut aggregator = PayloadAggregator::for_round(round, threshold, keeper);
        let deadline = self.config.round_timeout();

        loop {
            // The engine owns the real deadline; this local guard covers
            // an engine that never answers at all.
            let update =
                match tokio::time::timeout(deadline, self.engine.next_update(round_id)).await {
                    Ok(update) => update?,
                    Err(_) => RoundUpdate::Timeout(Event::RoundTimeout),
                };

            match update {
                RoundUpdate::Accepted(payload) => {
                    if payload.round() != round {
                        tracing::warn!(
                            "Ignoring {} payload from '{}' in {} round",
                            payload.round(),
                            payload.sender(),
                            round
                        );
                        continue;
                    }

                    aggregator.record(payload);
                    tracing::debug!(
                        "Round {}: {} payload(s) accepted",
                        round_id,
                        aggregator.accepted_count()
                    );

                    if aggregator.is_complete() {
                        let (synced, event) = round.end_block(&self.synced);
                        self.synced = synced;
                        return Ok(event);
                    }
                }
                RoundUpdate::Timeout(event) => {
                    tracing::warn!(
                        "Round {} timed out with {} payload(s) accepted",
                        round_id,
                        aggregator.accepted_count()
                    );
                    return Ok(event);
                }
            }
        }
    }
}
