//! In-Process Agreement
//!
//! Loopback implementation of [`AgreementEngine`]: accepted payloads are
//! echoed back in submission order over an in-memory queue. A handle lets
//! tests (and future transports) inject payloads on behalf of other
//! participants and inject timeout events.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use super::{AgreementEngine, RoundUpdate};
use crate::error::{Error, Result};
use crate::round::{Event, Payload};

/// Queue capacity per round; bounded to surface a stuck consumer
const ROUND_QUEUE_CAPACITY: usize = 64;

/// In-memory agreement engine
pub struct InMemoryAgreement {
    /// Fraction of participants required, as (numerator, denominator).
    /// Defaults to all participants.
    threshold_num: usize,
    threshold_den: usize,
    rounds: Arc<Mutex<HashMap<String, RoundQueue>>>,
}

struct RoundQueue {
    tx: mpsc::Sender<RoundUpdate>,
    rx: Arc<Mutex<mpsc::Receiver<RoundUpdate>>>,
}

impl RoundQueue {
    fn new() -> Self {
        let (tx, rx) = mpsc::channel(ROUND_QUEUE_CAPACITY);
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }
}

impl InMemoryAgreement {
    /// Create an engine that requires every participant to submit
    pub fn new() -> Self {
        Self {
            threshold_num: 1,
            threshold_den: 1,
            rounds: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create an engine with a fractional threshold, rounded up
    pub fn with_threshold_fraction(num: usize, den: usize) -> Self {
        Self {
            threshold_num: num,
            threshold_den: den,
            rounds: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Handle for injecting peer payloads and timeout events
    pub fn handle(&self) -> InMemoryHandle {
        InMemoryHandle {
            rounds: Arc::clone(&self.rounds),
        }
    }

    async fn sender_for(&self, round_id: &str) -> mpsc::Sender<RoundUpdate> {
        let mut rounds = self.rounds.lock().await;
        rounds
            .entry(round_id.to_string())
            .or_insert_with(RoundQueue::new)
            .tx
            .clone()
    }
}

impl Default for InMemoryAgreement {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgreementEngine for InMemoryAgreement {
    async fn submit(&self, round_id: &str, payload: Payload) -> Result<()> {
        // Exercise the wire encoding even in loopback, so payloads that
        // would not survive a real transport fail here too.
        let bytes = payload.serialize()?;
        let payload = Payload::deserialize(&bytes)?;

        let tx = self.sender_for(round_id).await;
        tx.send(RoundUpdate::Accepted(payload))
            .await
            .map_err(|_| Error::Agreement(format!("round '{}' queue closed", round_id)))
    }

    async fn next_update(&self, round_id: &str) -> Result<RoundUpdate> {
        // Hold the map lock only long enough to find the round's queue,
        // never across the receive itself.
        let rx = {
            let mut rounds = self.rounds.lock().await;
            let queue = rounds
                .entry(round_id.to_string())
                .or_insert_with(RoundQueue::new);
            Arc::clone(&queue.rx)
        };

        let mut rx = rx.lock().await;
        rx.recv().await.ok_or_else(|| {
            Error::Agreement(format!("round '{}' closed without completion", round_id))
        })
    }

    fn threshold(&self, participants: usize) -> usize {
        // Ceiling of participants * num / den, at least one.
        let t = (participants * self.threshold_num + self.threshold_den - 1)
            / self.threshold_den;
        t.max(1)
    }
}

/// Handle onto an [`InMemoryAgreement`] for injecting updates
#[derive(Clone)]
pub struct InMemoryHandle {
    rounds: Arc<Mutex<HashMap<String, RoundQueue>>>,
}

impl InMemoryHandle {
    /// Inject a payload as if accepted from another participant
    pub async fn inject_payload(&self, round_id: &str, payload: Payload) -> Result<()> {
        self.send(round_id, RoundUpdate::Accepted(payload)).await
    }

    /// Inject a timeout event for the round
    pub async fn inject_timeout(&self, round_id: &str, event: Event) -> Result<()> {
        self.send(round_id, RoundUpdate::Timeout(event)).await
    }

    async fn send(&self, round_id: &str, update: RoundUpdate) -> Result<()> {
        let tx = {
            let mut rounds = self.rounds.lock().await;
            rounds
                .entry(round_id.to_string())
                .or_insert_with(RoundQueue::new)
                .tx
                .clone()
        };

        tx.send(update)
            .await
            .map_err(|_| Error::Agreement(format!("round '{}' queue closed", round_id)))
    }
}
