use anyhow::{bail, Result};
use async_trait::async_trait;
use cadence_behavior::{BehaviorProfile, SharedRandom};
use cadence_engine::Automation;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const OBSTRUCTION_CHANCE: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct SimulationSettings {
    /// Probability that an item qualifies for full engagement.
    pub positive_rate: f64,
    /// Probability that a positive or negative action fails.
    pub failure_rate: f64,
    pub min_latency: Duration,
    pub max_latency: Duration,
    /// Cancel the session after this many completed actions.
    pub max_items: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            positive_rate: 0.35,
            failure_rate: 0.02,
            min_latency: Duration::from_millis(80),
            max_latency: Duration::from_millis(400),
            max_items: None,
        }
    }
}

/// Dry-run automation. Nothing leaves the process; every call sleeps for a
/// natural-looking latency and reports a randomized result.
pub struct SimulatedAutomation {
    rng: SharedRandom,
    settings: SimulationSettings,
    cancel: Arc<CancellationToken>,
    items_seen: AtomicU64,
    positives: AtomicU64,
    negatives: AtomicU64,
    closed: AtomicBool,
}

impl SimulatedAutomation {
    pub fn new(rng: SharedRandom, settings: SimulationSettings, cancel: Arc<CancellationToken>) -> Self {
        Self {
            rng,
            settings,
            cancel,
            items_seen: AtomicU64::new(0),
            positives: AtomicU64::new(0),
            negatives: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn items_seen(&self) -> u64 {
        self.items_seen.load(Ordering::SeqCst)
    }

    pub fn positives(&self) -> u64 {
        self.positives.load(Ordering::SeqCst)
    }

    pub fn negatives(&self) -> u64 {
        self.negatives.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> u64 {
        self.positives() + self.negatives()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn latency(&self) {
        let min = self.settings.min_latency.as_millis() as u64;
        let max = self.settings.max_latency.as_millis() as u64;
        let ms = self.rng.natural_delay(min, max, None);
        sleep(Duration::from_millis(ms)).await;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            bail!("simulated page already closed");
        }
        Ok(())
    }

    fn action_succeeds(&self) -> bool {
        !self.rng.boolean(self.settings.failure_rate)
    }

    fn record_completion(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::SeqCst);
        let done = self.completed();
        if let Some(limit) = self.settings.max_items {
            if done >= limit && !self.cancel.is_cancelled() {
                info!(target: "cadence.driver", done, limit, "item budget reached; cancelling session");
                self.cancel.cancel();
            }
        }
    }
}

#[async_trait]
impl Automation for SimulatedAutomation {
    async fn wait_for_item(&self) -> Result<bool> {
        self.ensure_open()?;
        self.latency().await;
        let seen = self.items_seen.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(target: "cadence.driver", item = seen, "item on screen");
        Ok(true)
    }

    async fn evaluate_item(&self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.rng.boolean(self.settings.positive_rate))
    }

    async fn act_positive(&self) -> Result<bool> {
        self.ensure_open()?;
        self.latency().await;
        if !self.action_succeeds() {
            debug!(target: "cadence.driver", "positive action dropped");
            return Ok(false);
        }
        self.record_completion(&self.positives);
        Ok(true)
    }

    async fn act_negative(&self) -> Result<bool> {
        self.ensure_open()?;
        self.latency().await;
        if !self.action_succeeds() {
            debug!(target: "cadence.driver", "negative action dropped");
            return Ok(false);
        }
        self.record_completion(&self.negatives);
        Ok(true)
    }

    async fn view_detail(&self, profile: Option<&BehaviorProfile>) -> Result<bool> {
        self.ensure_open()?;
        match profile {
            Some(profile) => {
                for delay_ms in &profile.photo_viewing().delays_ms {
                    sleep(Duration::from_millis(*delay_ms)).await;
                }
            }
            None => self.latency().await,
        }
        Ok(true)
    }

    async fn move_pointer(&self, profile: Option<&BehaviorProfile>) -> Result<bool> {
        self.ensure_open()?;
        match profile.map(|p| p.pointer_movement()) {
            Some(movement) => {
                debug!(
                    target: "cadence.driver",
                    steps = movement.steps,
                    duration_ms = movement.duration_ms,
                    "pointer sweep"
                );
                sleep(Duration::from_millis(movement.duration_ms)).await;
            }
            None => self.latency().await,
        }
        Ok(true)
    }

    async fn dismiss_obstruction(&self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.rng.boolean(OBSTRUCTION_CHANCE))
    }

    async fn cleanup(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!(
                target: "cadence.driver",
                items = self.items_seen(),
                positives = self.positives(),
                negatives = self.negatives(),
                "simulated session closed"
            );
        }
        Ok(())
    }
}
