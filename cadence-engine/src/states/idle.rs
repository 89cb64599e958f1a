use super::{automation, check_cancelled, humanized, pause, MISSING_AUTOMATION};
use crate::context::Context;
use crate::names;
use crate::state::{Outcome, StateHandler};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use cadence_behavior::SharedRandom;
use tracing::{info, warn};

/// Gap between items, with an occasional long break.
pub struct IdleState {
    rng: SharedRandom,
    breaks_enabled: bool,
}

impl IdleState {
    pub fn new(rng: SharedRandom, breaks_enabled: bool) -> Self {
        Self { rng, breaks_enabled }
    }
}

#[async_trait]
impl StateHandler for IdleState {
    fn name(&self) -> &str {
        names::IDLE
    }

    async fn execute(&mut self, ctx: &mut Context) -> Result<Outcome> {
        if let Some(outcome) = check_cancelled(ctx, self.name()) {
            return Ok(outcome);
        }
        let Some(automation) = automation(ctx) else {
            return Ok(Outcome::Failed(MISSING_AUTOMATION.to_string()));
        };

        let delay = match ctx.behavior.as_ref() {
            Some(profile) => profile.next_item_delay(),
            None => {
                warn!(target: "cadence.state", state = self.name(), "no behavior profile; fallback next item delay");
                humanized(&self.rng, 5000, 40.0)
            }
        };
        pause(self.name(), "next item", delay).await;

        if self.breaks_enabled {
            if let Some(profile) = ctx.behavior.as_ref().filter(|p| p.should_take_break()) {
                let long_break = profile.break_delay();
                info!(
                    target: "cadence.state",
                    state = self.name(),
                    items = profile.items_processed(),
                    break_ms = long_break.as_millis() as u64,
                    "taking a break"
                );
                pause(self.name(), "break", long_break).await;
            }
        }

        let loaded = automation
            .wait_for_item()
            .await
            .context("waiting for next item")?;
        if !loaded {
            return Ok(Outcome::escalate("Next profile load timeout in idle state"));
        }
        Ok(Outcome::next(names::WAITING_FOR_PROFILE))
    }
}
