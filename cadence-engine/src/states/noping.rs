use super::{automation, check_cancelled, complete_item, humanized, pause, MISSING_AUTOMATION};
use crate::context::{Context, TransitionData};
use crate::names;
use crate::state::{Outcome, StateHandler};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use cadence_behavior::SharedRandom;
use tracing::{info, warn};

/// Sends the negative action, after a quick-decision delay when the entry
/// payload asks for one.
pub struct NopingState {
    rng: SharedRandom,
}

impl NopingState {
    pub fn new(rng: SharedRandom) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl StateHandler for NopingState {
    fn name(&self) -> &str {
        names::NOPING
    }

    async fn on_enter(&mut self, ctx: &mut Context, data: &TransitionData) {
        ctx.transition_data = data.clone();
        let quick = data.quick_decision.unwrap_or(false);
        info!(target: "cadence.state", state = self.name(), quick, "preparing negative action");
    }

    async fn on_exit(&mut self, ctx: &mut Context, _data: &TransitionData) {
        ctx.transition_data = TransitionData::default();
    }

    async fn execute(&mut self, ctx: &mut Context) -> Result<Outcome> {
        if let Some(outcome) = check_cancelled(ctx, self.name()) {
            return Ok(outcome);
        }
        let Some(automation) = automation(ctx) else {
            return Ok(Outcome::Failed(MISSING_AUTOMATION.to_string()));
        };

        if ctx.transition_data.quick_decision.unwrap_or(false) {
            let delay = match ctx.behavior.as_ref() {
                Some(profile) => profile.quick_decision_delay(),
                None => {
                    warn!(target: "cadence.state", state = self.name(), "no behavior profile; fallback quick decision delay");
                    humanized(&self.rng, 550, 45.0)
                }
            };
            pause(self.name(), "quick decision", delay).await;
        }

        let sent = automation
            .act_negative()
            .await
            .context("sending negative action")?;
        if !sent {
            return Ok(Outcome::escalate("Nope action failed"));
        }

        info!(target: "cadence.state", state = self.name(), "negative action sent");
        complete_item(ctx);
        Ok(Outcome::next(names::IDLE))
    }
}
