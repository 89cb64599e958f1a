use super::{automation, check_cancelled, dismiss_best_effort, humanized, pause};
use crate::context::Context;
use crate::names;
use crate::state::{Outcome, StateHandler};
use anyhow::Result;
use async_trait::async_trait;
use cadence_behavior::SharedRandom;
use tracing::warn;

pub struct ThinkingState {
    rng: SharedRandom,
}

impl ThinkingState {
    pub fn new(rng: SharedRandom) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl StateHandler for ThinkingState {
    fn name(&self) -> &str {
        names::THINKING
    }

    async fn execute(&mut self, ctx: &mut Context) -> Result<Outcome> {
        if let Some(outcome) = check_cancelled(ctx, self.name()) {
            return Ok(outcome);
        }
        if let Some(automation) = automation(ctx) {
            dismiss_best_effort(automation.as_ref(), self.name()).await;
        }

        let delay = match ctx.behavior.as_ref() {
            Some(profile) => profile.thinking_delay(),
            None => {
                warn!(target: "cadence.state", state = self.name(), "no behavior profile; fallback thinking delay");
                humanized(&self.rng, 2000, 50.0)
            }
        };
        pause(self.name(), "thinking", delay).await;
        Ok(Outcome::next(names::VIEWING_PHOTOS))
    }
}
