use super::{check_cancelled, humanized, pause};
use crate::context::Context;
use crate::names;
use crate::state::{Outcome, StateHandler};
use anyhow::Result;
use async_trait::async_trait;
use cadence_behavior::SharedRandom;
use tracing::{info, warn};

/// Final pause before committing to the positive action.
pub struct DecidingState {
    rng: SharedRandom,
}

impl DecidingState {
    pub fn new(rng: SharedRandom) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl StateHandler for DecidingState {
    fn name(&self) -> &str {
        names::DECIDING
    }

    async fn execute(&mut self, ctx: &mut Context) -> Result<Outcome> {
        if let Some(outcome) = check_cancelled(ctx, self.name()) {
            return Ok(outcome);
        }

        let delay = match ctx.behavior.as_ref() {
            Some(profile) => profile.final_pause(),
            None => {
                warn!(target: "cadence.state", state = self.name(), "no behavior profile; fallback final pause");
                humanized(&self.rng, 333, 40.0)
            }
        };
        pause(self.name(), "final pause", delay).await;

        info!(target: "cadence.state", state = self.name(), "decided: positive");
        Ok(Outcome::next(names::LIKING))
    }
}
