use super::{automation, check_cancelled, complete_item, MISSING_AUTOMATION};
use crate::context::Context;
use crate::names;
use crate::state::{Outcome, StateHandler};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use tracing::info;

/// Sends the positive action. A failure escalates; there is no fallback to
/// the negative action.
#[derive(Debug, Default)]
pub struct LikingState;

impl LikingState {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StateHandler for LikingState {
    fn name(&self) -> &str {
        names::LIKING
    }

    async fn execute(&mut self, ctx: &mut Context) -> Result<Outcome> {
        if let Some(outcome) = check_cancelled(ctx, self.name()) {
            return Ok(outcome);
        }
        let Some(automation) = automation(ctx) else {
            return Ok(Outcome::Failed(MISSING_AUTOMATION.to_string()));
        };

        let sent = automation
            .act_positive()
            .await
            .context("sending positive action")?;
        if !sent {
            return Ok(Outcome::escalate("Like action failed"));
        }

        info!(target: "cadence.state", state = self.name(), "positive action sent");
        complete_item(ctx);
        Ok(Outcome::next(names::IDLE))
    }
}
