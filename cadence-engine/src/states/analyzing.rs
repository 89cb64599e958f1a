use super::{automation, check_cancelled, MISSING_AUTOMATION};
use crate::context::{Context, TransitionData};
use crate::names;
use crate::state::{Outcome, StateHandler};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use tracing::info;

/// Routes the item to deeper engagement or a quick negative.
#[derive(Debug, Default)]
pub struct AnalyzingState;

impl AnalyzingState {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StateHandler for AnalyzingState {
    fn name(&self) -> &str {
        names::ANALYZING
    }

    async fn execute(&mut self, ctx: &mut Context) -> Result<Outcome> {
        if let Some(outcome) = check_cancelled(ctx, self.name()) {
            return Ok(outcome);
        }
        let Some(automation) = automation(ctx) else {
            return Ok(Outcome::Failed(MISSING_AUTOMATION.to_string()));
        };

        let qualifies = automation
            .evaluate_item()
            .await
            .context("evaluating item")?;

        if qualifies {
            info!(target: "cadence.state", state = self.name(), "item qualifies; engaging");
            Ok(Outcome::next_with(
                names::THINKING,
                TransitionData::default().with_recently_active(true),
            ))
        } else {
            info!(target: "cadence.state", state = self.name(), "item does not qualify; quick nope");
            Ok(Outcome::next_with(
                names::NOPING,
                TransitionData::default()
                    .with_recently_active(false)
                    .with_quick_decision(true),
            ))
        }
    }
}
