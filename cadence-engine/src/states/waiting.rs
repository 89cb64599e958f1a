use super::{automation, check_cancelled, humanized, pause, MISSING_AUTOMATION};
use crate::context::{Context, TransitionData};
use crate::graph::ProfileScope;
use crate::names;
use crate::state::{Outcome, StateHandler};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use cadence_behavior::{BehaviorProfile, SharedRandom};
use tracing::info;

const REACTION_BASE_MS: u64 = 125;
const REACTION_VARIATION: f64 = 60.0;

/// Blocks on the automation until an item is on screen, then reacts.
pub struct WaitingForProfileState {
    rng: SharedRandom,
    scope: ProfileScope,
}

impl WaitingForProfileState {
    pub fn new(rng: SharedRandom, scope: ProfileScope) -> Self {
        Self { rng, scope }
    }

    fn refresh_profile(&self, ctx: &mut Context) {
        match ctx.behavior.as_mut() {
            Some(profile) => profile.reroll(),
            None => ctx.behavior = Some(BehaviorProfile::new(self.rng.clone())),
        }
        if let Some(profile) = ctx.behavior.as_ref() {
            profile.log_summary();
        }
    }
}

#[async_trait]
impl StateHandler for WaitingForProfileState {
    fn name(&self) -> &str {
        names::WAITING_FOR_PROFILE
    }

    async fn on_enter(&mut self, _ctx: &mut Context, _data: &TransitionData) {
        info!(target: "cadence.state", state = self.name(), "waiting for the next item");
    }

    async fn execute(&mut self, ctx: &mut Context) -> Result<Outcome> {
        if let Some(outcome) = check_cancelled(ctx, self.name()) {
            return Ok(outcome);
        }
        let Some(automation) = automation(ctx) else {
            return Ok(Outcome::Failed(MISSING_AUTOMATION.to_string()));
        };

        let found = automation
            .wait_for_item()
            .await
            .context("waiting for item")?;
        if !found {
            info!(target: "cadence.state", state = self.name(), "item did not load in time");
            return Ok(Outcome::escalate("Profile loading timeout"));
        }

        if self.scope == ProfileScope::Item {
            self.refresh_profile(ctx);
        }

        info!(target: "cadence.state", state = self.name(), "item loaded");
        let reaction = humanized(&self.rng, REACTION_BASE_MS, REACTION_VARIATION);
        pause(self.name(), "reaction", reaction).await;
        Ok(Outcome::next(names::ANALYZING))
    }
}
