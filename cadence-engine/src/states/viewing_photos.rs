use super::{automation, check_cancelled, dismiss_best_effort, humanized, pause, MISSING_AUTOMATION};
use crate::context::Context;
use crate::names;
use crate::state::{Outcome, StateHandler};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use cadence_behavior::{PhotoViewing, RandomSource, SharedRandom};
use std::time::Duration;
use tracing::{info, warn};

/// Browses the item's detail views, with optional pointer movement.
///
/// With a profile the automation paces itself from it. Without one the state
/// walks a fallback plan of 1 to 3 humanized pauses after the automation call.
pub struct ViewingPhotosState {
    rng: SharedRandom,
}

impl ViewingPhotosState {
    pub fn new(rng: SharedRandom) -> Self {
        Self { rng }
    }
}

fn fallback_plan(rng: &RandomSource) -> PhotoViewing {
    let count = rng.uniform_int(1, 3);
    let delays_ms = (0..count)
        .map(|_| humanized(rng, 1500, 60.0).as_millis() as u64)
        .collect();
    PhotoViewing { count, delays_ms }
}

#[async_trait]
impl StateHandler for ViewingPhotosState {
    fn name(&self) -> &str {
        names::VIEWING_PHOTOS
    }

    async fn execute(&mut self, ctx: &mut Context) -> Result<Outcome> {
        if let Some(outcome) = check_cancelled(ctx, self.name()) {
            return Ok(outcome);
        }
        let Some(automation) = automation(ctx) else {
            return Ok(Outcome::Failed(MISSING_AUTOMATION.to_string()));
        };
        dismiss_best_effort(automation.as_ref(), self.name()).await;

        let profile = ctx.behavior.as_ref();
        let fallback = match profile {
            Some(_) => None,
            None => {
                warn!(target: "cadence.state", state = self.name(), "no behavior profile; fallback photo plan");
                Some(fallback_plan(&self.rng))
            }
        };
        let count = profile
            .map(|p| p.photo_viewing().count)
            .or(fallback.as_ref().map(|plan| plan.count))
            .unwrap_or_default();
        info!(target: "cadence.state", state = self.name(), photos = count, "viewing details");

        let viewed = automation
            .view_detail(profile)
            .await
            .context("viewing item detail")?;
        if !viewed {
            warn!(target: "cadence.state", state = self.name(), "detail viewing failed; continuing");
        }

        if let Some(plan) = &fallback {
            for delay_ms in &plan.delays_ms {
                pause(self.name(), "photo", Duration::from_millis(*delay_ms)).await;
            }
        }

        let should_move = profile
            .map(|p| p.pointer_movement().should_move)
            .unwrap_or(false);
        if should_move {
            let moved = automation
                .move_pointer(profile)
                .await
                .context("moving pointer")?;
            if !moved {
                warn!(target: "cadence.state", state = self.name(), "pointer movement failed; continuing");
            }
        }

        Ok(Outcome::next(names::DECIDING))
    }
}
