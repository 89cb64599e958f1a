//! The ten handlers of the standard item-processing graph.
//!
//! Every handler except SHUTDOWN opens `execute` with a cancellation check,
//! then pulls the profile and collaborators out of the [`Context`]. Missing
//! profiles fall back to fixed humanized delays.
mod analyzing;
mod deciding;
mod error;
mod idle;
mod liking;
mod noping;
mod shutdown;
mod thinking;
mod viewing_photos;
mod waiting;

pub use analyzing::AnalyzingState;
pub use deciding::DecidingState;
pub use error::{ErrorClass, ErrorState, MAX_RETRIES, RECOVERY_DELAY_MS};
pub use idle::IdleState;
pub use liking::LikingState;
pub use noping::NopingState;
pub use shutdown::ShutdownState;
pub use thinking::ThinkingState;
pub use viewing_photos::ViewingPhotosState;
pub use waiting::WaitingForProfileState;

use crate::collaborators::Automation;
use crate::context::Context;
use crate::names;
use crate::state::Outcome;
use cadence_behavior::RandomSource;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const MISSING_AUTOMATION: &str = "Automation handle not available in context";

/// `Some(SHUTDOWN)` when cancellation was requested.
fn check_cancelled(ctx: &Context, state: &str) -> Option<Outcome> {
    if ctx.is_cancelled() {
        info!(target: "cadence.state", state, "cancellation requested");
        Some(Outcome::next(names::SHUTDOWN))
    } else {
        None
    }
}

fn automation(ctx: &Context) -> Option<Arc<dyn Automation>> {
    ctx.automation.clone()
}

fn humanized(rng: &RandomSource, base_ms: u64, variation_percent: f64) -> Duration {
    Duration::from_millis(rng.humanized_delay(base_ms, variation_percent))
}

async fn pause(state: &str, what: &'static str, delay: Duration) {
    debug!(
        target: "cadence.state",
        state,
        what,
        delay_ms = delay.as_millis() as u64,
        "pausing"
    );
    tokio::time::sleep(delay).await;
}

/// Close overlays if possible; failures never escalate.
async fn dismiss_best_effort(automation: &dyn Automation, state: &str) {
    match automation.dismiss_obstruction().await {
        Ok(true) => {}
        Ok(false) => debug!(target: "cadence.state", state, "nothing dismissed"),
        Err(err) => warn!(target: "cadence.state", state, error = %err, "dismissing obstruction failed"),
    }
}

/// Record a finished item on the profile and clear the retry streak.
fn complete_item(ctx: &mut Context) {
    if let Some(profile) = ctx.behavior.as_mut() {
        profile.on_item_completed();
    }
    ctx.error_retry_count = 0;
}
