use crate::context::{Context, TransitionData};
use crate::names;
use crate::state::{Outcome, StateHandler};
use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info, warn};

/// Terminal state: cleans up the collaborators and stops the machine.
#[derive(Debug, Default)]
pub struct ShutdownState;

impl ShutdownState {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StateHandler for ShutdownState {
    fn name(&self) -> &str {
        names::SHUTDOWN
    }

    async fn on_enter(&mut self, _ctx: &mut Context, data: &TransitionData) {
        let reason = data.reason.as_deref().unwrap_or("User requested shutdown");
        info!(target: "cadence.state", state = self.name(), reason, "shutdown initiated");
    }

    async fn on_exit(&mut self, _ctx: &mut Context, _data: &TransitionData) {
        warn!(target: "cadence.state", state = self.name(), "terminal state should never exit");
    }

    async fn execute(&mut self, ctx: &mut Context) -> Result<Outcome> {
        if let Some(automation) = ctx.automation.clone() {
            match automation.cleanup().await {
                Ok(()) => info!(target: "cadence.state", "automation cleaned up"),
                Err(err) => error!(target: "cadence.state", error = %err, "automation cleanup failed; continuing"),
            }
        }
        if let Some(signal) = ctx.cancellation.clone() {
            match signal.cleanup() {
                Ok(()) => info!(target: "cadence.state", "cancellation signal cleaned up"),
                Err(err) => error!(target: "cadence.state", error = %err, "cancellation cleanup failed; continuing"),
            }
        }

        info!(target: "cadence.state", state = self.name(), "shutdown complete");
        ctx.request_stop();
        Ok(Outcome::Stay)
    }
}
