use super::{check_cancelled, humanized, pause};
use crate::context::{Context, TransitionData};
use crate::names;
use crate::state::{Outcome, StateHandler};
use anyhow::Result;
use async_trait::async_trait;
use cadence_behavior::SharedRandom;
use std::fmt;
use tracing::{error, info, warn};

/// ERROR executions allowed before escalating to SHUTDOWN.
pub const MAX_RETRIES: u32 = 3;
pub const RECOVERY_DELAY_MS: u64 = 3000;
const RECOVERY_VARIATION: f64 = 30.0;

/// Coarse diagnosis of a failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Profile,
    Browser,
    Timeout,
    Generic,
}

impl ErrorClass {
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("profile") {
            Self::Profile
        } else if lower.contains("browser") || lower.contains("page") {
            Self::Browser
        } else if lower.contains("timeout") {
            Self::Timeout
        } else {
            Self::Generic
        }
    }

    /// Every class currently resumes at WAITING_FOR_PROFILE.
    pub fn recovery_state(&self) -> &'static str {
        names::WAITING_FOR_PROFILE
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Browser => "browser",
            Self::Timeout => "timeout",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded recovery.
///
/// Each execution bumps `Context::error_retry_count`. Once it exceeds
/// [`MAX_RETRIES`] the machine is sent to SHUTDOWN; otherwise the state
/// waits out a humanized recovery delay and resumes the cycle. The counter
/// is cleared by completed items, not here.
pub struct ErrorState {
    rng: SharedRandom,
    current_error: String,
}

impl ErrorState {
    pub fn new(rng: SharedRandom) -> Self {
        Self {
            rng,
            current_error: String::from("Unknown error"),
        }
    }

    pub fn current_error(&self) -> &str {
        &self.current_error
    }
}

#[async_trait]
impl StateHandler for ErrorState {
    fn name(&self) -> &str {
        names::ERROR
    }

    async fn on_enter(&mut self, _ctx: &mut Context, data: &TransitionData) {
        self.current_error = data
            .error
            .clone()
            .unwrap_or_else(|| String::from("Unknown error"));
        error!(target: "cadence.state", state = self.name(), error = %self.current_error, "error state entered");
    }

    async fn on_exit(&mut self, _ctx: &mut Context, _data: &TransitionData) {
        info!(target: "cadence.state", state = self.name(), "leaving error state");
    }

    async fn execute(&mut self, ctx: &mut Context) -> Result<Outcome> {
        if let Some(outcome) = check_cancelled(ctx, self.name()) {
            return Ok(outcome);
        }

        ctx.error_retry_count += 1;
        let attempt = ctx.error_retry_count;
        info!(target: "cadence.state", state = self.name(), attempt, max = MAX_RETRIES, "recovery attempt");

        if attempt > MAX_RETRIES {
            warn!(target: "cadence.state", state = self.name(), attempt, "maximum retries exceeded");
            return Ok(Outcome::next_with(
                names::SHUTDOWN,
                TransitionData::reason("Max retries exceeded"),
            ));
        }

        let delay = humanized(&self.rng, RECOVERY_DELAY_MS, RECOVERY_VARIATION);
        pause(self.name(), "recovery", delay).await;

        let class = ErrorClass::classify(&self.current_error);
        let target = class.recovery_state();
        info!(target: "cadence.state", state = self.name(), class = %class, recovery = target, "recovering");
        Ok(Outcome::next(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_case_insensitive_and_ordered() {
        assert_eq!(ErrorClass::classify("Profile loading timeout"), ErrorClass::Profile);
        assert_eq!(ErrorClass::classify("Browser not available"), ErrorClass::Browser);
        assert_eq!(ErrorClass::classify("page crashed"), ErrorClass::Browser);
        assert_eq!(ErrorClass::classify("request timeout"), ErrorClass::Timeout);
        assert_eq!(ErrorClass::classify("Like action failed"), ErrorClass::Generic);
    }

    #[test]
    fn every_class_recovers_at_the_waiting_state() {
        for class in [
            ErrorClass::Profile,
            ErrorClass::Browser,
            ErrorClass::Timeout,
            ErrorClass::Generic,
        ] {
            assert_eq!(class.recovery_state(), names::WAITING_FOR_PROFILE);
        }
    }
}
