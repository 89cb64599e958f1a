use crate::context::{Context, TransitionData};
use crate::names;
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// What a handler asks the machine to do after `execute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Transition to `state`, handing `data` to the exit/enter hooks.
    Next { state: String, data: TransitionData },
    /// Report a failure without naming a next state; routed to ERROR.
    Failed(String),
    /// No transition. The machine runs the same state again unless stopped.
    Stay,
}

impl Outcome {
    pub fn next(state: &str) -> Self {
        Self::Next {
            state: state.to_string(),
            data: TransitionData::default(),
        }
    }

    pub fn next_with(state: &str, data: TransitionData) -> Self {
        Self::Next {
            state: state.to_string(),
            data,
        }
    }

    /// Transition to ERROR carrying `message`.
    pub fn escalate(message: impl Into<String>) -> Self {
        Self::next_with(names::ERROR, TransitionData::error(message))
    }

    pub fn next_state(&self) -> Option<&str> {
        match self {
            Self::Next { state, .. } => Some(state),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&TransitionData> {
        match self {
            Self::Next { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// A named state registered with a [`StateMachine`](crate::machine::StateMachine).
///
/// Hooks are infallible. `execute` may fail; the machine routes the error to
/// the ERROR state.
#[async_trait]
pub trait StateHandler: Send {
    fn name(&self) -> &str;

    async fn on_enter(&mut self, _ctx: &mut Context, _data: &TransitionData) {
        debug!(target: "cadence.state", state = self.name(), "entering");
    }

    async fn on_exit(&mut self, _ctx: &mut Context, _data: &TransitionData) {
        debug!(target: "cadence.state", state = self.name(), "exiting");
    }

    async fn execute(&mut self, ctx: &mut Context) -> Result<Outcome>;
}
