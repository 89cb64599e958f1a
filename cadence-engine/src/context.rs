use crate::collaborators::{Automation, CancellationSignal};
use cadence_behavior::BehaviorProfile;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Payload carried across a transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recently_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_decision: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TransitionData {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn with_recently_active(mut self, active: bool) -> Self {
        self.is_recently_active = Some(active);
        self
    }

    pub fn with_quick_decision(mut self, quick: bool) -> Self {
        self.quick_decision = Some(quick);
        self
    }
}

/// Cloneable stop flag shared by the machine and everything that may end it.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Ask the machine to stop at its next loop boundary.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// State shared by every handler of a machine.
///
/// Known entries are typed fields; anything else goes through
/// [`Context::get`]/[`Context::set`]. Only one handler runs at a time, so the
/// context is handed out as `&mut` without locking.
#[derive(Default)]
pub struct Context {
    pub automation: Option<Arc<dyn Automation>>,
    pub cancellation: Option<Arc<dyn CancellationSignal>>,
    pub behavior: Option<BehaviorProfile>,
    /// Consecutive ERROR-state executions since the last completed item.
    pub error_retry_count: u32,
    /// Entry payload stashed by states that need it during `execute`.
    pub transition_data: TransitionData,
    values: HashMap<String, Value>,
    stop: StopHandle,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("automation", &self.automation.is_some())
            .field("cancellation", &self.cancellation.is_some())
            .field("behavior", &self.behavior.as_ref().map(|b| b.personality_kind()))
            .field("error_retry_count", &self.error_retry_count)
            .field("transition_data", &self.transition_data)
            .field("values", &self.values)
            .finish()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_automation(mut self, automation: Arc<dyn Automation>) -> Self {
        self.automation = Some(automation);
        self
    }

    pub fn with_cancellation(mut self, cancellation: Arc<dyn CancellationSignal>) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    pub fn with_behavior(mut self, behavior: BehaviorProfile) -> Self {
        self.behavior = Some(behavior);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Polls the cancellation collaborator; `false` when none is installed.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map(|c| c.is_cancelled())
            .unwrap_or(false)
    }

    /// Stop the owning machine once the current step finishes.
    pub fn request_stop(&self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Adopt `stop` so this context ends the machine that owns it.
    pub(crate) fn bind_stop(&mut self, stop: StopHandle) {
        self.stop = stop;
    }
}
