//! Named-state execution engine.
//!
//! The machine owns the registered handlers, an advisory transition table and
//! the shared [`Context`]. [`StateMachine::start`] runs a cooperative loop:
//! execute the current handler, apply the transition it asks for, repeat
//! until the stop flag is raised.
//!
//! Every transition runs in a fixed order: exit hook of the old state, the
//! transition delay, the transition callback, then the enter hook of the new
//! state.
use crate::context::{Context, StopHandle, TransitionData};
use crate::error::EngineError;
use crate::names;
use crate::state::{Outcome, StateHandler};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Advisory predicate evaluated against the context before a transition.
pub type Guard = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// Side effect fired between the transition delay and the enter hook.
/// Receives `(previous, next, data)`.
pub type TransitionCallback = Arc<dyn Fn(Option<&str>, &str, &TransitionData) + Send + Sync>;

/// Metadata for a `(from, to)` edge.
#[derive(Clone, Default)]
pub struct Transition {
    pub delay: Duration,
    condition: Option<Guard>,
    on_transition: Option<TransitionCallback>,
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("delay", &self.delay)
            .field("condition", &self.condition.is_some())
            .field("on_transition", &self.on_transition.is_some())
            .finish()
    }
}

impl Transition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delayed(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(Option<&str>, &str, &TransitionData) + Send + Sync + 'static,
    {
        self.on_transition = Some(Arc::new(callback));
        self
    }

    fn permits(&self, ctx: &Context) -> bool {
        self.condition.as_ref().map(|c| c(ctx)).unwrap_or(true)
    }
}

/// ```
/// use async_trait::async_trait;
/// use cadence_engine::{Context, Outcome, StateHandler, StateMachine, Transition};
/// use std::time::Duration;
///
/// struct Ping;
/// struct Done;
///
/// #[async_trait]
/// impl StateHandler for Ping {
///     fn name(&self) -> &str {
///         "PING"
///     }
///     async fn execute(&mut self, _ctx: &mut Context) -> anyhow::Result<Outcome> {
///         Ok(Outcome::next("DONE"))
///     }
/// }
///
/// #[async_trait]
/// impl StateHandler for Done {
///     fn name(&self) -> &str {
///         "DONE"
///     }
///     async fn execute(&mut self, ctx: &mut Context) -> anyhow::Result<Outcome> {
///         ctx.request_stop();
///         Ok(Outcome::Stay)
///     }
/// }
///
/// let mut machine = StateMachine::new();
/// machine.register_state("PING", Ping)?;
/// machine.register_state("DONE", Done)?;
/// machine.define_transition("PING", "DONE", Transition::delayed(Duration::from_millis(5)));
/// machine.set_initial_state("PING")?;
///
/// let runtime = tokio::runtime::Builder::new_current_thread()
///     .enable_time()
///     .build()?;
/// runtime.block_on(machine.start())?;
/// assert_eq!(machine.current_state(), Some("DONE"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct StateMachine {
    states: HashMap<String, Box<dyn StateHandler>>,
    transitions: HashMap<(String, String), Transition>,
    context: Context,
    current: Option<String>,
    is_running: bool,
    stop: StopHandle,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self::with_context(Context::new())
    }

    /// Start from a prepared context.
    pub fn with_context(mut context: Context) -> Self {
        let stop = StopHandle::default();
        context.bind_stop(stop.clone());
        Self {
            states: HashMap::new(),
            transitions: HashMap::new(),
            context,
            current: None,
            is_running: false,
            stop,
        }
    }

    /// Register `handler` under `name`. Names are unique.
    pub fn register_state<H>(&mut self, name: impl Into<String>, handler: H) -> Result<(), EngineError>
    where
        H: StateHandler + 'static,
    {
        let name = name.into();
        if self.states.contains_key(&name) {
            return Err(EngineError::DuplicateState(name));
        }
        self.states.insert(name, Box::new(handler));
        Ok(())
    }

    pub fn set_initial_state(&mut self, name: &str) -> Result<(), EngineError> {
        if !self.states.contains_key(name) {
            return Err(EngineError::UnknownState(name.to_string()));
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    /// Define (or overwrite) the `(from, to)` edge.
    pub fn define_transition(&mut self, from: &str, to: &str, transition: Transition) {
        self.transitions
            .insert((from.to_string(), to.to_string()), transition);
    }

    pub fn transition(&self, from: &str, to: &str) -> Option<&Transition> {
        self.transitions.get(&(from.to_string(), to.to_string()))
    }

    /// Whether the current state has a usable edge to `target`. ERROR and
    /// SHUTDOWN are always reachable.
    pub fn can_transition_to(&self, target: &str) -> bool {
        if target == names::ERROR || target == names::SHUTDOWN {
            return true;
        }
        let Some(current) = self.current.as_deref() else {
            return false;
        };
        self.transition(current, target)
            .map(|t| t.permits(&self.context))
            .unwrap_or(false)
    }

    /// Move to `new_state`.
    ///
    /// Fails before any hook runs if `new_state` is not registered. An
    /// undefined edge or a failing guard is only logged.
    pub async fn transition_to(
        &mut self,
        new_state: &str,
        data: TransitionData,
    ) -> Result<(), EngineError> {
        if !self.states.contains_key(new_state) {
            return Err(EngineError::UnknownState(new_state.to_string()));
        }

        let previous = self.current.clone();
        let transition = previous
            .as_deref()
            .and_then(|from| self.transition(from, new_state))
            .cloned();

        if let Some(from) = previous.as_deref() {
            match &transition {
                None => warn!(
                    target: "cadence.machine",
                    from,
                    to = new_state,
                    "no defined transition; allowing anyway"
                ),
                Some(t) if !t.permits(&self.context) => warn!(
                    target: "cadence.machine",
                    from,
                    to = new_state,
                    "transition guard declined; proceeding"
                ),
                Some(_) => {}
            }

            if let Some(handler) = self.states.get_mut(from) {
                handler.on_exit(&mut self.context, &data).await;
            }
        }

        if let Some(t) = &transition {
            if !t.delay.is_zero() {
                debug!(
                    target: "cadence.machine",
                    delay_ms = t.delay.as_millis() as u64,
                    from = previous.as_deref().unwrap_or("NONE"),
                    to = new_state,
                    "transition delay"
                );
                sleep(t.delay).await;
            }
            if let Some(callback) = &t.on_transition {
                callback(previous.as_deref(), new_state, &data);
            }
        }

        self.current = Some(new_state.to_string());
        info!(
            target: "cadence.machine",
            from = previous.as_deref().unwrap_or("NONE"),
            to = new_state,
            "state changed"
        );

        if let Some(handler) = self.states.get_mut(new_state) {
            handler.on_enter(&mut self.context, &data).await;
        }
        Ok(())
    }

    /// Run until stopped.
    ///
    /// Handler failures go to ERROR; a transition to an unregistered state
    /// aborts the run. A context swapped in through [`context_mut`](Self::context_mut)
    /// is re-bound to this machine's stop flag before the first step.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        let initial = self.current.clone().ok_or(EngineError::NoInitialState)?;

        self.context.bind_stop(self.stop.clone());
        self.is_running = true;
        self.stop.reset();
        info!(target: "cadence.machine", state = %initial, "state machine starting");

        if let Some(handler) = self.states.get_mut(&initial) {
            handler
                .on_enter(&mut self.context, &TransitionData::default())
                .await;
        }

        let result = self.run_loop().await;
        self.is_running = false;
        info!(target: "cadence.machine", "state machine stopped");
        result
    }

    async fn run_loop(&mut self) -> Result<(), EngineError> {
        while self.is_running && !self.stop.is_stopped() {
            let name = self.current.clone().ok_or(EngineError::NoInitialState)?;
            let handler = self
                .states
                .get_mut(&name)
                .ok_or_else(|| EngineError::UnknownState(name.clone()))?;

            let result = handler.execute(&mut self.context).await;
            match result {
                Ok(Outcome::Next { state, data }) => self.transition_to(&state, data).await?,
                Ok(Outcome::Failed(message)) => {
                    error!(target: "cadence.machine", state = %name, error = %message, "state execution error");
                    self.transition_to(names::ERROR, TransitionData::error(message))
                        .await?;
                }
                Ok(Outcome::Stay) => tokio::task::yield_now().await,
                Err(err) => {
                    error!(target: "cadence.machine", state = %name, error = ?err, "state execution failed");
                    self.transition_to(names::ERROR, TransitionData::error(format!("{err:#}")))
                        .await?;
                }
            }
        }
        Ok(())
    }

    /// Request a stop. Takes effect at the next loop boundary.
    pub fn stop(&self) {
        info!(target: "cadence.machine", "stopping state machine");
        self.stop.stop();
    }

    /// Handle for stopping the machine from elsewhere.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn current_state(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn set_context(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.context.set(key, value);
    }

    pub fn state_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.states.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Log registered states and defined edges.
    pub fn describe(&self) {
        let mut edges: Vec<String> = self
            .transitions
            .iter()
            .map(|((from, to), t)| format!("{from}->{to} ({}ms)", t.delay.as_millis()))
            .collect();
        edges.sort();
        info!(
            target: "cadence.machine",
            states = ?self.state_names(),
            transitions = ?edges,
            "state machine configuration"
        );
    }
}
