#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use cadence_behavior::BehaviorProfile;
use cadence_common::observability::{init_logging, LogConfig, LogFormat};
use cadence_engine::{Automation, CancellationSignal, Context, Outcome, StateHandler, TransitionData};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::time::Instant;

static INIT_PATH: OnceLock<PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "cadence-tests",
            log_dir: Some(std::env::temp_dir().join("cadence-tests")),
            emit_stderr: true,
            format: if std::env::var("CADENCE_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".to_string(),
        };

        init_logging(config).unwrap_or_default()
    });
}

/// Polled cancellation flag.
#[derive(Default)]
pub struct FlagSignal {
    raised: AtomicBool,
    cleanups: AtomicUsize,
    fail_cleanup: bool,
}

impl FlagSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn raised() -> Arc<Self> {
        let signal = Self::default();
        signal.raise();
        Arc::new(signal)
    }

    pub fn failing_cleanup() -> Arc<Self> {
        Arc::new(Self {
            fail_cleanup: true,
            ..Self::default()
        })
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn cleanups(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }
}

impl CancellationSignal for FlagSignal {
    fn is_cancelled(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    fn cleanup(&self) -> Result<()> {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        if self.fail_cleanup {
            return Err(anyhow!("signal cleanup exploded"));
        }
        Ok(())
    }
}

/// Automation double answering from per-call scripts and logging every call.
///
/// Unscripted calls answer `true`. A call listed in `errors` returns `Err`.
/// With a budget, the shared flag is raised once that many positive or
/// negative actions have succeeded.
#[derive(Default)]
pub struct ScriptedAutomation {
    calls: Mutex<Vec<String>>,
    scripts: Mutex<HashMap<&'static str, VecDeque<bool>>>,
    errors: Mutex<HashMap<&'static str, String>>,
    repeat: Mutex<HashMap<&'static str, bool>>,
    budget: Option<(usize, Arc<FlagSignal>)>,
    completed: AtomicUsize,
    fail_cleanup: bool,
    profile_seen: Mutex<Vec<bool>>,
}

impl ScriptedAutomation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `call` with `results` in order, then `true`.
    pub fn script(self, call: &'static str, results: impl IntoIterator<Item = bool>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(call, results.into_iter().collect());
        self
    }

    /// Answer every `call` with `result`.
    pub fn always(self, call: &'static str, result: bool) -> Self {
        self.repeat.lock().unwrap().insert(call, result);
        self
    }

    pub fn failing(self, call: &'static str, message: &str) -> Self {
        self.errors.lock().unwrap().insert(call, message.to_string());
        self
    }

    pub fn failing_cleanup(mut self) -> Self {
        self.fail_cleanup = true;
        self
    }

    pub fn with_budget(mut self, items: usize, flag: Arc<FlagSignal>) -> Self {
        self.budget = Some((items, flag));
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    /// For each view/pointer call, whether a profile was passed.
    pub fn profile_seen(&self) -> Vec<bool> {
        self.profile_seen.lock().unwrap().clone()
    }

    fn answer(&self, call: &'static str) -> Result<bool> {
        self.calls.lock().unwrap().push(call.to_string());
        if let Some(message) = self.errors.lock().unwrap().get(call) {
            return Err(anyhow!(message.clone()));
        }
        if let Some(result) = self.repeat.lock().unwrap().get(call) {
            return Ok(*result);
        }
        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(call)
            .and_then(|queue| queue.pop_front());
        Ok(scripted.unwrap_or(true))
    }

    fn action(&self, call: &'static str) -> Result<bool> {
        let ok = self.answer(call)?;
        if ok {
            let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((limit, flag)) = &self.budget {
                if done >= *limit {
                    flag.raise();
                }
            }
        }
        Ok(ok)
    }
}

#[async_trait]
impl Automation for ScriptedAutomation {
    async fn wait_for_item(&self) -> Result<bool> {
        self.answer("wait_for_item")
    }

    async fn evaluate_item(&self) -> Result<bool> {
        self.answer("evaluate_item")
    }

    async fn act_positive(&self) -> Result<bool> {
        self.action("act_positive")
    }

    async fn act_negative(&self) -> Result<bool> {
        self.action("act_negative")
    }

    async fn view_detail(&self, profile: Option<&BehaviorProfile>) -> Result<bool> {
        self.profile_seen.lock().unwrap().push(profile.is_some());
        self.answer("view_detail")
    }

    async fn move_pointer(&self, profile: Option<&BehaviorProfile>) -> Result<bool> {
        self.profile_seen.lock().unwrap().push(profile.is_some());
        self.answer("move_pointer")
    }

    async fn dismiss_obstruction(&self) -> Result<bool> {
        self.answer("dismiss_obstruction")
    }

    async fn cleanup(&self) -> Result<()> {
        self.calls.lock().unwrap().push("cleanup".to_string());
        if self.fail_cleanup {
            return Err(anyhow!("automation cleanup exploded"));
        }
        Ok(())
    }
}

pub type EventLog = Arc<Mutex<Vec<(String, Instant)>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
}

pub fn record(log: &EventLog, event: impl Into<String>) {
    log.lock().unwrap().push((event.into(), Instant::now()));
}

/// One scripted `execute` result.
pub enum Step {
    Go(Outcome),
    Fail(&'static str),
}

/// State double logging its hooks. Once its script runs out it stops the
/// machine.
pub struct RecordingState {
    name: String,
    log: EventLog,
    steps: VecDeque<Step>,
}

impl RecordingState {
    pub fn new(name: &str, log: &EventLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            steps: VecDeque::new(),
        }
    }

    pub fn then(mut self, outcome: Outcome) -> Self {
        self.steps.push_back(Step::Go(outcome));
        self
    }

    pub fn then_fail(mut self, message: &'static str) -> Self {
        self.steps.push_back(Step::Fail(message));
        self
    }
}

fn describe(data: &TransitionData) -> String {
    match (&data.error, &data.reason) {
        (Some(error), _) => format!(":{error}"),
        (None, Some(reason)) => format!(":{reason}"),
        _ => String::new(),
    }
}

#[async_trait]
impl StateHandler for RecordingState {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_enter(&mut self, _ctx: &mut Context, data: &TransitionData) {
        record(&self.log, format!("enter:{}{}", self.name, describe(data)));
    }

    async fn on_exit(&mut self, _ctx: &mut Context, _data: &TransitionData) {
        record(&self.log, format!("exit:{}", self.name));
    }

    async fn execute(&mut self, ctx: &mut Context) -> Result<Outcome> {
        record(&self.log, format!("execute:{}", self.name));
        match self.steps.pop_front() {
            Some(Step::Go(outcome)) => Ok(outcome),
            Some(Step::Fail(message)) => Err(anyhow!(message)),
            None => {
                ctx.request_stop();
                Ok(Outcome::Stay)
            }
        }
    }
}
