//! Tokio runtime that owns one processing session.
//!
//! [`CadenceRuntime`] holds the session [`CancellationToken`]. The engine
//! sees it through [`CadenceRuntime::session_signal`], a [`TokenSignal`] with
//! a Ctrl-C listener already attached. [`CadenceRuntime::run`] drives the
//! session future, then cancels the token and gives stragglers a grace
//! period before the runtime is torn down.
use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub mod signal;

pub use signal::TokenSignal;

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub thread_name: String,
    /// Worker count; tokio picks one per core when `None`.
    pub worker_threads: Option<usize>,
    /// How long spawned tasks get after the session ends.
    pub shutdown_grace: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            thread_name: "cadence-worker".to_string(),
            worker_threads: None,
            shutdown_grace: Duration::from_secs(2),
        }
    }
}

pub struct CadenceRuntime {
    runtime: Runtime,
    cancel: Arc<CancellationToken>,
    grace: Duration,
}

impl CadenceRuntime {
    /// Build a multi-threaded runtime with a fresh session token.
    ///
    /// ```
    /// use cadence_runtime::{CadenceRuntime, RuntimeOptions};
    /// use std::time::Duration;
    ///
    /// let runtime = CadenceRuntime::build(RuntimeOptions {
    ///     worker_threads: Some(1),
    ///     shutdown_grace: Duration::from_millis(10),
    ///     ..RuntimeOptions::default()
    /// })
    /// .expect("runtime builds");
    /// let token = runtime.cancellation();
    ///
    /// assert_eq!(runtime.run(async { 2 + 2 }), 4);
    /// assert!(token.is_cancelled());
    /// ```
    pub fn build(options: RuntimeOptions) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(options.thread_name);

        if let Some(workers) = options.worker_threads {
            builder.worker_threads(workers.max(1));
        }

        Ok(Self {
            runtime: builder.build()?,
            cancel: Arc::new(CancellationToken::new()),
            grace: options.shutdown_grace,
        })
    }

    /// The session token. Cancelling it asks the machine to shut down.
    pub fn cancellation(&self) -> Arc<CancellationToken> {
        self.cancel.clone()
    }

    /// Cancellation collaborator over the session token. The first Ctrl-C
    /// cancels the session.
    pub fn session_signal(&self) -> Arc<TokenSignal> {
        let signal = Arc::new(TokenSignal::new(self.cancel.clone()));
        signal.listen_for_ctrl_c(self.runtime.handle());
        signal
    }

    /// Drive `session` to completion, then cancel the token and shut down.
    pub fn run<F: Future>(self, session: F) -> F::Output {
        let output = self.runtime.block_on(session);
        self.cancel.cancel();
        info!(
            target: "cadence.app",
            grace_ms = self.grace.as_millis() as u64,
            "session over; shutting runtime down"
        );
        self.runtime.shutdown_timeout(self.grace);
        output
    }
}
