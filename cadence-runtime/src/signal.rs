//! Cancellation collaborator backed by a [`CancellationToken`].
use cadence_engine::CancellationSignal;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Reports cancellation once the token fires. The token can be cancelled by
/// Ctrl-C, by the runtime finishing the session, or by any collaborator
/// holding a clone.
pub struct TokenSignal {
    token: Arc<CancellationToken>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl TokenSignal {
    pub fn new(token: Arc<CancellationToken>) -> Self {
        Self {
            token,
            listener: Mutex::new(None),
        }
    }

    pub fn token(&self) -> Arc<CancellationToken> {
        self.token.clone()
    }

    /// Cancel the token on the first Ctrl-C. A previous listener is replaced.
    pub fn listen_for_ctrl_c(&self, handle: &Handle) {
        let token = self.token.clone();
        let task = handle.spawn(async move {
            tokio::select! {
                res = tokio::signal::ctrl_c() => match res {
                    Ok(()) => {
                        info!(target: "cadence.signal", "interrupt received; finishing current step");
                        token.cancel();
                    }
                    Err(err) => warn!(target: "cadence.signal", error = %err, "unable to listen for interrupt"),
                },
                _ = token.cancelled() => {}
            }
        });

        let mut slot = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }

    fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl CancellationSignal for TokenSignal {
    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn cleanup(&self) -> anyhow::Result<()> {
        let mut slot = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = slot.take() {
            task.abort();
        }
        Ok(())
    }
}
