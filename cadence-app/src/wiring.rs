use cadence_behavior::{BehaviorProfile, RandomSource};
use cadence_common::{CadenceError, Result};
use cadence_config::CadenceConfig;
use cadence_drivers::{SimulatedAutomation, SimulationSettings};
use cadence_engine::{
    Automation, CancellationSignal, GraphOptions, ProfileScope, StateMachine, build_machine,
};
use cadence_runtime::TokenSignal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

/// A fully wired machine plus the collaborators it was given.
pub struct Session {
    id: Uuid,
    machine: StateMachine,
    automation: Arc<SimulatedAutomation>,
    signal: Arc<TokenSignal>,
}

impl Session {
    pub fn signal(&self) -> &TokenSignal {
        &self.signal
    }

    pub fn automation(&self) -> &SimulatedAutomation {
        &self.automation
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Run the machine until it reaches SHUTDOWN.
    pub async fn run(&mut self) -> Result<()> {
        let span = info_span!("session", id = %self.id);
        self.machine
            .start()
            .instrument(span)
            .await
            .map_err(|e| CadenceError::Engine(e.into()))?;

        info!(
            target: "cadence.app",
            session = %self.id,
            items = self.automation.items_seen(),
            positives = self.automation.positives(),
            negatives = self.automation.negatives(),
            "session finished"
        );
        Ok(())
    }
}

fn simulation_settings(cfg: &CadenceConfig) -> SimulationSettings {
    SimulationSettings {
        positive_rate: cfg.simulation.positive_rate,
        failure_rate: cfg.simulation.failure_rate,
        min_latency: Duration::from_millis(cfg.simulation.min_latency_ms),
        max_latency: Duration::from_millis(cfg.simulation.max_latency_ms),
        max_items: cfg.session.max_items,
    }
}

/// Wire the standard graph against the dry-run automation. Cancelling the
/// token behind `signal` ends the session cooperatively.
pub fn build_session(cfg: &CadenceConfig, signal: Arc<TokenSignal>) -> Result<Session> {
    let id = Uuid::new_v4();
    let rng = match cfg.session.seed {
        Some(seed) => RandomSource::seeded(seed),
        None => RandomSource::from_entropy(),
    }
    .shared();

    let options = GraphOptions {
        profile_scope: cfg.session.profile_scope,
        settle_delay: Duration::from_millis(cfg.session.settle_delay_ms),
        breaks_enabled: cfg.session.breaks_enabled,
    };
    let mut machine =
        build_machine(rng.clone(), options).map_err(|e| CadenceError::Engine(e.into()))?;

    let automation = Arc::new(SimulatedAutomation::new(
        rng.clone(),
        simulation_settings(cfg),
        signal.token(),
    ));

    let shared_automation: Arc<dyn Automation> = automation.clone();
    let shared_signal: Arc<dyn CancellationSignal> = signal.clone();
    let ctx = machine.context_mut();
    ctx.automation = Some(shared_automation);
    ctx.cancellation = Some(shared_signal);

    if cfg.session.profile_scope == ProfileScope::Session {
        let profile = BehaviorProfile::new(rng);
        profile.log_summary();
        ctx.behavior = Some(profile);
    }

    info!(
        target: "cadence.app",
        session = %id,
        seed = ?cfg.session.seed,
        scope = ?cfg.session.profile_scope,
        max_items = ?cfg.session.max_items,
        "session wired"
    );
    machine.describe();

    Ok(Session {
        id,
        machine,
        automation,
        signal,
    })
}
