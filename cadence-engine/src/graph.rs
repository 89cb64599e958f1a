//! Standard wiring of the ten item-processing states.
use crate::error::EngineError;
use crate::machine::{StateMachine, Transition};
use crate::names;
use crate::states::{
    AnalyzingState, DecidingState, ErrorState, IdleState, LikingState, NopingState,
    ShutdownState, ThinkingState, ViewingPhotosState, WaitingForProfileState,
};
use cadence_behavior::SharedRandom;
use std::time::Duration;

pub use cadence_common::ProfileScope;

#[derive(Debug, Clone)]
pub struct GraphOptions {
    pub profile_scope: ProfileScope,
    /// Delay on the LIKING/NOPING -> IDLE edges.
    pub settle_delay: Duration,
    pub breaks_enabled: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            profile_scope: ProfileScope::Session,
            settle_delay: Duration::from_millis(400),
            breaks_enabled: false,
        }
    }
}

const EDGES: [(&str, &str); 10] = [
    (names::WAITING_FOR_PROFILE, names::ANALYZING),
    (names::ANALYZING, names::THINKING),
    (names::ANALYZING, names::NOPING),
    (names::THINKING, names::VIEWING_PHOTOS),
    (names::VIEWING_PHOTOS, names::DECIDING),
    (names::DECIDING, names::LIKING),
    (names::LIKING, names::IDLE),
    (names::NOPING, names::IDLE),
    (names::IDLE, names::WAITING_FOR_PROFILE),
    (names::ERROR, names::WAITING_FOR_PROFILE),
];

/// Build a machine with every handler registered, every edge defined and
/// WAITING_FOR_PROFILE as the initial state.
///
/// Collaborators and (for [`ProfileScope::Session`]) the profile still have
/// to be installed through [`StateMachine::context_mut`].
pub fn build_machine(rng: SharedRandom, options: GraphOptions) -> Result<StateMachine, EngineError> {
    let mut machine = StateMachine::new();

    machine.register_state(
        names::WAITING_FOR_PROFILE,
        WaitingForProfileState::new(rng.clone(), options.profile_scope),
    )?;
    machine.register_state(names::ANALYZING, AnalyzingState::new())?;
    machine.register_state(names::THINKING, ThinkingState::new(rng.clone()))?;
    machine.register_state(names::VIEWING_PHOTOS, ViewingPhotosState::new(rng.clone()))?;
    machine.register_state(names::DECIDING, DecidingState::new(rng.clone()))?;
    machine.register_state(names::LIKING, LikingState::new())?;
    machine.register_state(names::NOPING, NopingState::new(rng.clone()))?;
    machine.register_state(names::IDLE, IdleState::new(rng.clone(), options.breaks_enabled))?;
    machine.register_state(names::ERROR, ErrorState::new(rng))?;
    machine.register_state(names::SHUTDOWN, ShutdownState::new())?;

    for (from, to) in EDGES {
        let settles = to == names::IDLE;
        let transition = if settles {
            Transition::delayed(options.settle_delay)
        } else {
            Transition::new()
        };
        machine.define_transition(from, to, transition);
    }

    for from in names::ALL {
        if from == names::SHUTDOWN {
            continue;
        }
        if from != names::ERROR {
            machine.define_transition(from, names::ERROR, Transition::new());
        }
        machine.define_transition(from, names::SHUTDOWN, Transition::new());
    }

    machine.set_initial_state(names::WAITING_FOR_PROFILE)?;
    Ok(machine)
}
