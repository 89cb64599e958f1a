//! Finite-state engine for paced item processing.
//!
//! A [`StateMachine`] owns named [`StateHandler`]s and a shared [`Context`].
//! [`graph::build_machine`] wires the standard ten-state cycle
//! (`WAITING_FOR_PROFILE -> ANALYZING -> ... -> IDLE -> WAITING_FOR_PROFILE`)
//! with bounded error recovery and cooperative cancellation.
pub mod collaborators;
pub mod context;
pub mod error;
pub mod graph;
pub mod machine;
pub mod names;
pub mod state;
pub mod states;

pub use collaborators::{Automation, CancellationSignal};
pub use context::{Context, StopHandle, TransitionData};
pub use error::EngineError;
pub use graph::{build_machine, GraphOptions, ProfileScope};
pub use machine::{Guard, StateMachine, Transition, TransitionCallback};
pub use state::{Outcome, StateHandler};
