//! Automation collaborators for the Cadence engine.
//!
//! Only a dry-run driver ships today: [`simulated::SimulatedAutomation`]
//! pretends to work through a feed with humanized latency.
pub mod simulated;

pub use simulated::{SimulatedAutomation, SimulationSettings};
