//! Behavioral timing model.
//!
//! - [`random::RandomSource`]: injectable randomness (uniform, weighted,
//!   gaussian, humanized delays) over a swappable [`random::Entropy`]
//! - [`personality::Personality`]: weighted personality ranges
//! - [`profile::BehaviorProfile`]: per-session timing bundle with fatigue
//!   drift and periodic re-randomization
pub mod personality;
pub mod profile;
pub mod random;

pub use personality::{Personality, PersonalityKind, Range};
pub use profile::{BehaviorProfile, PhotoViewing, PointerMovement, TimingBundle};
pub use random::{
    Entropy, RandomError, RandomSource, ScriptedEntropy, SharedRandom, StdEntropy,
};
