//! Names of the states in the standard graph.

pub const WAITING_FOR_PROFILE: &str = "WAITING_FOR_PROFILE";
pub const ANALYZING: &str = "ANALYZING";
pub const THINKING: &str = "THINKING";
pub const VIEWING_PHOTOS: &str = "VIEWING_PHOTOS";
pub const DECIDING: &str = "DECIDING";
pub const LIKING: &str = "LIKING";
pub const NOPING: &str = "NOPING";
pub const IDLE: &str = "IDLE";
pub const ERROR: &str = "ERROR";
pub const SHUTDOWN: &str = "SHUTDOWN";

/// Every state of the standard graph, in registration order.
pub const ALL: [&str; 10] = [
    WAITING_FOR_PROFILE,
    ANALYZING,
    THINKING,
    VIEWING_PHOTOS,
    DECIDING,
    LIKING,
    NOPING,
    IDLE,
    ERROR,
    SHUTDOWN,
];
