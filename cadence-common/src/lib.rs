//! Shared plumbing for the Cadence crates.
//!
//! - [`observability`]: process-wide tracing setup
//! - [`ProfileScope`]: lifetime of a behavior profile, shared by config and engine
//! - [`CadenceError`] and [`Result`]: the error type surfaced by binaries
pub mod observability;
mod scope;

pub use scope::ProfileScope;

/// Errors that reach the top of a Cadence binary.
#[derive(thiserror::Error, Debug)]
pub enum CadenceError {
    /// Configuration was missing, unreadable or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The state engine or one of its collaborators failed.
    #[error("Engine error: {0}")]
    Engine(#[from] anyhow::Error),

    #[error("Logging error: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, CadenceError>;
