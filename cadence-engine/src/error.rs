/// Graph wiring mistakes. These are programmer errors and are never recovered
/// automatically.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A state name was referenced that was never registered.
    #[error("State '{0}' not registered")]
    UnknownState(String),

    /// `start` was called before an initial state was set.
    #[error("No initial state set")]
    NoInitialState,

    /// The same state name was registered twice.
    #[error("State '{0}' already registered")]
    DuplicateState(String),
}
