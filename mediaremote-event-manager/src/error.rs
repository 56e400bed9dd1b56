use mediaremote_state::DecodeError;
use thiserror::Error;

/// Errors that can occur in the subscription manager
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventManagerError {
    /// A change notification carried a malformed payload
    ///
    /// The store is left untouched and no listener is called.
    #[error("Invalid change payload: {0}")]
    InvalidPayload(#[from] DecodeError),

    /// The registration worker thread could not be started
    #[error("Failed to start registration worker: {0}")]
    WorkerSpawn(String),

    /// The registration worker is gone; registration calls cannot be issued
    #[error("Registration worker disconnected")]
    WorkerDisconnected,

    /// One or more listeners failed during fan-out
    ///
    /// Delivery to the remaining listeners still happened.
    #[error("{failed} of {attempted} listeners failed")]
    ListenerFailures { failed: usize, attempted: usize },

    /// A channel listener needs room for at least one event
    #[error("Channel listener buffer must hold at least one event")]
    ZeroBuffer,

    /// Internal lock poisoned
    #[error("Internal lock poisoned")]
    LockPoisoned,
}

/// Result type for Event Manager operations
pub type Result<T> = std::result::Result<T, EventManagerError>;
