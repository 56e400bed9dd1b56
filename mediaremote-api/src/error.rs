use thiserror::Error;

use crate::command::{PlaybackCommand, SeekDirection};

/// Errors raised while preparing or sending work to the media-control service
///
/// Every variant is recovered at the component that detects it and handed
/// back to the caller; nothing in this layer is fatal to the process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Command code outside the 14 known values
    ///
    /// Rejected before anything reaches the transport.
    #[error("Unknown command code: {0}")]
    UnknownCommand(u32),

    /// A seek `End*` command arrived while no matching `Start*` was active
    #[error("Out of order command {command:?}: no {direction:?} seek in progress")]
    OutOfOrderCommand {
        command: PlaybackCommand,
        direction: SeekDirection,
    },

    /// A command option is not a well-formed primitive value
    #[error("Invalid option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },

    /// The underlying service call could not be issued
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),
}

/// Failure reported by a [`ServiceTransport`](crate::ServiceTransport) implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The service (or the framework that fronts it) could not be reached
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    /// The service refused the call
    #[error("Call rejected by service: {0}")]
    Rejected(String),
}

impl From<TransportError> for ApiError {
    fn from(error: TransportError) -> Self {
        ApiError::TransportUnavailable(error.to_string())
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;
