use std::time::Duration;

use mediaremote_api::{ApiError, PlaybackCommand, SeekDirection, TransportError};
use mediaremote_event_manager::EventManagerError;
use mediaremote_state::DecodeError;
use thiserror::Error;

use crate::query::QueryKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SdkError {
    /// The query's deadline passed before the service replied
    #[error("{kind} query timed out after {after:?}")]
    Timeout { kind: QueryKind, after: Duration },

    /// The service replied with nothing, or with something undecodable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unknown command code: {0}")]
    UnknownCommand(u32),

    #[error("Out of order command {command}: no {direction:?} seek in progress")]
    OutOfOrderCommand {
        command: PlaybackCommand,
        direction: SeekDirection,
    },

    #[error("Invalid option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },

    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("Event manager error: {0}")]
    EventManager(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl From<ApiError> for SdkError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::UnknownCommand(code) => SdkError::UnknownCommand(code),
            ApiError::OutOfOrderCommand { command, direction } => {
                SdkError::OutOfOrderCommand { command, direction }
            }
            ApiError::InvalidOption { key, reason } => SdkError::InvalidOption { key, reason },
            ApiError::TransportUnavailable(reason) => SdkError::TransportUnavailable(reason),
        }
    }
}

impl From<TransportError> for SdkError {
    fn from(error: TransportError) -> Self {
        SdkError::TransportUnavailable(error.to_string())
    }
}

impl From<DecodeError> for SdkError {
    fn from(error: DecodeError) -> Self {
        SdkError::InvalidResponse(error.to_string())
    }
}

impl From<EventManagerError> for SdkError {
    fn from(error: EventManagerError) -> Self {
        match error {
            EventManagerError::InvalidPayload(e) => SdkError::from(e),
            EventManagerError::ZeroBuffer => {
                SdkError::Configuration(EventManagerError::ZeroBuffer.to_string())
            }
            other => SdkError::EventManager(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SdkError>;
