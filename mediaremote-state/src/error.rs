//! Error types for mediaremote-state

use thiserror::Error;

/// Result type for mediaremote-state operations
pub type Result<T> = std::result::Result<T, DecodeError>;

/// A payload that could not be projected into the typed model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// A recognised key carried a value of the wrong type
    #[error("Key '{key}' has type {found}, expected {expected}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// A recognised key carried a value outside its legal range
    #[error("Key '{key}' has invalid value: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}
