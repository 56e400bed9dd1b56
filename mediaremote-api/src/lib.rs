//! # mediaremote-api
//!
//! Type-safe model of the system media-control service: the playback commands
//! it accepts, the payloads it emits, and the [`ServiceTransport`] seam through
//! which everything reaches it.
//!
//! ## Sending commands
//!
//! ```rust,ignore
//! use mediaremote_api::{CommandSender, PlaybackCommand};
//!
//! let sender = CommandSender::new(transport);
//!
//! // Validated, then fire-and-forget
//! let receipt = sender.send(PlaybackCommand::TogglePlayPause, None)?;
//!
//! // Seek pairs are checked for order
//! sender.send(PlaybackCommand::StartForwardSeek, None)?;
//! sender.send(PlaybackCommand::EndForwardSeek, None)?;
//!
//! // Unknown codes are rejected before reaching the transport
//! assert!(sender.send_code(99, None).is_err());
//! ```
//!
//! The service never acknowledges commands. A [`DispatchReceipt`] records that
//! a command left this layer; it says nothing about whether the now-playing
//! application acted on it.

pub mod command;
pub mod error;
pub mod notification;
pub mod payload;
pub mod sender;
pub mod transport;
pub mod validator;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use command::{CommandOptions, OptionValue, PlaybackCommand, SeekDirection, SeekEdge};
pub use error::{ApiError, Result, TransportError};
pub use notification::{Notification, RawChangeEvent};
pub use payload::{keys, PayloadValue, RawPayload};
pub use sender::{CommandSender, DispatchReceipt};
pub use transport::{
    ChangeHandler, ExecutionContext, InfoCompletion, IsPlayingCompletion, ServiceTransport,
};
pub use validator::{CommandValidator, SeekState, SeekTransition, ValidatedCommand};
