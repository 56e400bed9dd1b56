//! The seam between this crate family and the system media-control service
//!
//! How the service is located and how its entry points are bound is outside
//! this crate. A [`ServiceTransport`] implementation only has to forward the
//! five calls below and hand change notifications to the registered
//! [`ChangeHandler`].

use std::fmt;
use std::sync::Arc;

use crate::command::CommandOptions;
use crate::error::TransportError;
use crate::notification::RawChangeEvent;
use crate::payload::RawPayload;

/// Execution context on which the service delivers callbacks
///
/// Opaque to this layer; the transport maps the label onto whatever queue or
/// runtime it dispatches completions on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutionContext {
    label: String,
}

impl ExecutionContext {
    pub const MAIN_LABEL: &'static str = "main";

    /// The application's main context
    pub fn main() -> Self {
        Self::named(Self::MAIN_LABEL)
    }

    /// A named background context
    pub fn named(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_main(&self) -> bool {
        self.label == Self::MAIN_LABEL
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::main()
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// One-shot completion for an info query; `None` when the service had nothing
pub type InfoCompletion = Box<dyn FnOnce(Option<RawPayload>) + Send + 'static>;

/// One-shot completion for an is-playing query
pub type IsPlayingCompletion = Box<dyn FnOnce(bool) + Send + 'static>;

/// Receiver of change notifications while registered
pub trait ChangeHandler: Send + Sync {
    /// Called by the transport, in posting order, for every notification
    fn handle(&self, event: RawChangeEvent);
}

/// Calls into the system media-control service
///
/// Every method returns once the call has been issued; completions and
/// change notifications arrive later on the requested [`ExecutionContext`].
#[cfg_attr(test, mockall::automock)]
pub trait ServiceTransport: Send + Sync {
    /// Start receiving change notifications
    fn register(
        &self,
        context: &ExecutionContext,
        handler: Arc<dyn ChangeHandler>,
    ) -> Result<(), TransportError>;

    /// Stop receiving change notifications; the service sends no acknowledgment
    fn unregister(&self) -> Result<(), TransportError>;

    /// Ask for the current now-playing dictionary
    fn request_info(
        &self,
        context: &ExecutionContext,
        completion: InfoCompletion,
    ) -> Result<(), TransportError>;

    /// Ask whether the now-playing application is playing
    fn request_is_playing(
        &self,
        context: &ExecutionContext,
        completion: IsPlayingCompletion,
    ) -> Result<(), TransportError>;

    /// Fire-and-forget command send
    fn dispatch(
        &self,
        command_code: u32,
        options: Option<CommandOptions>,
    ) -> Result<(), TransportError>;
}
