//! Validated, fire-and-forget command sending
//!
//! The service gives no completion callback for commands. A successful
//! [`CommandSender::send`] therefore only means the command passed validation
//! and was handed to the transport; whether the now-playing application
//! honoured it cannot be observed here. Callers that need confirmation have
//! to look at the next now-playing snapshot themselves.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::command::{CommandOptions, PlaybackCommand};
use crate::error::{ApiError, Result};
use crate::transport::ServiceTransport;
use crate::validator::{CommandValidator, ValidatedCommand};

/// Record of a command leaving this layer
///
/// Not an acknowledgment: the service never reports back on commands.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReceipt {
    pub command: PlaybackCommand,
    pub options: Option<CommandOptions>,
    pub dispatched_at: DateTime<Utc>,
}

/// Validates commands and forwards the accepted ones to the transport
pub struct CommandSender {
    transport: Arc<dyn ServiceTransport>,
    validator: CommandValidator,
}

impl CommandSender {
    pub fn new(transport: Arc<dyn ServiceTransport>) -> Self {
        Self {
            transport,
            validator: CommandValidator::new(),
        }
    }

    /// Validate and send a typed command
    pub fn send(
        &self,
        command: PlaybackCommand,
        options: Option<CommandOptions>,
    ) -> Result<DispatchReceipt> {
        let validated = self.validator.validate(command, options)?;
        self.dispatch(validated)
    }

    /// Validate and send a raw wire code
    ///
    /// Unknown codes never reach the transport.
    pub fn send_code(&self, code: u32, options: Option<CommandOptions>) -> Result<DispatchReceipt> {
        let validated = self.validator.validate_code(code, options)?;
        self.dispatch(validated)
    }

    pub fn validator(&self) -> &CommandValidator {
        &self.validator
    }

    fn dispatch(&self, validated: ValidatedCommand) -> Result<DispatchReceipt> {
        let code = validated.code();
        let options = validated.options().cloned();

        if let Err(e) = self.transport.dispatch(code, options) {
            tracing::warn!("Failed to dispatch {}: {}", validated.command(), e);
            self.validator.restore(&validated);
            return Err(ApiError::from(e));
        }

        let (command, options) = validated.into_parts();
        tracing::debug!("Dispatched {}", command);

        Ok(DispatchReceipt {
            command,
            options,
            dispatched_at: Utc::now(),
        })
    }
}
