//! Configuration for [`MediaRemote`](crate::MediaRemote)

use std::time::Duration;

use mediaremote_api::ExecutionContext;

use crate::error::{Result, SdkError};

#[derive(Debug, Clone, PartialEq)]
pub struct MediaRemoteConfig {
    /// Deadline for queries issued without an explicit timeout
    /// Default: 2 seconds
    pub query_timeout: Duration,

    /// Context on which registrations and query completions are requested
    /// Default: main
    pub execution_context: ExecutionContext,

    /// Buffer for channel-backed listeners
    /// Default: 256
    pub event_buffer_size: usize,

    /// Issue a best-effort info query after every successful dispatch
    /// Default: false
    pub reconcile_after_dispatch: bool,
}

impl Default for MediaRemoteConfig {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(2),
            execution_context: ExecutionContext::main(),
            event_buffer_size: 256,
            reconcile_after_dispatch: false,
        }
    }
}

impl MediaRemoteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Short query deadline for interactive callers
    pub fn responsive() -> Self {
        Self {
            query_timeout: Duration::from_millis(250),
            ..Default::default()
        }
    }

    /// Deliver callbacks on a named background context instead of main
    pub fn background(label: impl Into<String>) -> Self {
        Self {
            execution_context: ExecutionContext::named(label),
            ..Default::default()
        }
    }

    /// Validate the configuration
    ///
    /// A zero query timeout is allowed: it accepts only a reply that is
    /// already available when the query is awaited.
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(SdkError::Configuration(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.execution_context.label().trim().is_empty() {
            return Err(SdkError::Configuration(
                "Execution context label must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_execution_context(mut self, context: ExecutionContext) -> Self {
        self.execution_context = context;
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    pub fn with_reconcile_after_dispatch(mut self, enabled: bool) -> Self {
        self.reconcile_after_dispatch = enabled;
        self
    }
}
