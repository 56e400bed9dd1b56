//! Listener contract and fan-out reporting

use std::fmt;
use std::sync::Arc;

use mediaremote_api::Notification;
use mediaremote_state::{NowPlayingDelta, NowPlayingInfo};
use thiserror::Error;

/// Opaque identifier returned by `subscribe`
///
/// Handles are never reused within one manager, so unsubscribing a stale
/// handle cannot remove somebody else's listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(pub(crate) u64);

impl SubscriptionHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription#{}", self.0)
    }
}

/// A decoded change, delivered to every listener
#[derive(Debug, Clone)]
pub struct NowPlayingEvent {
    pub notification: Notification,
    /// Fields the notification reported; `None` when the player exited
    pub delta: Option<NowPlayingDelta>,
    /// Store contents right after the change was applied
    pub snapshot: Arc<NowPlayingInfo>,
}

impl NowPlayingEvent {
    /// Whether this change wiped the snapshot
    pub fn is_cleared(&self) -> bool {
        self.delta.is_none()
    }
}

/// Why a listener could not take an event
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ListenerError {
    #[error("Listener failed: {0}")]
    Failed(String),

    #[error("Listener panicked: {0}")]
    Panicked(String),

    #[error("Listener channel is full")]
    BufferFull,

    #[error("Listener channel disconnected")]
    Disconnected,
}

impl ListenerError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Receiver of now-playing change events
///
/// Listeners are called synchronously on the thread that delivered the
/// notification, in registration order. A listener that returns an error or
/// panics does not stop delivery to the others.
pub trait Listener: Send + Sync {
    fn on_event(&self, event: &NowPlayingEvent) -> Result<(), ListenerError>;
}

impl<F> Listener for F
where
    F: Fn(&NowPlayingEvent) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_event(&self, event: &NowPlayingEvent) -> Result<(), ListenerError> {
        self(event)
    }
}

/// A single listener's failure during fan-out
#[derive(Debug, Clone, PartialEq)]
pub struct ListenerFailure {
    pub handle: SubscriptionHandle,
    pub error: ListenerError,
}

/// Outcome of delivering one event to every listener
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FanOutReport {
    /// Listeners that accepted the event
    pub delivered: usize,
    pub failures: Vec<ListenerFailure>,
}

impl FanOutReport {
    /// Number of listeners the event was offered to
    pub fn attempted(&self) -> usize {
        self.delivered + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Collapse into an error when any listener failed
    pub fn into_result(self) -> crate::Result<usize> {
        if self.failures.is_empty() {
            Ok(self.delivered)
        } else {
            Err(crate::EventManagerError::ListenerFailures {
                failed: self.failures.len(),
                attempted: self.attempted(),
            })
        }
    }
}
