//! Change notifications posted by the service

use serde::{Deserialize, Serialize};

use crate::payload::RawPayload;

/// Kinds of change notification the service posts to registered clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Notification {
    /// Now-playing metadata changed
    NowPlayingInfoDidChange,
    /// Playing/paused state changed
    PlaybackStateDidChange,
    /// The application owning now-playing focus went away
    PlayerDidExit,
}

impl Notification {
    /// Notification name as posted by the service
    pub fn name(self) -> &'static str {
        match self {
            Notification::NowPlayingInfoDidChange => {
                "kMRMediaRemoteNowPlayingInfoDidChangeNotification"
            }
            Notification::PlaybackStateDidChange => {
                "kMRMediaRemoteNowPlayingPlaybackStateDidChangeNotification"
            }
            Notification::PlayerDidExit => "kMRMediaRemotePlayerDidExitNotification",
        }
    }

    /// Parse a posted notification name
    pub fn from_name(name: &str) -> Option<Self> {
        [
            Notification::NowPlayingInfoDidChange,
            Notification::PlaybackStateDidChange,
            Notification::PlayerDidExit,
        ]
        .into_iter()
        .find(|n| n.name() == name)
    }
}

/// A change notification exactly as the transport received it
#[derive(Debug, Clone, PartialEq)]
pub struct RawChangeEvent {
    pub notification: Notification,
    pub payload: RawPayload,
}

impl RawChangeEvent {
    pub fn new(notification: Notification, payload: RawPayload) -> Self {
        Self {
            notification,
            payload,
        }
    }

    /// Shorthand for a `NowPlayingInfoDidChange` event
    pub fn info_changed(payload: RawPayload) -> Self {
        Self::new(Notification::NowPlayingInfoDidChange, payload)
    }
}
