//! Playback commands and their options
//!
//! The service accepts commands as unsigned integer codes `0..=13`, optionally
//! paired with a dictionary of command-specific options. [`PlaybackCommand`]
//! is the closed, typed view of those codes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A playback-control command understood by the media-control service
///
/// The discriminants are the wire codes sent to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum PlaybackCommand {
    Play = 0,
    Pause = 1,
    TogglePlayPause = 2,
    Stop = 3,
    NextTrack = 4,
    PreviousTrack = 5,
    ToggleShuffle = 6,
    ToggleRepeat = 7,
    StartForwardSeek = 8,
    EndForwardSeek = 9,
    StartBackwardSeek = 10,
    EndBackwardSeek = 11,
    SkipBack15 = 12,
    SkipForward15 = 13,
}

impl PlaybackCommand {
    /// Every command, ordered by wire code
    pub const ALL: [PlaybackCommand; 14] = [
        PlaybackCommand::Play,
        PlaybackCommand::Pause,
        PlaybackCommand::TogglePlayPause,
        PlaybackCommand::Stop,
        PlaybackCommand::NextTrack,
        PlaybackCommand::PreviousTrack,
        PlaybackCommand::ToggleShuffle,
        PlaybackCommand::ToggleRepeat,
        PlaybackCommand::StartForwardSeek,
        PlaybackCommand::EndForwardSeek,
        PlaybackCommand::StartBackwardSeek,
        PlaybackCommand::EndBackwardSeek,
        PlaybackCommand::SkipBack15,
        PlaybackCommand::SkipForward15,
    ];

    /// The wire code for this command
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Look up a command by wire code
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Seek direction and edge, for the four seek-pair commands
    pub fn seek_edge(self) -> Option<(SeekDirection, SeekEdge)> {
        match self {
            PlaybackCommand::StartForwardSeek => Some((SeekDirection::Forward, SeekEdge::Start)),
            PlaybackCommand::EndForwardSeek => Some((SeekDirection::Forward, SeekEdge::End)),
            PlaybackCommand::StartBackwardSeek => Some((SeekDirection::Backward, SeekEdge::Start)),
            PlaybackCommand::EndBackwardSeek => Some((SeekDirection::Backward, SeekEdge::End)),
            _ => None,
        }
    }
}

impl TryFrom<u32> for PlaybackCommand {
    type Error = ApiError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(ApiError::UnknownCommand(code))
    }
}

impl fmt::Display for PlaybackCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Direction of a continuous seek
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeekDirection {
    Forward,
    Backward,
}

/// Which half of a seek pair a command is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeekEdge {
    Start,
    End,
}

/// A primitive option value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Integer(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::String(value)
    }
}

/// Command-specific options; keys are unique by construction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandOptions(BTreeMap<String, OptionValue>);

impl CommandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert an option, returning the value it replaced
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<OptionValue>,
    ) -> Option<OptionValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Check every entry is a well-formed primitive
    pub fn check(&self) -> Result<(), ApiError> {
        for (key, value) in &self.0 {
            if key.trim().is_empty() {
                return Err(ApiError::InvalidOption {
                    key: key.clone(),
                    reason: "empty key".to_string(),
                });
            }
            if let OptionValue::Float(f) = value {
                if !f.is_finite() {
                    return Err(ApiError::InvalidOption {
                        key: key.clone(),
                        reason: format!("non-finite number {}", f),
                    });
                }
            }
        }
        Ok(())
    }
}
