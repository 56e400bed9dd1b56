//! Raw now-playing payloads as delivered by the service
//!
//! Both change notifications and info-query replies carry a loosely-typed
//! key/value dictionary. Nothing here interprets it; decoding into a typed
//! snapshot lives in `mediaremote-state`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Dictionary keys the service uses in now-playing payloads
pub mod keys {
    /// Whether the now-playing application is playing (bool)
    pub const IS_PLAYING: &str = "kMRMediaRemoteNowPlayingApplicationIsPlayingKey";
    /// Bundle identifier of the now-playing application (string)
    pub const BUNDLE_IDENTIFIER: &str = "kMRMediaRemoteNowPlayingApplicationBundleIdentifierKey";
    /// Track title (string)
    pub const TRACK_TITLE: &str = "kMRMediaRemoteNowPlayingTrackTitleKey";
    /// Artist name (string)
    pub const ARTIST_NAME: &str = "kMRMediaRemoteNowPlayingArtistNameKey";

    // Info-dictionary keys, present in query replies
    pub const INFO_TITLE: &str = "kMRMediaRemoteNowPlayingInfoTitle";
    pub const INFO_ARTIST: &str = "kMRMediaRemoteNowPlayingInfoArtist";
    pub const INFO_ALBUM: &str = "kMRMediaRemoteNowPlayingInfoAlbum";
    pub const INFO_DURATION: &str = "kMRMediaRemoteNowPlayingInfoDuration";
    pub const INFO_ELAPSED_TIME: &str = "kMRMediaRemoteNowPlayingInfoElapsedTime";
    pub const INFO_PLAYBACK_RATE: &str = "kMRMediaRemoteNowPlayingInfoPlaybackRate";
    pub const INFO_ARTWORK_DATA: &str = "kMRMediaRemoteNowPlayingInfoArtworkData";
    pub const INFO_ARTWORK_MIME_TYPE: &str = "kMRMediaRemoteNowPlayingInfoArtworkMIMEType";
}

/// A single payload value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PayloadValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Data(Vec<u8>),
}

impl PayloadValue {
    /// Short type name, used in decode errors
    pub fn type_name(&self) -> &'static str {
        match self {
            PayloadValue::Bool(_) => "bool",
            PayloadValue::Integer(_) => "integer",
            PayloadValue::Float(_) => "float",
            PayloadValue::String(_) => "string",
            PayloadValue::Data(_) => "data",
        }
    }
}

impl From<bool> for PayloadValue {
    fn from(value: bool) -> Self {
        PayloadValue::Bool(value)
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        PayloadValue::Integer(value)
    }
}

impl From<f64> for PayloadValue {
    fn from(value: f64) -> Self {
        PayloadValue::Float(value)
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::String(value.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        PayloadValue::String(value)
    }
}

impl From<Vec<u8>> for PayloadValue {
    fn from(value: Vec<u8>) -> Self {
        PayloadValue::Data(value)
    }
}

/// Key/value dictionary carried by notifications and info replies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPayload(BTreeMap<String, PayloadValue>);

impl RawPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PayloadValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl FromIterator<(String, PayloadValue)> for RawPayload {
    fn from_iter<I: IntoIterator<Item = (String, PayloadValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
