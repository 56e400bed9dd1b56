//! Partial now-playing updates

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::now_playing::{Artwork, NowPlayingInfo};

/// Fields a single payload actually reported
///
/// `None` means "not reported", never "cleared": applying a delta keeps the
/// base snapshot's value for every field the payload left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NowPlayingDelta {
    pub is_playing: Option<bool>,
    pub bundle_identifier: Option<String>,
    pub track_title: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub duration: Option<Duration>,
    pub elapsed_time: Option<Duration>,
    pub playback_rate: Option<f64>,
    pub artwork: Option<Artwork>,
}

impl NowPlayingDelta {
    /// True if the payload reported nothing we recognise
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build the next snapshot from `base` plus the reported fields
    pub fn apply(&self, base: &NowPlayingInfo, observed_at: DateTime<Utc>) -> NowPlayingInfo {
        NowPlayingInfo {
            is_playing: self.is_playing.unwrap_or(base.is_playing),
            bundle_identifier: pick(&self.bundle_identifier, &base.bundle_identifier),
            track_title: pick(&self.track_title, &base.track_title),
            artist_name: pick(&self.artist_name, &base.artist_name),
            album_name: pick(&self.album_name, &base.album_name),
            duration: self.duration.or(base.duration),
            elapsed_time: self.elapsed_time.or(base.elapsed_time),
            playback_rate: self.playback_rate.or(base.playback_rate),
            artwork: pick(&self.artwork, &base.artwork),
            observed_at,
        }
    }
}

fn pick<T: Clone>(reported: &Option<T>, base: &Option<T>) -> Option<T> {
    reported.as_ref().or(base.as_ref()).cloned()
}
