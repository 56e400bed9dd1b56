//! Now-playing snapshot type

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Artwork bytes attached to the now-playing item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
}

/// Immutable point-in-time record of now-playing metadata and playback flag
///
/// Snapshots are never edited in place. A newer state is a new snapshot, built
/// with [`NowPlayingDelta::apply`](crate::NowPlayingDelta::apply) and swapped
/// into the [`NowPlayingStore`](crate::NowPlayingStore) whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingInfo {
    pub is_playing: bool,
    pub bundle_identifier: Option<String>,
    pub track_title: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub duration: Option<Duration>,
    pub elapsed_time: Option<Duration>,
    pub playback_rate: Option<f64>,
    #[serde(skip)]
    pub artwork: Option<Artwork>,
    pub observed_at: DateTime<Utc>,
}

impl NowPlayingInfo {
    /// A snapshot that knows nothing and is not playing
    pub fn unknown(observed_at: DateTime<Utc>) -> Self {
        Self {
            is_playing: false,
            bundle_identifier: None,
            track_title: None,
            artist_name: None,
            album_name: None,
            duration: None,
            elapsed_time: None,
            playback_rate: None,
            artwork: None,
            observed_at,
        }
    }

    /// Check if the snapshot carries any metadata at all
    pub fn is_empty(&self) -> bool {
        self.bundle_identifier.is_none()
            && self.track_title.is_none()
            && self.artist_name.is_none()
            && self.album_name.is_none()
    }

    /// Extrapolate the playback position at `at`
    ///
    /// Uses the elapsed time recorded at `observed_at` and the playback rate
    /// (1.0 when unknown), clamped to `[0, duration]`. Paused snapshots return
    /// the recorded elapsed time unchanged.
    pub fn estimated_position(&self, at: DateTime<Utc>) -> Option<Duration> {
        let elapsed = self.elapsed_time?;
        if !self.is_playing {
            return Some(elapsed);
        }

        let since = (at - self.observed_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
            .as_secs_f64();
        let rate = self.playback_rate.unwrap_or(1.0);
        let mut position = (elapsed.as_secs_f64() + since * rate).max(0.0);
        if let Some(duration) = self.duration {
            position = position.min(duration.as_secs_f64());
        }

        Some(Duration::from_secs_f64(position))
    }
}

impl Default for NowPlayingInfo {
    fn default() -> Self {
        Self::unknown(DateTime::<Utc>::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn playing_at(observed_at: DateTime<Utc>) -> NowPlayingInfo {
        NowPlayingInfo {
            is_playing: true,
            track_title: Some("Naima".to_string()),
            duration: Some(Duration::from_secs(260)),
            elapsed_time: Some(Duration::from_secs(100)),
            playback_rate: Some(1.0),
            ..NowPlayingInfo::unknown(observed_at)
        }
    }

    #[test]
    fn test_default_is_empty() {
        let info = NowPlayingInfo::default();
        assert!(info.is_empty());
        assert!(!info.is_playing);
        assert_eq!(info.observed_at, DateTime::<Utc>::default());
    }

    #[test]
    fn test_estimated_position_advances_while_playing() {
        let t0 = Utc.with_ymd_and_hms(2024, 11, 1, 12, 0, 0).unwrap();
        let info = playing_at(t0);

        let later = t0 + chrono::Duration::seconds(30);
        assert_eq!(info.estimated_position(later), Some(Duration::from_secs(130)));
    }

    #[test]
    fn test_estimated_position_clamps_to_duration() {
        let t0 = Utc.with_ymd_and_hms(2024, 11, 1, 12, 0, 0).unwrap();
        let info = playing_at(t0);

        let much_later = t0 + chrono::Duration::seconds(3600);
        assert_eq!(
            info.estimated_position(much_later),
            Some(Duration::from_secs(260))
        );
    }

    #[test]
    fn test_estimated_position_paused() {
        let t0 = Utc.with_ymd_and_hms(2024, 11, 1, 12, 0, 0).unwrap();
        let info = NowPlayingInfo {
            is_playing: false,
            ..playing_at(t0)
        };

        let later = t0 + chrono::Duration::seconds(30);
        assert_eq!(info.estimated_position(later), Some(Duration::from_secs(100)));
    }

    #[test]
    fn test_estimated_position_before_observation() {
        let t0 = Utc.with_ymd_and_hms(2024, 11, 1, 12, 0, 0).unwrap();
        let info = playing_at(t0);

        let earlier = t0 - chrono::Duration::seconds(10);
        assert_eq!(info.estimated_position(earlier), Some(Duration::from_secs(100)));
    }
}
