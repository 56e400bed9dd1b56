//! Payload decoder - converts raw service dictionaries into typed deltas
//!
//! Unknown keys are ignored. A recognised key with a value of the wrong type
//! fails the whole payload: a half-decoded dictionary is never applied.

use std::time::Duration;

use mediaremote_api::{keys, Notification, PayloadValue, RawChangeEvent, RawPayload};

use crate::error::{DecodeError, Result};
use crate::model::{Artwork, NowPlayingDelta};

/// What a change notification means for the snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedChange {
    /// Apply these reported fields over the current snapshot
    Update(NowPlayingDelta),
    /// The now-playing application exited; start from an empty snapshot
    Cleared,
}

/// Decode a change notification
pub fn decode_event(event: &RawChangeEvent) -> Result<DecodedChange> {
    match event.notification {
        Notification::PlayerDidExit => Ok(DecodedChange::Cleared),
        Notification::NowPlayingInfoDidChange | Notification::PlaybackStateDidChange => {
            decode_payload(&event.payload).map(DecodedChange::Update)
        }
    }
}

/// Decode a now-playing dictionary into the fields it reports
pub fn decode_payload(payload: &RawPayload) -> Result<NowPlayingDelta> {
    let playback_rate = number(payload, keys::INFO_PLAYBACK_RATE)?;
    if let Some(rate) = playback_rate {
        if !rate.is_finite() {
            return Err(DecodeError::InvalidValue {
                key: keys::INFO_PLAYBACK_RATE,
                reason: format!("non-finite rate {}", rate),
            });
        }
    }

    // Fall back to the rate when the explicit flag is missing
    let is_playing = boolean(payload, keys::IS_PLAYING)?.or(playback_rate.map(|r| r > 0.0));

    let artwork = data(payload, keys::INFO_ARTWORK_DATA)?
        .map(|data| -> Result<Artwork> {
            Ok(Artwork {
                data,
                mime_type: string(payload, keys::INFO_ARTWORK_MIME_TYPE)?,
            })
        })
        .transpose()?;

    Ok(NowPlayingDelta {
        is_playing,
        bundle_identifier: string(payload, keys::BUNDLE_IDENTIFIER)?,
        track_title: first_string(payload, &[keys::TRACK_TITLE, keys::INFO_TITLE])?,
        artist_name: first_string(payload, &[keys::ARTIST_NAME, keys::INFO_ARTIST])?,
        album_name: string(payload, keys::INFO_ALBUM)?,
        duration: seconds(payload, keys::INFO_DURATION)?,
        elapsed_time: seconds(payload, keys::INFO_ELAPSED_TIME)?,
        playback_rate,
        artwork,
    })
}

fn wrong_type(key: &'static str, expected: &'static str, found: &PayloadValue) -> DecodeError {
    DecodeError::WrongType {
        key,
        expected,
        found: found.type_name(),
    }
}

fn boolean(payload: &RawPayload, key: &'static str) -> Result<Option<bool>> {
    match payload.get(key) {
        None => Ok(None),
        Some(PayloadValue::Bool(b)) => Ok(Some(*b)),
        // Numeric booleans show up from some bridges
        Some(PayloadValue::Integer(i)) => Ok(Some(*i != 0)),
        Some(other) => Err(wrong_type(key, "bool", other)),
    }
}

fn string(payload: &RawPayload, key: &'static str) -> Result<Option<String>> {
    match payload.get(key) {
        None => Ok(None),
        Some(PayloadValue::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(wrong_type(key, "string", other)),
    }
}

fn first_string(payload: &RawPayload, candidates: &[&'static str]) -> Result<Option<String>> {
    for key in candidates {
        if let Some(value) = string(payload, *key)? {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

fn number(payload: &RawPayload, key: &'static str) -> Result<Option<f64>> {
    match payload.get(key) {
        None => Ok(None),
        Some(PayloadValue::Float(f)) => Ok(Some(*f)),
        Some(PayloadValue::Integer(i)) => Ok(Some(*i as f64)),
        Some(other) => Err(wrong_type(key, "number", other)),
    }
}

fn seconds(payload: &RawPayload, key: &'static str) -> Result<Option<Duration>> {
    number(payload, key)?
        .map(|secs| {
            Duration::try_from_secs_f64(secs).map_err(|_| DecodeError::InvalidValue {
                key,
                reason: format!("{} is not a valid number of seconds", secs),
            })
        })
        .transpose()
}

fn data(payload: &RawPayload, key: &'static str) -> Result<Option<Vec<u8>>> {
    match payload.get(key) {
        None => Ok(None),
        Some(PayloadValue::Data(bytes)) => Ok(Some(bytes.clone())),
        Some(other) => Err(wrong_type(key, "data", other)),
    }
}
