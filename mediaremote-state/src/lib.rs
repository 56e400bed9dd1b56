//! Now-playing state for mediaremote-sdk
//!
//! # Architecture
//!
//! ```text
//! RawPayload / RawChangeEvent → decoder → NowPlayingDelta ─┐
//!                                                          ▼
//!                         NowPlayingStore ◀── delta.apply(current) → NowPlayingInfo
//! ```
//!
//! The store is pure data and does no I/O. Deltas carry only what a payload
//! reported; an absent key means "unknown", so the previous value survives.
//!
//! # Quick Start
//!
//! ```rust
//! use chrono::Utc;
//! use mediaremote_api::{keys, RawPayload};
//! use mediaremote_state::{decode_payload, NowPlayingStore};
//!
//! let store = NowPlayingStore::new();
//! let payload = RawPayload::new()
//!     .with(keys::TRACK_TITLE, "So What")
//!     .with(keys::IS_PLAYING, true);
//!
//! let delta = decode_payload(&payload).unwrap();
//! store.replace(delta.apply(&store.current(), Utc::now()));
//!
//! assert_eq!(store.current().track_title.as_deref(), Some("So What"));
//! ```

pub mod decoder;
pub mod error;
pub mod model;
pub mod store;

pub use decoder::{decode_event, decode_payload, DecodedChange};
pub use error::{DecodeError, Result};
pub use model::{Artwork, NowPlayingDelta, NowPlayingInfo};
pub use store::NowPlayingStore;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::decoder::{decode_event, decode_payload, DecodedChange};
    pub use crate::model::{NowPlayingDelta, NowPlayingInfo};
    pub use crate::store::NowPlayingStore;
}
