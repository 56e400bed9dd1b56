//! Data model for now-playing state

mod delta;
mod now_playing;

pub use delta::NowPlayingDelta;
pub use now_playing::{Artwork, NowPlayingInfo};
