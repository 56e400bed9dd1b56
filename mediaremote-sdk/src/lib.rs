//! # MediaRemote SDK
//!
//! Client layer over the system now-playing service:
//!
//! - **Subscribe** to now-playing and playback-state changes. Any number of
//!   listeners share one registration with the service.
//! - **Query** the current snapshot or the playing flag. Every call gets its
//!   own correlation id and deadline, and a reply that arrives after the
//!   deadline is discarded.
//! - **Control** the application owning now-playing focus with validated
//!   playback commands.
//!
//! ## Architecture
//!
//! ```text
//! mediaremote-sdk       MediaRemote facade, QueryCoordinator, config, logging
//!     ↓
//! mediaremote-event-manager   SubscriptionManager (ref-counted registration, fan-out)
//!     ↓
//! mediaremote-state     NowPlayingStore, payload decoding
//!     ↓
//! mediaremote-api       commands, CommandValidator, ServiceTransport seam
//! ```
//!
//! The transport that actually talks to the service is supplied by the
//! application as an `Arc<dyn ServiceTransport>`.

pub mod config;
pub mod error;
pub mod logging;
pub mod query;
pub mod system;

pub use config::MediaRemoteConfig;
pub use error::{Result, SdkError};
pub use query::{QueryCoordinator, QueryId, QueryKind};
pub use system::MediaRemote;

pub use mediaremote_api::{
    keys, ChangeHandler, CommandOptions, DispatchReceipt, ExecutionContext, Notification,
    OptionValue, PlaybackCommand, RawChangeEvent, RawPayload, SeekDirection, ServiceTransport,
    TransportError,
};
pub use mediaremote_event_manager::{
    EventIterator, FanOutReport, Listener, ListenerError, NowPlayingEvent, RegistrationState,
    SubscriptionHandle,
};
pub use mediaremote_state::{Artwork, NowPlayingInfo};

#[cfg(feature = "test-support")]
pub use mediaremote_api::testing;

pub mod prelude {
    pub use crate::{
        CommandOptions, MediaRemote, MediaRemoteConfig, NowPlayingEvent, NowPlayingInfo,
        PlaybackCommand, Result, SdkError, SubscriptionHandle,
    };
}
