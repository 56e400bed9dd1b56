//! # MediaRemote Event Manager
//!
//! Reference-counted subscriptions to now-playing change notifications.
//!
//! ## Overview
//!
//! Any number of listeners can subscribe; the service sees a single
//! registration. The first subscriber registers, the last one to leave
//! unregisters. Every change notification is decoded once, written to the
//! shared [`NowPlayingStore`](mediaremote_state::NowPlayingStore), and then
//! handed to each listener in the order they subscribed.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mediaremote_event_manager::SubscriptionManager;
//!
//! let manager = SubscriptionManager::new(transport, store)?;
//! let (handle, events) = manager.subscribe_channel(64)?;
//!
//! for event in events.timeout_iter(std::time::Duration::from_secs(5)) {
//!     println!("{:?}: {:?}", event.notification, event.snapshot.track_title);
//! }
//!
//! manager.unsubscribe(handle)?;
//! ```
//!
//! ## Architecture
//!
//! 1. **Listener list**: held behind one lock; its length is the reference count
//! 2. **Registration worker**: a background thread that makes the actual
//!    register/unregister calls, in the order the count crossed zero
//! 3. **Fan-out**: synchronous, on the delivering thread, without the lock
//!    held; failures and panics are collected into a [`FanOutReport`]

pub mod error;
pub mod iter;
pub mod listener;
pub mod manager;
pub mod worker;

pub use error::{EventManagerError, Result};
pub use iter::EventIterator;
pub use listener::{
    FanOutReport, Listener, ListenerError, ListenerFailure, NowPlayingEvent, SubscriptionHandle,
};
pub use manager::SubscriptionManager;
pub use worker::RegistrationState;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        EventIterator, EventManagerError, FanOutReport, Listener, ListenerError,
        NowPlayingEvent, Result, SubscriptionHandle, SubscriptionManager,
    };
}
