//! Pull-based consumption of now-playing events
//!
//! A channel subscription is a listener whose only job is to push each event
//! into a bounded queue. The consumer drains that queue on its own thread
//! through [`EventIterator`] instead of running inside the fan-out.

use std::sync::{mpsc, Arc};
use std::time::Duration;

use parking_lot::Mutex;

use crate::listener::{Listener, ListenerError, NowPlayingEvent};

/// Queue end held in the listener list
///
/// Never blocks the fan-out: when `capacity` events are already waiting the
/// new one is refused with [`ListenerError::BufferFull`].
pub(crate) struct ChannelListener {
    tx: mpsc::SyncSender<NowPlayingEvent>,
}

impl ChannelListener {
    /// Queue holding up to `capacity` events; callers reject zero first
    pub(crate) fn bounded(capacity: usize) -> (Self, EventIterator) {
        debug_assert!(capacity > 0, "rendezvous channel would refuse every event");
        let (tx, rx) = mpsc::sync_channel(capacity);
        let events = EventIterator {
            rx: Arc::new(Mutex::new(rx)),
        };
        (Self { tx }, events)
    }
}

impl Listener for ChannelListener {
    fn on_event(&self, event: &NowPlayingEvent) -> Result<(), ListenerError> {
        match self.tx.try_send(event.clone()) {
            Ok(()) => Ok(()),
            Err(mpsc::TrySendError::Full(_)) => Err(ListenerError::BufferFull),
            Err(mpsc::TrySendError::Disconnected(_)) => Err(ListenerError::Disconnected),
        }
    }
}

/// Consumer end of a channel subscription
///
/// Iterating blocks until the next event arrives and ends once the
/// subscription is removed and the queue is drained. Clones share the queue,
/// so each event goes to exactly one of them.
#[derive(Clone)]
pub struct EventIterator {
    rx: Arc<Mutex<mpsc::Receiver<NowPlayingEvent>>>,
}

impl EventIterator {
    /// Wait for the next event; `None` once the subscription is gone
    pub fn recv(&self) -> Option<NowPlayingEvent> {
        self.rx.lock().recv().ok()
    }

    pub fn try_recv(&self) -> Option<NowPlayingEvent> {
        self.rx.lock().try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<NowPlayingEvent> {
        self.rx.lock().recv_timeout(timeout).ok()
    }

    /// Events already queued, without waiting
    pub fn try_iter(&self) -> impl Iterator<Item = NowPlayingEvent> + '_ {
        std::iter::from_fn(move || self.try_recv())
    }

    /// Events as they arrive, stopping at the first gap longer than `timeout`
    pub fn timeout_iter(&self, timeout: Duration) -> impl Iterator<Item = NowPlayingEvent> + '_ {
        std::iter::from_fn(move || self.recv_timeout(timeout))
    }
}

impl Iterator for EventIterator {
    type Item = NowPlayingEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

impl std::fmt::Debug for EventIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventIterator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaremote_api::Notification;
    use mediaremote_state::NowPlayingInfo;

    fn exit_event() -> NowPlayingEvent {
        NowPlayingEvent {
            notification: Notification::PlayerDidExit,
            delta: None,
            snapshot: Arc::new(NowPlayingInfo::default()),
        }
    }

    #[test]
    fn test_queued_events_are_drained() {
        let (listener, events) = ChannelListener::bounded(4);
        listener.on_event(&exit_event()).unwrap();
        listener.on_event(&exit_event()).unwrap();

        assert_eq!(events.try_iter().count(), 2);
        assert!(events.try_recv().is_none());
    }

    #[test]
    fn test_full_queue_refuses_event() {
        let (listener, _events) = ChannelListener::bounded(1);
        listener.on_event(&exit_event()).unwrap();
        assert_eq!(
            listener.on_event(&exit_event()),
            Err(ListenerError::BufferFull)
        );
    }

    #[test]
    fn test_dropped_consumer_reports_disconnect() {
        let (listener, events) = ChannelListener::bounded(1);
        drop(events);
        assert_eq!(
            listener.on_event(&exit_event()),
            Err(ListenerError::Disconnected)
        );
    }

    #[test]
    fn test_timeout_iter_stops_on_gap() {
        let (listener, events) = ChannelListener::bounded(2);
        listener.on_event(&exit_event()).unwrap();

        let start = std::time::Instant::now();
        assert_eq!(events.timeout_iter(Duration::from_millis(30)).count(), 1);
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn test_iteration_ends_after_listener_removed() {
        let (listener, events) = ChannelListener::bounded(2);
        listener.on_event(&exit_event()).unwrap();
        drop(listener);

        assert_eq!(events.count(), 1);
    }

    #[test]
    fn test_clones_split_the_queue() {
        let (listener, first) = ChannelListener::bounded(2);
        let second = first.clone();

        listener.on_event(&exit_event()).unwrap();
        assert!(second.try_recv().is_some());
        assert!(first.try_recv().is_none());
    }
}
