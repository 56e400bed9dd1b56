//! Delivery of change notifications from the transport to listeners.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use mediaremote_api::testing::FakeTransport;
use mediaremote_api::{keys, Notification, RawChangeEvent, RawPayload};
use mediaremote_event_manager::{ListenerError, NowPlayingEvent, SubscriptionManager};
use mediaremote_state::NowPlayingStore;
use rstest::rstest;

fn setup() -> (Arc<FakeTransport>, SubscriptionManager) {
    let transport = Arc::new(FakeTransport::new());
    let manager = SubscriptionManager::new(transport.clone(), NowPlayingStore::new()).unwrap();
    (transport, manager)
}

fn title(name: &str) -> RawChangeEvent {
    RawChangeEvent::info_changed(RawPayload::new().with(keys::TRACK_TITLE, name))
}

/// Listener that records (listener id, track title) pairs into a shared log
fn recorder(
    id: usize,
    log: &Arc<Mutex<Vec<(usize, Option<String>)>>>,
) -> impl Fn(&NowPlayingEvent) -> Result<(), ListenerError> + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |event: &NowPlayingEvent| -> Result<(), ListenerError> {
        log.lock()
            .unwrap()
            .push((id, event.snapshot.track_title.clone()));
        Ok(())
    }
}

#[test]
fn transport_events_reach_listeners_in_registration_order() {
    let (transport, manager) = setup();
    let log = Arc::new(Mutex::new(Vec::new()));

    for id in 0..3 {
        manager.subscribe(recorder(id, &log)).unwrap();
    }
    manager.flush().unwrap();

    assert!(transport.emit(title("So What")));
    assert!(transport.emit(title("Freddie Freeloader")));

    let so_what = Some("So What".to_string());
    let freddie = Some("Freddie Freeloader".to_string());
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            (0, so_what.clone()),
            (1, so_what.clone()),
            (2, so_what),
            (0, freddie.clone()),
            (1, freddie.clone()),
            (2, freddie),
        ]
    );
}

#[rstest]
#[case::first(0)]
#[case::middle(1)]
#[case::last(2)]
fn failing_listener_does_not_block_others(#[case] failing: usize) {
    let (_transport, manager) = setup();
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for id in 0..3 {
        let handle = if id == failing {
            manager
                .subscribe(|_: &NowPlayingEvent| -> Result<(), ListenerError> {
                    Err(ListenerError::failed("rejected"))
                })
                .unwrap()
        } else {
            manager.subscribe(recorder(id, &log)).unwrap()
        };
        handles.push(handle);
    }

    let report = manager.on_change_event(title("All Blues")).unwrap();

    assert_eq!(report.delivered, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].handle, handles[failing]);
    assert_eq!(log.lock().unwrap().len(), 2);
    assert!(report.into_result().is_err());
}

#[test]
fn unsubscribed_listener_stops_receiving() {
    let (transport, manager) = setup();
    let log = Arc::new(Mutex::new(Vec::new()));

    let keep = manager.subscribe(recorder(0, &log)).unwrap();
    let drop_me = manager.subscribe(recorder(1, &log)).unwrap();
    manager.flush().unwrap();

    transport.emit(title("one"));
    manager.unsubscribe(drop_me).unwrap();
    transport.emit(title("two"));

    let ids: Vec<usize> = log.lock().unwrap().iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![0, 1, 0]);
    assert!(manager.is_subscribed(keep));
}

#[test]
fn events_merge_over_previous_snapshot() {
    let (transport, manager) = setup();
    let (_handle, events) = manager.subscribe_channel(8).unwrap();
    manager.flush().unwrap();

    transport.emit(RawChangeEvent::info_changed(
        RawPayload::new()
            .with(keys::TRACK_TITLE, "Flamenco Sketches")
            .with(keys::ARTIST_NAME, "Miles Davis"),
    ));
    transport.emit(RawChangeEvent::new(
        Notification::PlaybackStateDidChange,
        RawPayload::new().with(keys::IS_PLAYING, true),
    ));

    let first = events.recv_timeout(Duration::from_secs(1)).unwrap();
    let second = events.recv_timeout(Duration::from_secs(1)).unwrap();

    assert!(!first.snapshot.is_playing);
    assert_eq!(second.notification, Notification::PlaybackStateDidChange);
    assert!(second.snapshot.is_playing);
    assert_eq!(second.snapshot.artist_name.as_deref(), Some("Miles Davis"));
    assert_eq!(*manager.store().current(), *second.snapshot);
}

#[test]
fn player_exit_delivers_cleared_snapshot() {
    let (transport, manager) = setup();
    let (_handle, events) = manager.subscribe_channel(8).unwrap();
    manager.flush().unwrap();

    transport.emit(title("Blue in Green"));
    transport.emit(RawChangeEvent::new(
        Notification::PlayerDidExit,
        RawPayload::new(),
    ));

    let cleared = events.try_iter().last().unwrap();
    assert!(cleared.is_cleared());
    assert!(cleared.snapshot.is_empty());
    assert!(manager.store().current().is_empty());
}

#[test]
fn full_channel_is_reported_not_blocking() {
    let (_transport, manager) = setup();
    let (handle, events) = manager.subscribe_channel(1).unwrap();

    assert!(manager.on_change_event(title("a")).unwrap().is_clean());
    let report = manager.on_change_event(title("b")).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].handle, handle);
    assert_eq!(report.failures[0].error, ListenerError::BufferFull);
    assert_eq!(events.try_iter().count(), 1);
}

#[test]
fn events_after_manager_dropped_are_ignored() {
    let (transport, manager) = setup();
    let store = manager.store().clone();
    manager
        .subscribe(|_: &NowPlayingEvent| -> Result<(), ListenerError> { Ok(()) })
        .unwrap();
    manager.flush().unwrap();
    drop(manager);

    // The fake may still hold the handler if shutdown has not run yet; it
    // must not reach a manager that no longer exists
    transport.emit(title("late"));
    assert!(store.current().track_title.is_none());
}
