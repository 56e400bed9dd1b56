//! End-to-end behaviour of the `MediaRemote` facade over the fake transport.

use std::sync::Arc;
use std::time::Duration;

use mediaremote_api::testing::{FakeTransport, ReplyMode};
use mediaremote_sdk::{
    keys, ChangeHandler, CommandOptions, ExecutionContext, MediaRemote, MediaRemoteConfig, Notification,
    PlaybackCommand, RawChangeEvent, RawPayload, SdkError, SeekDirection,
};
use rstest::rstest;

fn remote_with(transport: &Arc<FakeTransport>, config: MediaRemoteConfig) -> MediaRemote {
    MediaRemote::with_config(transport.clone(), config).unwrap()
}

fn remote(transport: &Arc<FakeTransport>) -> MediaRemote {
    remote_with(transport, MediaRemoteConfig::default())
}

#[test]
fn unknown_code_never_reaches_transport() {
    let transport = Arc::new(FakeTransport::new());
    let remote = remote(&transport);

    assert_eq!(remote.send_code(99, None), Err(SdkError::UnknownCommand(99)));
    assert!(transport.dispatched().is_empty());
}

#[rstest]
#[case::end_without_start(
    vec![PlaybackCommand::EndForwardSeek],
    Some(PlaybackCommand::EndForwardSeek)
)]
#[case::matched_pair(
    vec![PlaybackCommand::StartForwardSeek, PlaybackCommand::EndForwardSeek],
    None
)]
#[case::mismatched_direction(
    vec![PlaybackCommand::StartForwardSeek, PlaybackCommand::EndBackwardSeek],
    Some(PlaybackCommand::EndBackwardSeek)
)]
#[case::backward_pair(
    vec![PlaybackCommand::StartBackwardSeek, PlaybackCommand::EndBackwardSeek],
    None
)]
fn seek_sequences(
    #[case] sequence: Vec<PlaybackCommand>,
    #[case] rejected: Option<PlaybackCommand>,
) {
    let transport = Arc::new(FakeTransport::new());
    let remote = remote(&transport);

    let mut first_rejection = None;
    for command in sequence.iter().copied() {
        match remote.send(command, None) {
            Ok(receipt) => assert_eq!(receipt.command, command),
            Err(SdkError::OutOfOrderCommand { command, .. }) => {
                first_rejection.get_or_insert(command);
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(first_rejection, rejected);
    let sent = sequence.len() - usize::from(rejected.is_some());
    assert_eq!(transport.dispatched().len(), sent);
}

#[test]
fn failed_dispatch_rolls_back_seek_state() {
    let transport = Arc::new(FakeTransport::new());
    let remote = remote(&transport);

    transport.set_unavailable(true);
    assert!(matches!(
        remote.send(PlaybackCommand::StartBackwardSeek, None),
        Err(SdkError::TransportUnavailable(_))
    ));

    transport.set_unavailable(false);
    assert_eq!(
        remote.send(PlaybackCommand::EndBackwardSeek, None),
        Err(SdkError::OutOfOrderCommand {
            command: PlaybackCommand::EndBackwardSeek,
            direction: SeekDirection::Backward,
        })
    );
}

#[test]
fn options_are_forwarded_with_the_code() {
    let transport = Arc::new(FakeTransport::new());
    let remote = remote(&transport);
    let options = CommandOptions::new().with("origin", "menu-bar");

    let receipt = remote
        .send(PlaybackCommand::SkipForward15, Some(options.clone()))
        .unwrap();

    assert_eq!(receipt.options.as_ref(), Some(&options));
    assert_eq!(transport.dispatched(), vec![(13, Some(options))]);
}

#[tokio::test]
async fn send_and_refresh_returns_fresh_snapshot() {
    let transport = Arc::new(FakeTransport::new().with_reply_mode(ReplyMode::ImmediateInfo(
        Some(
            RawPayload::new()
                .with(keys::TRACK_TITLE, "Seven Steps to Heaven")
                .with(keys::IS_PLAYING, false),
        ),
    )));
    let remote = remote(&transport);

    let (receipt, snapshot) = remote
        .send_and_refresh(PlaybackCommand::Pause, None)
        .await
        .unwrap();

    assert_eq!(receipt.command, PlaybackCommand::Pause);
    assert!(!snapshot.is_playing);
    assert_eq!(*remote.current(), snapshot);
    assert_eq!(transport.dispatched(), vec![(1, None)]);
}

#[tokio::test]
async fn send_and_refresh_skips_query_when_dispatch_fails() {
    let transport = Arc::new(FakeTransport::new());
    let remote = remote(&transport);

    let result = remote
        .send_and_refresh(PlaybackCommand::EndForwardSeek, None)
        .await;

    assert!(matches!(result, Err(SdkError::OutOfOrderCommand { .. })));
    assert_eq!(transport.pending_info(), 0);
}

#[tokio::test]
async fn reconcile_after_dispatch_issues_background_query() {
    let transport = Arc::new(FakeTransport::new());
    let remote = remote_with(
        &transport,
        MediaRemoteConfig::default().with_reconcile_after_dispatch(true),
    );

    remote.send(PlaybackCommand::NextTrack, None).unwrap();

    for _ in 0..100 {
        if transport.pending_info() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(transport.pending_info(), 1);
}

#[test]
fn reconcile_without_runtime_is_skipped() {
    let transport = Arc::new(FakeTransport::new());
    let remote = remote_with(
        &transport,
        MediaRemoteConfig::default().with_reconcile_after_dispatch(true),
    );

    assert!(remote.send(PlaybackCommand::Play, None).is_ok());
    assert_eq!(transport.pending_info(), 0);
}

#[tokio::test]
async fn configured_timeout_applies_to_queries() {
    let transport = Arc::new(FakeTransport::new());
    let remote = remote_with(
        &transport,
        MediaRemoteConfig::default().with_query_timeout(Duration::from_millis(10)),
    );

    assert!(matches!(
        remote.is_playing().await,
        Err(SdkError::Timeout { .. })
    ));
}

#[test]
fn subscription_feeds_current_snapshot() {
    let transport = Arc::new(FakeTransport::new());
    let remote = remote_with(&transport, MediaRemoteConfig::background("media.events"));

    let (handle, events) = remote.subscribe_channel().unwrap();
    remote.subscriptions().flush().unwrap();
    assert_eq!(transport.contexts(), vec![ExecutionContext::named("media.events")]);

    transport.emit(RawChangeEvent::info_changed(
        RawPayload::new()
            .with(keys::BUNDLE_IDENTIFIER, "com.apple.Music")
            .with(keys::IS_PLAYING, true),
    ));

    let event = events.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(event.notification, Notification::NowPlayingInfoDidChange);
    assert_eq!(
        remote.current().bundle_identifier.as_deref(),
        Some("com.apple.Music")
    );

    assert!(remote.unsubscribe(handle).unwrap());
    remote.subscriptions().flush().unwrap();
    assert!(!transport.is_registered());
}

#[test]
fn event_sink_updates_store_without_listeners() {
    let transport = Arc::new(FakeTransport::new());
    let remote = remote(&transport);

    remote.event_sink().handle(RawChangeEvent::info_changed(
        RawPayload::new().with(keys::ARTIST_NAME, "Wayne Shorter"),
    ));

    assert_eq!(
        remote.current().artist_name.as_deref(),
        Some("Wayne Shorter")
    );
}

#[test]
fn invalid_config_is_rejected() {
    let transport = Arc::new(FakeTransport::new());
    let result = MediaRemote::with_config(
        transport,
        MediaRemoteConfig::default().with_buffer_size(0),
    );
    assert!(matches!(result, Err(SdkError::Configuration(_))));
}
