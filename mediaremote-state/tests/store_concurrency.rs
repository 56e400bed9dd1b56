//! Concurrent readers and writers on the snapshot store.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use mediaremote_state::{NowPlayingInfo, NowPlayingStore};
use proptest::prelude::*;

fn consistent(n: usize) -> NowPlayingInfo {
    // Title and artist always carry the same index, so a torn read would show
    // a mismatch
    NowPlayingInfo {
        is_playing: n % 2 == 0,
        track_title: Some(format!("track-{}", n)),
        artist_name: Some(format!("artist-{}", n)),
        ..NowPlayingInfo::unknown(Utc::now())
    }
}

#[test]
fn readers_never_see_a_partial_snapshot() {
    let store = NowPlayingStore::new();
    let writers: Vec<_> = (0..4)
        .map(|w| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    store.replace(consistent(w * 1000 + i));
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..2000 {
                    let snapshot = store.current();
                    if let (Some(title), Some(artist)) =
                        (&snapshot.track_title, &snapshot.artist_name)
                    {
                        let t = title.trim_start_matches("track-");
                        let a = artist.trim_start_matches("artist-");
                        assert_eq!(t, a);
                    }
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }
}

#[test]
fn snapshot_held_by_reader_is_unaffected_by_replace() {
    let store = NowPlayingStore::new();
    store.replace(consistent(1));

    let held: Arc<NowPlayingInfo> = store.current();
    store.replace(consistent(2));

    assert_eq!(held.track_title.as_deref(), Some("track-1"));
    assert_eq!(store.current().track_title.as_deref(), Some("track-2"));
}

#[test]
fn concurrent_updates_are_not_lost() {
    let store = NowPlayingStore::new();
    let writers: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    store.update(|held| NowPlayingInfo {
                        elapsed_time: Some(
                            held.elapsed_time.unwrap_or_default() + Duration::from_secs(1),
                        ),
                        observed_at: Utc::now(),
                        ..held.clone()
                    });
                }
            })
        })
        .collect();

    for handle in writers {
        handle.join().unwrap();
    }

    assert_eq!(
        store.current().elapsed_time,
        Some(Duration::from_secs(800))
    );
}

proptest! {
    /// Whatever sequence of replacements happens, `current()` is exactly the
    /// last one.
    #[test]
    fn prop_last_replace_wins(indices in prop::collection::vec(0usize..1000, 1..20)) {
        let store = NowPlayingStore::new();
        for &i in &indices {
            store.replace(consistent(i));
        }
        let last = indices[indices.len() - 1];
        prop_assert_eq!(
            store.current().track_title.clone(),
            Some(format!("track-{}", last))
        );
    }
}
