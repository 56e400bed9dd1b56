//! Snapshot store with atomic replacement
//!
//! The store holds exactly one `Arc<NowPlayingInfo>`. Writers swap in a whole
//! new snapshot; readers clone the `Arc`. Both sides hold the lock only for
//! the pointer swap/clone, so a reader can never observe a half-built
//! snapshot and never waits on anything but another swap.
//!
//! ```text
//! NowPlayingStore
//! └── watch::Sender<Arc<NowPlayingInfo>>
//!         ├── current()  -> Arc clone
//!         ├── replace()  -> unconditional swap
//!         ├── replace_if_newer() -> swap when observed_at is not older
//!         ├── update()   -> read-modify-write under one write lock
//!         └── watch()    -> watch::Receiver for reactive readers
//! ```

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::NowPlayingInfo;

/// Holder of the last known now-playing snapshot
///
/// Cloning the store shares the same underlying snapshot.
#[derive(Clone)]
pub struct NowPlayingStore {
    tx: Arc<watch::Sender<Arc<NowPlayingInfo>>>,
}

impl NowPlayingStore {
    /// Create a store holding the empty snapshot
    pub fn new() -> Self {
        Self::with_snapshot(NowPlayingInfo::default())
    }

    pub fn with_snapshot(snapshot: NowPlayingInfo) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(snapshot));
        Self { tx: Arc::new(tx) }
    }

    /// Last known snapshot; never blocks on I/O
    pub fn current(&self) -> Arc<NowPlayingInfo> {
        Arc::clone(&self.tx.borrow())
    }

    /// Swap in a new snapshot, fully superseding the previous one
    ///
    /// Returns the snapshot it replaced.
    pub fn replace(&self, snapshot: NowPlayingInfo) -> Arc<NowPlayingInfo> {
        self.tx.send_replace(Arc::new(snapshot))
    }

    /// Swap in `snapshot` unless the held one was observed later
    ///
    /// Last-write-wins by `observed_at`; equal timestamps replace. Returns
    /// whether the swap happened.
    pub fn replace_if_newer(&self, snapshot: NowPlayingInfo) -> bool {
        let mut candidate = Some(Arc::new(snapshot));
        let replaced = self.tx.send_if_modified(|held| {
            let newer = candidate
                .as_ref()
                .map_or(false, |c| c.observed_at >= held.observed_at);
            if newer {
                if let Some(c) = candidate.take() {
                    *held = c;
                }
            }
            newer
        });

        if !replaced {
            tracing::debug!("Discarding stale now-playing snapshot");
        }
        replaced
    }

    /// Build the next snapshot from the held one and swap it in atomically
    ///
    /// `f` runs while the write lock is held, so no other writer can slip in
    /// between reading the base and storing the result. It must not call back
    /// into the store. The stored `observed_at` never moves backwards: a
    /// result stamped earlier than the held snapshot keeps the held stamp.
    ///
    /// Returns the snapshot that was stored.
    pub fn update<F>(&self, f: F) -> Arc<NowPlayingInfo>
    where
        F: FnOnce(&NowPlayingInfo) -> NowPlayingInfo,
    {
        let mut stored = None;
        self.tx.send_modify(|held| {
            let mut next = f(held.as_ref());
            if next.observed_at < held.observed_at {
                next.observed_at = held.observed_at;
            }
            let next = Arc::new(next);
            *held = Arc::clone(&next);
            stored = Some(next);
        });

        stored.unwrap_or_else(|| self.current())
    }

    /// Subscribe to snapshot replacements
    pub fn watch(&self) -> watch::Receiver<Arc<NowPlayingInfo>> {
        self.tx.subscribe()
    }
}

impl Default for NowPlayingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NowPlayingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NowPlayingStore")
            .field("current", &self.current())
            .finish()
    }
}
