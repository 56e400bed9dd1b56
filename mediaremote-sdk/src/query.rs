//! Correlation of asynchronous queries with their completions
//!
//! Each query gets a fresh [`QueryId`] and an entry in a pending table
//! holding the oneshot sender for its caller. Whoever removes the entry first
//! decides the outcome: the transport's completion (reply) or the caller's
//! deadline (timeout). A completion that finds no entry is late and is
//! dropped, so a caller is never resolved twice.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;
use mediaremote_api::{ExecutionContext, RawPayload, ServiceTransport, TransportError};
use mediaremote_state::{decode_payload, NowPlayingInfo, NowPlayingStore};
use tokio::sync::oneshot;

use crate::error::{Result, SdkError};

/// Correlation id of one issued query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(u64);

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Info,
    IsPlaying,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::Info => write!(f, "now-playing info"),
            QueryKind::IsPlaying => write!(f, "is-playing"),
        }
    }
}

struct PendingQuery<T> {
    kind: QueryKind,
    issued_at: Instant,
    slot: oneshot::Sender<T>,
}

type PendingTable<T> = Arc<DashMap<QueryId, PendingQuery<T>>>;

/// Issues queries through the transport and awaits their completions
///
/// Cloning shares the pending tables, so a clone can be moved into a task.
#[derive(Clone)]
pub struct QueryCoordinator {
    transport: Arc<dyn ServiceTransport>,
    store: NowPlayingStore,
    context: ExecutionContext,
    next_id: Arc<AtomicU64>,
    info: PendingTable<Option<RawPayload>>,
    is_playing: PendingTable<bool>,
}

impl QueryCoordinator {
    pub fn new(
        transport: Arc<dyn ServiceTransport>,
        store: NowPlayingStore,
        context: ExecutionContext,
    ) -> Self {
        Self {
            transport,
            store,
            context,
            next_id: Arc::new(AtomicU64::new(1)),
            info: Arc::new(DashMap::new()),
            is_playing: Arc::new(DashMap::new()),
        }
    }

    /// Fetch the now-playing snapshot
    ///
    /// The reply is decoded over the held snapshot (absent keys keep their
    /// last known value) in the same store update that writes it back, so a
    /// change event landing meanwhile is merged rather than overwritten.
    pub async fn now_playing_info(&self, timeout: Duration) -> Result<NowPlayingInfo> {
        let payload = self
            .await_reply(&self.info, QueryKind::Info, timeout, |id, table| {
                self.transport.request_info(
                    &self.context,
                    Box::new(move |payload| resolve(&table, id, payload)),
                )
            })
            .await?;

        let payload = payload.ok_or_else(|| {
            SdkError::InvalidResponse("service returned no now-playing info".to_string())
        })?;
        let delta = decode_payload(&payload).map_err(|e| {
            tracing::warn!("Malformed now-playing reply: {}", e);
            SdkError::from(e)
        })?;

        let now = Utc::now();
        let snapshot = self.store.update(|held| delta.apply(held, now));
        Ok(NowPlayingInfo::clone(&snapshot))
    }

    /// Ask whether the now-playing application is playing
    ///
    /// Does not touch the store.
    pub async fn is_playing(&self, timeout: Duration) -> Result<bool> {
        self.await_reply(&self.is_playing, QueryKind::IsPlaying, timeout, |id, table| {
            self.transport.request_is_playing(
                &self.context,
                Box::new(move |playing| resolve(&table, id, playing)),
            )
        })
        .await
    }

    /// Number of queries still waiting for a reply
    pub fn pending(&self) -> usize {
        self.info.len() + self.is_playing.len()
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    async fn await_reply<T, F>(
        &self,
        table: &PendingTable<T>,
        kind: QueryKind,
        timeout: Duration,
        request: F,
    ) -> Result<T>
    where
        F: FnOnce(QueryId, PendingTable<T>) -> std::result::Result<(), TransportError>,
    {
        let id = QueryId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, mut rx) = oneshot::channel();

        // Registered before the request: a transport may complete inline
        table.insert(
            id,
            PendingQuery {
                kind,
                issued_at: Instant::now(),
                slot: tx,
            },
        );
        tracing::debug!("Issued {} {}", kind, id);

        // Removes the entry if this future is dropped before it settles
        let _guard = PendingGuard { table, id };

        if let Err(e) = request(id, Arc::clone(table)) {
            table.remove(&id);
            tracing::warn!("Failed to issue {} {}: {}", kind, id, e);
            return Err(SdkError::from(e));
        }

        match tokio::time::timeout(timeout, &mut rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(SdkError::TransportUnavailable(format!(
                "{} reply channel closed",
                id
            ))),
            Err(_) => {
                if table.remove(&id).is_none() {
                    // The completion won the race with the deadline
                    if let Ok(value) = rx.try_recv() {
                        return Ok(value);
                    }
                }
                tracing::debug!("{} {} timed out after {:?}", kind, id, timeout);
                Err(SdkError::Timeout {
                    kind,
                    after: timeout,
                })
            }
        }
    }
}

struct PendingGuard<'a, T> {
    table: &'a PendingTable<T>,
    id: QueryId,
}

impl<T> Drop for PendingGuard<'_, T> {
    fn drop(&mut self) {
        if self.table.remove(&self.id).is_some() {
            tracing::debug!("Caller of {} gave up; dropping pending entry", self.id);
        }
    }
}

fn resolve<T>(table: &PendingTable<T>, id: QueryId, value: T) {
    match table.remove(&id) {
        Some((_, pending)) => {
            tracing::debug!(
                "{} {} answered after {:?}",
                pending.kind,
                id,
                pending.issued_at.elapsed()
            );
            if pending.slot.send(value).is_err() {
                tracing::debug!("Caller of {} went away before the reply", id);
            }
        }
        None => tracing::warn!("Discarding late reply for {}", id),
    }
}

impl fmt::Debug for QueryCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCoordinator")
            .field("context", &self.context)
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaremote_api::keys;
    use mediaremote_api::testing::{FakeTransport, ReplyMode};

    fn coordinator(transport: &Arc<FakeTransport>) -> QueryCoordinator {
        QueryCoordinator::new(
            transport.clone(),
            NowPlayingStore::new(),
            ExecutionContext::main(),
        )
    }

    #[tokio::test]
    async fn test_immediate_reply_with_zero_timeout() {
        let transport = Arc::new(FakeTransport::new().with_reply_mode(ReplyMode::ImmediateInfo(
            Some(RawPayload::new().with(keys::TRACK_TITLE, "Nardis")),
        )));
        let queries = coordinator(&transport);

        let info = queries.now_playing_info(Duration::ZERO).await.unwrap();
        assert_eq!(info.track_title.as_deref(), Some("Nardis"));
        assert_eq!(queries.pending(), 0);
    }

    #[tokio::test]
    async fn test_absent_payload_is_invalid_response() {
        let transport = Arc::new(FakeTransport::new().with_reply_mode(ReplyMode::ImmediateInfo(None)));
        let queries = coordinator(&transport);

        assert!(matches!(
            queries.now_playing_info(Duration::from_millis(50)).await,
            Err(SdkError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_clears_pending() {
        let transport = Arc::new(FakeTransport::new());
        transport.set_unavailable(true);
        let queries = coordinator(&transport);

        assert!(matches!(
            queries.is_playing(Duration::from_millis(50)).await,
            Err(SdkError::TransportUnavailable(_))
        ));
        assert_eq!(queries.pending(), 0);
    }

    #[tokio::test]
    async fn test_timeout_clears_pending() {
        let transport = Arc::new(FakeTransport::new());
        let queries = coordinator(&transport);

        let result = queries.is_playing(Duration::from_millis(10)).await;
        assert_eq!(
            result,
            Err(SdkError::Timeout {
                kind: QueryKind::IsPlaying,
                after: Duration::from_millis(10),
            })
        );
        assert_eq!(queries.pending(), 0);
        // The held completion is now late
        assert!(transport.complete_next_is_playing(true));
    }

    #[tokio::test]
    async fn test_cancelled_callers_leave_nothing_pending() {
        let transport = Arc::new(FakeTransport::new());
        let queries = coordinator(&transport);

        for _ in 0..3 {
            let cancelled = tokio::time::timeout(
                Duration::from_millis(1),
                queries.now_playing_info(Duration::from_secs(60)),
            )
            .await;
            assert!(cancelled.is_err());
        }
        assert_eq!(queries.pending(), 0);

        // The transport still holds the completions; they are now late
        assert!(transport.complete_next_info(Some(
            RawPayload::new().with(keys::TRACK_TITLE, "Nardis")
        )));
        assert!(queries.store.current().is_empty());
    }

    #[tokio::test]
    async fn test_requests_use_configured_context() {
        let transport = Arc::new(FakeTransport::new().with_reply_mode(ReplyMode::ImmediateIsPlaying(true)));
        let queries = QueryCoordinator::new(
            transport.clone(),
            NowPlayingStore::new(),
            ExecutionContext::named("media.queries"),
        );

        assert!(queries.is_playing(Duration::from_millis(50)).await.unwrap());
        assert_eq!(
            transport.contexts(),
            vec![ExecutionContext::named("media.queries")]
        );
    }
}
