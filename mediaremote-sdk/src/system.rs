//! MediaRemote - main entry point for the SDK

use std::sync::Arc;
use std::time::Duration;

use mediaremote_api::{
    ChangeHandler, CommandOptions, CommandSender, DispatchReceipt, PlaybackCommand,
    ServiceTransport,
};
use mediaremote_event_manager::{
    EventIterator, Listener, SubscriptionHandle, SubscriptionManager,
};
use mediaremote_state::{NowPlayingInfo, NowPlayingStore};
use tokio::sync::watch;

use crate::config::MediaRemoteConfig;
use crate::error::Result;
use crate::query::QueryCoordinator;

/// Subscribe to, query and control the system now-playing service
///
/// All components share one [`NowPlayingStore`]: change notifications and
/// info queries write to it, [`current`](Self::current) reads it.
///
/// # Commands are not acknowledged
///
/// The service gives no reply to a dispatched command. [`send`](Self::send)
/// returns a [`DispatchReceipt`] which only proves the command left this
/// layer. [`send_and_refresh`](Self::send_and_refresh) follows up with an
/// info query, but a snapshot that looks right is still not proof that the
/// target application honoured the command.
///
/// # Example
///
/// ```rust,ignore
/// use mediaremote_sdk::{MediaRemote, PlaybackCommand};
///
/// let remote = MediaRemote::new(transport)?;
/// let (_handle, events) = remote.subscribe_channel()?;
///
/// let info = remote.now_playing_info().await?;
/// println!("{:?} by {:?}", info.track_title, info.artist_name);
///
/// remote.send(PlaybackCommand::TogglePlayPause, None)?;
/// for event in events.try_iter() {
///     println!("{:?}", event.snapshot);
/// }
/// ```
pub struct MediaRemote {
    config: MediaRemoteConfig,
    store: NowPlayingStore,
    subscriptions: SubscriptionManager,
    queries: QueryCoordinator,
    commands: CommandSender,
}

impl MediaRemote {
    pub fn new(transport: Arc<dyn ServiceTransport>) -> Result<Self> {
        Self::with_config(transport, MediaRemoteConfig::default())
    }

    pub fn with_config(
        transport: Arc<dyn ServiceTransport>,
        config: MediaRemoteConfig,
    ) -> Result<Self> {
        config.validate()?;

        let store = NowPlayingStore::new();
        let subscriptions = SubscriptionManager::with_context(
            Arc::clone(&transport),
            store.clone(),
            config.execution_context.clone(),
        )?;
        let queries = QueryCoordinator::new(
            Arc::clone(&transport),
            store.clone(),
            config.execution_context.clone(),
        );
        let commands = CommandSender::new(transport);

        tracing::debug!("MediaRemote ready on {}", config.execution_context);

        Ok(Self {
            config,
            store,
            subscriptions,
            queries,
            commands,
        })
    }

    /// Add a change listener; the first one registers with the service
    pub fn subscribe<L>(&self, listener: L) -> Result<SubscriptionHandle>
    where
        L: Listener + 'static,
    {
        Ok(self.subscriptions.subscribe(listener)?)
    }

    /// Add a buffered listener sized by `event_buffer_size`
    pub fn subscribe_channel(&self) -> Result<(SubscriptionHandle, EventIterator)> {
        Ok(self
            .subscriptions
            .subscribe_channel(self.config.event_buffer_size)?)
    }

    /// Remove a listener; returns `false` if it was already gone
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<bool> {
        Ok(self.subscriptions.unsubscribe(handle)?)
    }

    /// Query now-playing info with the configured timeout
    pub async fn now_playing_info(&self) -> Result<NowPlayingInfo> {
        self.queries.now_playing_info(self.config.query_timeout).await
    }

    pub async fn now_playing_info_within(&self, timeout: Duration) -> Result<NowPlayingInfo> {
        self.queries.now_playing_info(timeout).await
    }

    /// Query the playing flag with the configured timeout
    pub async fn is_playing(&self) -> Result<bool> {
        self.queries.is_playing(self.config.query_timeout).await
    }

    pub async fn is_playing_within(&self, timeout: Duration) -> Result<bool> {
        self.queries.is_playing(timeout).await
    }

    /// Last known snapshot, without asking the service
    pub fn current(&self) -> Arc<NowPlayingInfo> {
        self.store.current()
    }

    pub fn watch(&self) -> watch::Receiver<Arc<NowPlayingInfo>> {
        self.store.watch()
    }

    /// Validate and dispatch a command
    ///
    /// With `reconcile_after_dispatch` enabled and a tokio runtime available,
    /// an info query is started in the background afterwards.
    pub fn send(
        &self,
        command: PlaybackCommand,
        options: Option<CommandOptions>,
    ) -> Result<DispatchReceipt> {
        let receipt = self.commands.send(command, options)?;
        if self.config.reconcile_after_dispatch {
            self.spawn_reconcile();
        }
        Ok(receipt)
    }

    /// Validate and dispatch a raw command code
    pub fn send_code(&self, code: u32, options: Option<CommandOptions>) -> Result<DispatchReceipt> {
        let receipt = self.commands.send_code(code, options)?;
        if self.config.reconcile_after_dispatch {
            self.spawn_reconcile();
        }
        Ok(receipt)
    }

    /// Dispatch a command, then query the snapshot once
    ///
    /// A failed dispatch is returned as is and no query is issued.
    pub async fn send_and_refresh(
        &self,
        command: PlaybackCommand,
        options: Option<CommandOptions>,
    ) -> Result<(DispatchReceipt, NowPlayingInfo)> {
        let receipt = self.commands.send(command, options)?;
        let snapshot = self
            .queries
            .now_playing_info(self.config.query_timeout)
            .await?;
        Ok((receipt, snapshot))
    }

    /// Handler for a transport that delivers notifications on its own
    pub fn event_sink(&self) -> Arc<dyn ChangeHandler> {
        self.subscriptions.event_sink()
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    pub fn queries(&self) -> &QueryCoordinator {
        &self.queries
    }

    pub fn commands(&self) -> &CommandSender {
        &self.commands
    }

    pub fn config(&self) -> &MediaRemoteConfig {
        &self.config
    }

    fn spawn_reconcile(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No runtime available; skipping reconciliation query");
            return;
        };

        let queries = self.queries.clone();
        let timeout = self.config.query_timeout;
        runtime.spawn(async move {
            if let Err(e) = queries.now_playing_info(timeout).await {
                tracing::debug!("Reconciliation query failed: {}", e);
            }
        });
    }
}

impl std::fmt::Debug for MediaRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaRemote")
            .field("config", &self.config)
            .field("subscriptions", &self.subscriptions)
            .field("queries", &self.queries)
            .finish()
    }
}
