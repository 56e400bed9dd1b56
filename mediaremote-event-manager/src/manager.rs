//! Reference-counted subscription manager
//!
//! Any number of listeners share one registration with the service. The first
//! subscribe registers, the last unsubscribe unregisters. Both decisions are
//! taken under the listener lock and queued to the registration worker while
//! still holding it, so the worker sees them in the same order the count
//! changed.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, Weak};
use std::thread::JoinHandle;

use chrono::Utc;
use mediaremote_api::{ChangeHandler, ExecutionContext, RawChangeEvent, ServiceTransport};
use mediaremote_state::{decode_event, DecodedChange, NowPlayingInfo, NowPlayingStore};

use crate::error::{EventManagerError, Result};
use crate::iter::{ChannelListener, EventIterator};
use crate::listener::{
    FanOutReport, Listener, ListenerError, ListenerFailure, NowPlayingEvent, SubscriptionHandle,
};
use crate::worker::{spawn_registration_worker, Command, RegistrationState};

type ListenerList = Vec<(SubscriptionHandle, Arc<dyn Listener>)>;

/// Shares one service registration between many listeners
///
/// Cloning the manager shares the same listeners and registration.
///
/// # Example
///
/// ```rust,ignore
/// use mediaremote_event_manager::{ListenerError, NowPlayingEvent, SubscriptionManager};
///
/// let manager = SubscriptionManager::new(transport, store)?;
/// let handle = manager.subscribe(|event: &NowPlayingEvent| -> Result<(), ListenerError> {
///     println!("now playing: {:?}", event.snapshot.track_title);
///     Ok(())
/// })?;
///
/// // ...
/// manager.unsubscribe(handle)?;
/// ```
#[derive(Clone)]
pub struct SubscriptionManager {
    inner: Arc<Inner>,
}

struct Inner {
    store: NowPlayingStore,
    context: ExecutionContext,

    /// Listeners in registration order; the length is the reference count.
    /// Fan-out clones the `Arc` and iterates without holding the lock.
    listeners: Mutex<Arc<ListenerList>>,

    next_handle: AtomicU64,
    registration: Arc<parking_lot::Mutex<RegistrationState>>,

    command_tx: mpsc::Sender<Command>,
    _worker: JoinHandle<()>,
}

impl SubscriptionManager {
    /// Create a manager that registers on the main execution context
    pub fn new(transport: Arc<dyn ServiceTransport>, store: NowPlayingStore) -> Result<Self> {
        Self::with_context(transport, store, ExecutionContext::main())
    }

    /// Create a manager that registers on `context`
    pub fn with_context(
        transport: Arc<dyn ServiceTransport>,
        store: NowPlayingStore,
        context: ExecutionContext,
    ) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel();
        let registration = Arc::new(parking_lot::Mutex::new(RegistrationState::Idle));
        let worker = spawn_registration_worker(transport, Arc::clone(&registration), command_rx)?;

        Ok(Self {
            inner: Arc::new(Inner {
                store,
                context,
                listeners: Mutex::new(Arc::new(Vec::new())),
                next_handle: AtomicU64::new(1),
                registration,
                command_tx,
                _worker: worker,
            }),
        })
    }

    /// Add a listener
    ///
    /// The first active listener triggers exactly one registration with the
    /// service. Listeners added later are called after the ones already
    /// present.
    pub fn subscribe<L>(&self, listener: L) -> Result<SubscriptionHandle>
    where
        L: Listener + 'static,
    {
        self.subscribe_arc(Arc::new(listener))
    }

    /// Add a listener that buffers events for a pulling consumer
    ///
    /// Events that arrive while `buffer` events are already waiting are
    /// dropped for this listener and reported as a [`ListenerError::BufferFull`]
    /// failure. A zero `buffer` is rejected with
    /// [`EventManagerError::ZeroBuffer`] and nothing is registered.
    pub fn subscribe_channel(&self, buffer: usize) -> Result<(SubscriptionHandle, EventIterator)> {
        if buffer == 0 {
            return Err(EventManagerError::ZeroBuffer);
        }
        let (listener, iter) = ChannelListener::bounded(buffer);
        let handle = self.subscribe_arc(Arc::new(listener))?;
        Ok((handle, iter))
    }

    fn subscribe_arc(&self, listener: Arc<dyn Listener>) -> Result<SubscriptionHandle> {
        let handle = SubscriptionHandle(self.inner.next_handle.fetch_add(1, Ordering::Relaxed));

        let mut listeners = self
            .inner
            .listeners
            .lock()
            .map_err(|_| EventManagerError::LockPoisoned)?;

        if listeners.is_empty() {
            self.inner
                .command_tx
                .send(Command::Register {
                    context: self.inner.context.clone(),
                    handler: self.event_sink(),
                })
                .map_err(|_| EventManagerError::WorkerDisconnected)?;
            tracing::debug!("First listener added; registering on {}", self.inner.context);
        }

        Arc::make_mut(&mut *listeners).push((handle, listener));
        tracing::debug!("Subscribed {} ({} active)", handle, listeners.len());

        Ok(handle)
    }

    /// Remove a listener
    ///
    /// Returns `false` if the handle was not active; unsubscribing twice is
    /// not an error. Removing the last listener triggers exactly one
    /// unregistration.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<bool> {
        let mut listeners = self
            .inner
            .listeners
            .lock()
            .map_err(|_| EventManagerError::LockPoisoned)?;

        let Some(position) = listeners.iter().position(|(h, _)| *h == handle) else {
            tracing::debug!("Unsubscribe of inactive {}", handle);
            return Ok(false);
        };

        Arc::make_mut(&mut *listeners).remove(position);
        tracing::debug!("Unsubscribed {} ({} active)", handle, listeners.len());

        if listeners.is_empty() {
            tracing::debug!("Last listener removed; unregistering");
            self.inner
                .command_tx
                .send(Command::Unregister)
                .map_err(|_| EventManagerError::WorkerDisconnected)?;
        }

        Ok(true)
    }

    /// Decode a change notification, update the store and fan out
    ///
    /// This is what the transport's handler ends up calling; it is public so
    /// a caller driving its own transport can feed events in directly.
    pub fn on_change_event(&self, event: RawChangeEvent) -> Result<FanOutReport> {
        self.inner.on_change_event(event)
    }

    /// Handler that feeds transport notifications into this manager
    ///
    /// This is what gets registered with the transport. It holds the manager
    /// weakly, so a transport that keeps it around does not keep the manager
    /// alive.
    pub fn event_sink(&self) -> Arc<dyn ChangeHandler> {
        Arc::new(EventSink {
            inner: Arc::downgrade(&self.inner),
        })
    }

    /// Number of active listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_subscribed(&self, handle: SubscriptionHandle) -> bool {
        self.inner
            .listeners
            .lock()
            .map(|l| l.iter().any(|(h, _)| *h == handle))
            .unwrap_or(false)
    }

    /// Whether the service registration is currently in place
    ///
    /// Registration happens on the worker thread; call [`flush`](Self::flush)
    /// first to observe the effect of a preceding subscribe or unsubscribe.
    pub fn is_registered(&self) -> bool {
        *self.inner.registration.lock() == RegistrationState::Registered
    }

    pub fn registration_state(&self) -> RegistrationState {
        self.inner.registration.lock().clone()
    }

    /// Block until every queued registration call has been made
    pub fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = mpsc::channel();
        self.inner
            .command_tx
            .send(Command::Flush(ack_tx))
            .map_err(|_| EventManagerError::WorkerDisconnected)?;
        ack_rx.recv().map_err(|_| EventManagerError::WorkerDisconnected)
    }

    pub fn store(&self) -> &NowPlayingStore {
        &self.inner.store
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.inner.context
    }
}

impl Inner {
    fn on_change_event(&self, event: RawChangeEvent) -> Result<FanOutReport> {
        let notification = event.notification;
        let change = decode_event(&event).map_err(|e| {
            tracing::warn!("Dropping {:?} with bad payload: {}", notification, e);
            EventManagerError::InvalidPayload(e)
        })?;

        let now = Utc::now();
        let (delta, snapshot) = match change {
            DecodedChange::Update(delta) => {
                let snapshot = self.store.update(|held| delta.apply(held, now));
                (Some(delta), snapshot)
            }
            DecodedChange::Cleared => (None, self.store.update(|_| NowPlayingInfo::unknown(now))),
        };

        let event = NowPlayingEvent {
            notification,
            delta,
            snapshot,
        };

        let listeners = {
            let guard = self
                .listeners
                .lock()
                .map_err(|_| EventManagerError::LockPoisoned)?;
            Arc::clone(&guard)
        };

        Ok(fan_out(&listeners, &event))
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Shutdown unregisters if a registration is still held
        let _ = self.command_tx.send(Command::Shutdown);
    }
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("context", &self.inner.context)
            .field("listeners", &self.listener_count())
            .field("registration", &self.registration_state())
            .finish()
    }
}

fn fan_out(listeners: &ListenerList, event: &NowPlayingEvent) -> FanOutReport {
    let mut report = FanOutReport::default();

    for (handle, listener) in listeners {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event)))
            .unwrap_or_else(|payload| Err(ListenerError::Panicked(panic_message(payload))));

        match outcome {
            Ok(()) => report.delivered += 1,
            Err(error) => {
                tracing::warn!("Listener {} failed: {}", handle, error);
                report.failures.push(ListenerFailure {
                    handle: *handle,
                    error,
                });
            }
        }
    }

    report
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Handler given to the transport on registration
///
/// Holds the manager weakly; events arriving after the manager is gone are
/// ignored.
struct EventSink {
    inner: Weak<Inner>,
}

impl ChangeHandler for EventSink {
    fn handle(&self, event: RawChangeEvent) {
        let Some(inner) = self.inner.upgrade() else {
            tracing::debug!("Change event after manager shutdown; ignoring");
            return;
        };

        match inner.on_change_event(event) {
            Ok(report) if !report.is_clean() => {
                tracing::warn!(
                    "{} of {} listeners failed",
                    report.failures.len(),
                    report.attempted()
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to process change event: {}", e),
        }
    }
}
