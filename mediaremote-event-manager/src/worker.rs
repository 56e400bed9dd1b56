//! Background worker thread for registration calls
//!
//! The manager decides *whether* to register or unregister while holding its
//! listener lock, then hands the actual transport call to this thread. The
//! channel preserves the order of those decisions, and a slow transport never
//! blocks a subscriber.

use std::fmt;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use mediaremote_api::{ChangeHandler, ExecutionContext, ServiceTransport};
use parking_lot::Mutex;

use crate::error::{EventManagerError, Result};

/// Whether the service currently knows about us
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegistrationState {
    #[default]
    Idle,
    Registered,
    /// The last register call failed; nothing to unregister
    Failed(String),
}

/// Commands sent from the manager to the background worker
pub enum Command {
    /// Register for change notifications on a context
    Register {
        context: ExecutionContext,
        handler: Arc<dyn ChangeHandler>,
    },
    /// Drop the registration, if one was made
    Unregister,
    /// Acknowledge once every earlier command has been handled
    Flush(mpsc::Sender<()>),
    /// Unregister if needed and stop
    Shutdown,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Register { context, .. } => f
                .debug_struct("Register")
                .field("context", context)
                .finish_non_exhaustive(),
            Command::Unregister => write!(f, "Unregister"),
            Command::Flush(_) => write!(f, "Flush"),
            Command::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Spawns the registration worker thread
pub fn spawn_registration_worker(
    transport: Arc<dyn ServiceTransport>,
    state: Arc<Mutex<RegistrationState>>,
    command_rx: mpsc::Receiver<Command>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("mediaremote-registration".to_string())
        .spawn(move || run_command_loop(transport.as_ref(), &state, command_rx))
        .map_err(|e| EventManagerError::WorkerSpawn(e.to_string()))
}

fn run_command_loop(
    transport: &dyn ServiceTransport,
    state: &Mutex<RegistrationState>,
    command_rx: mpsc::Receiver<Command>,
) {
    tracing::debug!("Registration worker started");

    for command in command_rx {
        match command {
            Command::Register { context, handler } => register(transport, state, &context, handler),
            Command::Unregister => unregister(transport, state),
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
            Command::Shutdown => {
                unregister(transport, state);
                break;
            }
        }
    }

    tracing::debug!("Registration worker stopped");
}

fn register(
    transport: &dyn ServiceTransport,
    state: &Mutex<RegistrationState>,
    context: &ExecutionContext,
    handler: Arc<dyn ChangeHandler>,
) {
    if *state.lock() == RegistrationState::Registered {
        tracing::warn!("Register requested while already registered; ignoring");
        return;
    }

    match transport.register(context, handler) {
        Ok(()) => {
            tracing::info!("Registered for now-playing notifications on {}", context);
            *state.lock() = RegistrationState::Registered;
        }
        Err(e) => {
            tracing::warn!("Failed to register for notifications on {}: {}", context, e);
            *state.lock() = RegistrationState::Failed(e.to_string());
        }
    }
}

fn unregister(transport: &dyn ServiceTransport, state: &Mutex<RegistrationState>) {
    // The guard is released before the transport call, which may deliver a
    // final notification to a listener that reads the state
    let previous = std::mem::take(&mut *state.lock());
    if previous != RegistrationState::Registered {
        // A failed register left nothing behind
        return;
    }

    if let Err(e) = transport.unregister() {
        tracing::warn!("Failed to unregister from notifications: {}", e);
    } else {
        tracing::info!("Unregistered from now-playing notifications");
    }
}
