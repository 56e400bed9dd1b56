//! In-memory [`ServiceTransport`] for tests
//!
//! Records every call, keeps query completions until the test decides to
//! fire them (in any order, or never), and can be flipped into an
//! unavailable mode where every call fails.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::command::CommandOptions;
use crate::error::TransportError;
use crate::notification::RawChangeEvent;
use crate::payload::RawPayload;
use crate::transport::{
    ChangeHandler, ExecutionContext, InfoCompletion, IsPlayingCompletion, ServiceTransport,
};

/// How the fake answers queries
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyMode {
    /// Hold completions until the test fires them
    Hold,
    /// Answer info queries immediately with this payload
    ImmediateInfo(Option<RawPayload>),
    /// Answer is-playing queries immediately with this flag
    ImmediateIsPlaying(bool),
}

/// Recording fake transport
pub struct FakeTransport {
    register_calls: AtomicUsize,
    unregister_calls: AtomicUsize,
    unavailable: AtomicBool,
    reply_mode: Mutex<ReplyMode>,
    contexts: Mutex<Vec<ExecutionContext>>,
    handler: Mutex<Option<Arc<dyn ChangeHandler>>>,
    info_completions: Mutex<Vec<InfoCompletion>>,
    is_playing_completions: Mutex<Vec<IsPlayingCompletion>>,
    dispatched: Mutex<Vec<(u32, Option<CommandOptions>)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            register_calls: AtomicUsize::new(0),
            unregister_calls: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
            reply_mode: Mutex::new(ReplyMode::Hold),
            contexts: Mutex::new(Vec::new()),
            handler: Mutex::new(None),
            info_completions: Mutex::new(Vec::new()),
            is_playing_completions: Mutex::new(Vec::new()),
            dispatched: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply_mode(self, mode: ReplyMode) -> Self {
        *self.reply_mode.lock() = mode;
        self
    }

    pub fn set_reply_mode(&self, mode: ReplyMode) {
        *self.reply_mode.lock() = mode;
    }

    /// Make every subsequent call fail with `Unreachable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn unregister_calls(&self) -> usize {
        self.unregister_calls.load(Ordering::SeqCst)
    }

    /// Contexts passed to `register` and the query calls, in call order
    pub fn contexts(&self) -> Vec<ExecutionContext> {
        self.contexts.lock().clone()
    }

    pub fn dispatched(&self) -> Vec<(u32, Option<CommandOptions>)> {
        self.dispatched.lock().clone()
    }

    pub fn is_registered(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// Deliver a change notification to the registered handler
    ///
    /// Returns `false` when nothing is registered.
    pub fn emit(&self, event: RawChangeEvent) -> bool {
        let handler = self.handler.lock().clone();
        match handler {
            Some(handler) => {
                handler.handle(event);
                true
            }
            None => false,
        }
    }

    pub fn pending_info(&self) -> usize {
        self.info_completions.lock().len()
    }

    pub fn pending_is_playing(&self) -> usize {
        self.is_playing_completions.lock().len()
    }

    /// Take every held info completion, oldest first
    pub fn take_info_completions(&self) -> Vec<InfoCompletion> {
        std::mem::take(&mut *self.info_completions.lock())
    }

    /// Take every held is-playing completion, oldest first
    pub fn take_is_playing_completions(&self) -> Vec<IsPlayingCompletion> {
        std::mem::take(&mut *self.is_playing_completions.lock())
    }

    /// Fire the oldest held info completion
    pub fn complete_next_info(&self, payload: Option<RawPayload>) -> bool {
        let completion = {
            let mut held = self.info_completions.lock();
            if held.is_empty() {
                None
            } else {
                Some(held.remove(0))
            }
        };
        match completion {
            Some(completion) => {
                completion(payload);
                true
            }
            None => false,
        }
    }

    /// Fire the oldest held is-playing completion
    pub fn complete_next_is_playing(&self, playing: bool) -> bool {
        let completion = {
            let mut held = self.is_playing_completions.lock();
            if held.is_empty() {
                None
            } else {
                Some(held.remove(0))
            }
        };
        match completion {
            Some(completion) => {
                completion(playing);
                true
            }
            None => false,
        }
    }

    fn check_available(&self) -> Result<(), TransportError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(TransportError::Unreachable("fake transport offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceTransport for FakeTransport {
    fn register(
        &self,
        context: &ExecutionContext,
        handler: Arc<dyn ChangeHandler>,
    ) -> Result<(), TransportError> {
        self.check_available()?;
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.contexts.lock().push(context.clone());
        *self.handler.lock() = Some(handler);
        Ok(())
    }

    fn unregister(&self) -> Result<(), TransportError> {
        self.check_available()?;
        self.unregister_calls.fetch_add(1, Ordering::SeqCst);
        *self.handler.lock() = None;
        Ok(())
    }

    fn request_info(
        &self,
        context: &ExecutionContext,
        completion: InfoCompletion,
    ) -> Result<(), TransportError> {
        self.check_available()?;
        self.contexts.lock().push(context.clone());
        let mode = self.reply_mode.lock().clone();
        match mode {
            ReplyMode::ImmediateInfo(payload) => completion(payload),
            _ => self.info_completions.lock().push(completion),
        }
        Ok(())
    }

    fn request_is_playing(
        &self,
        context: &ExecutionContext,
        completion: IsPlayingCompletion,
    ) -> Result<(), TransportError> {
        self.check_available()?;
        self.contexts.lock().push(context.clone());
        let mode = self.reply_mode.lock().clone();
        match mode {
            ReplyMode::ImmediateIsPlaying(playing) => completion(playing),
            _ => self.is_playing_completions.lock().push(completion),
        }
        Ok(())
    }

    fn dispatch(
        &self,
        command_code: u32,
        options: Option<CommandOptions>,
    ) -> Result<(), TransportError> {
        self.check_available()?;
        self.dispatched.lock().push((command_code, options));
        Ok(())
    }
}
