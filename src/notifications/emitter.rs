//! Synchronous publish/subscribe primitive backing the registry channels
//!
//! Handlers run on the emitting thread, in registration order. The handler
//! list is snapshotted before fan-out, so a handler may register or
//! deregister handlers on the same emitter; a handler added during an
//! emission is not invoked for that emission.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Identifier for a registered handler, used to deregister it later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HandlerId(u64);

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub(crate) struct Emitter<T> {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(HandlerId, Handler<T>)>>,
}

impl<T> Emitter<T> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: Mutex::new(Vec::new()),
        }
    }

    /// Register a handler, returning the id needed to deregister it
    pub fn on<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.lock().unwrap().push((id, Arc::new(handler)));
        id
    }

    /// Deregister a handler. Returns false if the id was not registered.
    pub fn off(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.lock().unwrap();
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    /// Invoke every registered handler with `payload`, in registration order
    pub fn emit(&self, payload: &T) {
        // Snapshot under the lock, invoke outside it: handlers may call
        // on()/off() on this same emitter.
        let snapshot: Vec<Handler<T>> = self
            .handlers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in snapshot {
            handler(payload);
        }
    }

    #[allow(dead_code)]
    pub fn handler_count(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }
}

/// Deregistration handle returned by the registry's subscribe operations
///
/// Consuming it with [`Subscription::unsubscribe`] removes exactly the
/// subscription that produced it. Dropping it without unsubscribing leaves
/// the handler registered for the registry's lifetime.
pub struct Subscription {
    cancel: Box<dyn FnOnce() + Send>,
}

impl Subscription {
    pub(crate) fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Box::new(cancel),
        }
    }

    /// Deregister the associated handler
    pub fn unsubscribe(self) {
        (self.cancel)();
    }
}
