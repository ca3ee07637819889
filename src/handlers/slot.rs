//! Per-message-type handler slots.
//!
//! The registry stores every handler as `Arc<dyn Any + Send + Sync>`. The
//! concrete type behind it is one of the slots below, parameterised by the
//! message type, so a successful downcast to `SyncSlot<T>` / `AsyncSlot<T>`
//! is exactly the "accepts messages of type `T`" check.

use std::any::Any;
use std::sync::Arc;

use crate::error::HandlerResult;
use crate::handlers::handler::Handler;

type SyncFn<T> = dyn Fn(&T) -> HandlerResult + Send + Sync;

/// Synchronous handler for `T`.
pub(crate) struct SyncSlot<T: 'static> {
    f: Box<SyncFn<T>>,
}

impl<T: 'static> SyncSlot<T> {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> HandlerResult + Send + Sync + 'static,
    {
        Self { f: Box::new(f) }
    }

    pub(crate) fn call(&self, message: &T) -> HandlerResult {
        (self.f)(message)
    }
}

/// Asynchronous handler for `T`.
pub(crate) struct AsyncSlot<T: Send + Sync + 'static> {
    handler: Arc<dyn Handler<T>>,
}

impl<T: Send + Sync + 'static> AsyncSlot<T> {
    pub(crate) fn new(handler: Arc<dyn Handler<T>>) -> Self {
        Self { handler }
    }

    pub(crate) fn handler(&self) -> Arc<dyn Handler<T>> {
        Arc::clone(&self.handler)
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
