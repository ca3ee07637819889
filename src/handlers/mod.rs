//! # Handler abstractions.
//!
//! This module provides the callback side of the messenger:
//! - [`Handler`] - trait for asynchronous handlers of one message type
//! - [`HandlerFn`] - closure-backed [`Handler`]
//! - [`HandlerRef`] - shared reference to a handler (`Arc<dyn Handler<T>>`)
//!
//! Synchronous handlers are plain closures `Fn(&T) -> HandlerResult`.
//! Internally every handler is stored in a per-message-type slot, which is
//! what lets a single registry hold handlers for many message types.

mod handler;
mod handler_fn;
mod slot;

pub use handler::{Handler, HandlerRef};
pub use handler_fn::HandlerFn;

pub(crate) use slot::{panic_message, AsyncSlot, SyncSlot};
