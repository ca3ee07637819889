//! # courier
//!
//! **Courier** is an in-process, typed publish/subscribe messenger for Rust.
//!
//! Subscribers register a handler for one message type under a recipient
//! identity and an optional context (topic). Publishers send a value of some
//! type, optionally with a context, and every matching handler receives it.
//! Publishers and subscribers never reference each other.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   register(recipient, ctx?, handler<T>)          send(msg: T, ctx?)
//!            │                                            │
//!            ▼                                            ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Registry (DashMap<Key, Slot>)                                      │
//! │  Key  = (Recipient, Option<Context>)                                │
//! │  Slot = (message type, type-erased handler)                         │
//! └──────────────────────────────┬──────────────────────────────────────┘
//!                                │ resolve::<T>(ctx)  (exact ctx, type filter)
//!                                ▼
//!                 ┌──────────────┴──────────────┐
//!                 ▼                             ▼
//!       ┌───────────────────┐         ┌────────────────────────┐
//!       │    Messenger      │         │    AsyncMessenger      │
//!       │ caller's thread,  │         │ one tokio task per     │
//!       │ one after another │         │ handler, then fan-in   │
//!       └─────────┬─────────┘         └───────────┬────────────┘
//!                 ▼                               ▼
//!          handler(&msg)                  handler(Arc<msg>).await
//!                 │                               │
//!                 └───────────────┬───────────────┘
//!                                 ▼
//!                     Delivery { matched, delivered, failures }
//! ```
//!
//! ### Matching
//! ```text
//! registration (r, None)      ◄── send(msg)            ✔
//! registration (r, None)      ◄── send(msg, "topic1")  ✘
//! registration (r, "topic1")  ◄── send(msg, "topic1")  ✔
//! registration (r, "topic1")  ◄── send(msg)            ✘
//! registration (r, "topic1")  ◄── send(msg, "topic2")  ✘
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                          |
//! |-------------------|-----------------------------------------------------------------|---------------------------------------------|
//! | **Sync dispatch** | Blocking fan-out on the caller's thread.                        | [`Messenger`]                               |
//! | **Async dispatch**| Concurrent fan-out with fan-in, cancellable.                    | [`AsyncMessenger`]                          |
//! | **Handlers**      | Closures or trait objects for async handlers.                   | [`Handler`], [`HandlerFn`], [`HandlerRef`]  |
//! | **Identity**      | Reference, named, unique or value recipients; typed contexts.   | [`Recipient`], [`Context`]                  |
//! | **Errors**        | Typed registration and handler errors.                          | [`MessengerError`], [`HandlerError`]        |
//! | **Reporting**     | Per-send outcome, failures never propagate to the publisher.    | [`Delivery`], [`Failure`]                   |
//! | **Configuration** | Duplicate policy, async parallelism, panic capture.             | [`MessengerConfig`], [`DuplicatePolicy`]    |
//!
//! ## Optional features
//! - `global` (default): process-wide instances via `Messenger::global()` and
//!   `AsyncMessenger::global()`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use courier::{AsyncMessenger, MessengerConfig};
//!
//! #[derive(Debug)]
//! struct OrderPlaced {
//!     id: u64,
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let messenger = AsyncMessenger::new(MessengerConfig::default());
//!
//!     messenger.register_with_context("billing", "orders", |msg: Arc<OrderPlaced>| async move {
//!         println!("billing order {}", msg.id);
//!         Ok(())
//!     })?;
//!
//!     // Reaches "billing": same type, same context.
//!     let delivery = messenger.send_with_context(OrderPlaced { id: 7 }, "orders").await;
//!     assert_eq!(delivery.delivered, 1);
//!
//!     // Reaches nobody: context does not match.
//!     assert!(messenger.send(OrderPlaced { id: 8 }).await.is_empty());
//!     Ok(())
//! }
//! ```

mod config;
mod dispatch;
mod error;
mod handlers;
mod identity;
mod registry;

// ---- Public re-exports ----

pub use config::{DuplicatePolicy, MessengerConfig};
pub use dispatch::{AsyncMessenger, Delivery, Failure, Messenger};
pub use error::{HandlerError, HandlerResult, MessengerError};
pub use handlers::{Handler, HandlerFn, HandlerRef};
pub use identity::{Context, Recipient};
pub use registry::{Registration, Registry};
