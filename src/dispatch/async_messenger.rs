//! # Asynchronous messenger: concurrent fan-out, wait-for-all fan-in.
//!
//! [`AsyncMessenger`] spawns one tokio task per matching handler and completes
//! the send once every task has finished, successfully or not.
//!
//! ## Architecture
//! ```text
//! send(msg, ctx)
//!     │  Arc<T>
//!     ├──► task 1 ──► handler1.handle(msg) ─┐
//!     ├──► task 2 ──► handler2.handle(msg) ─┼──► JoinSet drain ──► Delivery
//!     └──► task N ──► handlerN.handle(msg) ─┘
//!            ▲
//!            └─ optional semaphore (MessengerConfig::max_parallel)
//! ```
//!
//! ## Rules
//! - **Parallel**: handlers of one send run concurrently, in no defined order.
//! - **Fan-in**: `send` resolves only after all handlers have completed.
//! - **Isolation**: an `Err` or a panic in one handler never aborts another;
//!   it is logged and recorded in the [`Delivery`].
//! - **Cancellation** applies to the whole fan-out only:
//!   - [`AsyncMessenger::send_cancellable`] aborts unfinished handlers when the
//!     token fires and reports them as [`HandlerError::Cancelled`];
//!   - dropping the send future aborts every handler task it spawned.
//! - No timeout: a handler that never completes stalls its send.
//!
//! ## Panics
//! Handlers run on spawned tasks, so a send that matches at least one handler
//! must be polled inside a tokio runtime. Polling it anywhere else panics.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use courier::{AsyncMessenger, MessengerConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let messenger = AsyncMessenger::new(MessengerConfig::default());
//!
//!     messenger
//!         .register("printer", |msg: Arc<String>| async move {
//!             println!("got {msg}");
//!             Ok(())
//!         })
//!         .unwrap();
//!
//!     let delivery = messenger.send(String::from("hello")).await;
//!     assert_eq!(delivery.delivered, 1);
//! }
//! ```

use std::any::type_name;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::MessengerConfig;
use crate::dispatch::Delivery;
use crate::error::{HandlerError, HandlerResult, MessengerError};
use crate::handlers::{panic_message, AsyncSlot, HandlerFn, HandlerRef};
use crate::identity::{Context, Recipient};
use crate::registry::{Registration, Registry};

/// Asynchronous publish/subscribe messenger.
#[derive(Debug)]
pub struct AsyncMessenger {
    registry: Registry,
    config: MessengerConfig,
}

impl AsyncMessenger {
    /// Creates a messenger with its own, empty registry.
    pub fn new(config: MessengerConfig) -> Self {
        Self {
            registry: Registry::new(config.duplicates),
            config,
        }
    }

    /// Registry backing this messenger.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Configuration in effect.
    pub fn config(&self) -> &MessengerConfig {
        &self.config
    }

    /// Registers an async closure for messages of type `T` sent without context.
    pub fn register<T, F, Fut>(
        &self,
        recipient: impl Into<Recipient>,
        f: F,
    ) -> Result<Registration, MessengerError>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.insert(recipient.into(), None, HandlerFn::arc(f))
    }

    /// Registers an async closure for messages of type `T` sent with `context`.
    pub fn register_with_context<T, F, Fut>(
        &self,
        recipient: impl Into<Recipient>,
        context: impl Into<Context>,
        f: F,
    ) -> Result<Registration, MessengerError>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.insert(recipient.into(), Some(context.into()), HandlerFn::arc(f))
    }

    /// Registers an async closure under an optional context.
    pub fn register_in<T, F, Fut>(
        &self,
        recipient: impl Into<Recipient>,
        context: Option<&Context>,
        f: F,
    ) -> Result<Registration, MessengerError>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.insert(recipient.into(), context.cloned(), HandlerFn::arc(f))
    }

    /// Registers a [`Handler`](crate::Handler) implementation.
    ///
    /// Re-registering the same `(recipient, context)` follows
    /// [`MessengerConfig::duplicates`].
    pub fn register_handler<T>(
        &self,
        recipient: impl Into<Recipient>,
        context: Option<&Context>,
        handler: HandlerRef<T>,
    ) -> Result<Registration, MessengerError>
    where
        T: Send + Sync + 'static,
    {
        self.insert(recipient.into(), context.cloned(), handler)
    }

    fn insert<T>(
        &self,
        recipient: Recipient,
        context: Option<Context>,
        handler: HandlerRef<T>,
    ) -> Result<Registration, MessengerError>
    where
        T: Send + Sync + 'static,
    {
        let message_type = type_name::<T>();
        debug!(
            message_type,
            recipient = ?recipient,
            context = ?context,
            "[AsyncMessenger] Register"
        );
        self.registry
            .insert(recipient, context, message_type, AsyncSlot::new(handler))
    }

    /// Removes every registration of `recipient`, whatever the context.
    ///
    /// Returns the number of registrations removed; `0` is not an error.
    pub fn unregister(&self, recipient: impl Into<Recipient>) -> usize {
        let recipient = recipient.into();
        let removed = self.registry.remove_recipient(&recipient);
        debug!(recipient = ?recipient, removed, "[AsyncMessenger] Unregister");
        removed
    }

    /// Removes only the `(recipient, context)` registration.
    pub fn unregister_exact(
        &self,
        recipient: impl Into<Recipient>,
        context: Option<&Context>,
    ) -> bool {
        let recipient = recipient.into();
        let removed = self.registry.remove(&recipient, context);
        debug!(
            recipient = ?recipient,
            context = ?context,
            removed,
            "[AsyncMessenger] Unregister exact"
        );
        removed
    }

    /// Sends `message` to handlers registered without context.
    ///
    /// # Panics
    /// Panics if polled outside a tokio runtime while a handler matches.
    pub async fn send<T>(&self, message: T) -> Delivery
    where
        T: Send + Sync + 'static,
    {
        self.dispatch(message, None, None).await
    }

    /// Sends `message` to handlers registered with `context`.
    ///
    /// # Panics
    /// Same as [`send`](Self::send).
    pub async fn send_with_context<T>(&self, message: T, context: impl Into<Context>) -> Delivery
    where
        T: Send + Sync + 'static,
    {
        let context = context.into();
        self.dispatch(message, Some(&context), None).await
    }

    /// Sends `message` to every handler for `T` registered under exactly `context`.
    ///
    /// # Panics
    /// Same as [`send`](Self::send).
    pub async fn send_in<T>(&self, message: T, context: Option<&Context>) -> Delivery
    where
        T: Send + Sync + 'static,
    {
        self.dispatch(message, context, None).await
    }

    /// Like [`send_in`](Self::send_in), but the whole fan-out stops when
    /// `cancel` fires.
    ///
    /// Handlers that already finished keep their outcome; unfinished ones are
    /// aborted and reported as [`HandlerError::Cancelled`].
    ///
    /// # Panics
    /// Same as [`send`](Self::send).
    pub async fn send_cancellable<T>(
        &self,
        message: T,
        context: Option<&Context>,
        cancel: &CancellationToken,
    ) -> Delivery
    where
        T: Send + Sync + 'static,
    {
        self.dispatch(message, context, Some(cancel)).await
    }

    async fn dispatch<T>(
        &self,
        message: T,
        context: Option<&Context>,
        mut cancel: Option<&CancellationToken>,
    ) -> Delivery
    where
        T: Send + Sync + 'static,
    {
        let message_type = type_name::<T>();
        let targets = self.registry.resolve::<AsyncSlot<T>>(context);
        let mut delivery = Delivery::expecting(targets.len());

        if targets.is_empty() {
            trace!(message_type, context = ?context, "[AsyncMessenger] No recipients");
            return delivery;
        }

        let message = Arc::new(message);
        let permits = self
            .config
            .parallelism_limit()
            .map(|n| Arc::new(Semaphore::new(n)));

        let mut set = JoinSet::new();
        for (idx, target) in targets.iter().enumerate() {
            let handler = target.handler.handler();
            let message = Arc::clone(&message);
            let permits = permits.clone();

            set.spawn(async move {
                let _permit = match permits {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };
                let outcome = AssertUnwindSafe(handler.handle(message))
                    .catch_unwind()
                    .await;
                let result = match outcome {
                    Ok(result) => result,
                    Err(panic_err) => Err(HandlerError::Panicked {
                        info: panic_message(&*panic_err),
                    }),
                };
                (idx, result)
            });
        }

        // Unfilled slots at the end were aborted before reporting.
        let mut results: Vec<Option<HandlerResult>> = (0..targets.len()).map(|_| None).collect();
        loop {
            let next = match cancel {
                Some(token) => tokio::select! {
                    next = set.join_next() => next,
                    _ = token.cancelled() => {
                        debug!(
                            message_type,
                            pending = set.len(),
                            "[AsyncMessenger] Fan-out cancelled"
                        );
                        set.abort_all();
                        cancel = None;
                        continue;
                    }
                },
                None => set.join_next().await,
            };
            match next {
                Some(Ok((idx, result))) => results[idx] = Some(result),
                Some(Err(_aborted)) => {}
                None => break,
            }
        }

        for (target, result) in targets.into_iter().zip(results) {
            let result = result.unwrap_or(Err(HandlerError::Cancelled));
            delivery.record(
                "[AsyncMessenger]",
                message_type,
                target.recipient,
                target.context,
                result,
            );
        }

        trace!(
            message_type,
            context = ?context,
            matched = delivery.matched,
            failed = delivery.failed(),
            "[AsyncMessenger] Sent"
        );
        delivery
    }
}

impl Default for AsyncMessenger {
    fn default() -> Self {
        Self::new(MessengerConfig::default())
    }
}
