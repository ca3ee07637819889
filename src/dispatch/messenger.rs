//! # Synchronous messenger.
//!
//! [`Messenger`] delivers a message to every matching handler on the calling
//! thread and returns once all of them have returned.
//!
//! ## Rules
//! - **Exact context**: a send without context only reaches registrations
//!   without context, and the other way round.
//! - **Type filtered**: a handler registered for `T` only sees sends of `T`.
//! - **Isolation**: a handler returning `Err` or panicking is logged and
//!   recorded; the remaining handlers still run and `send` never fails.
//! - **No ordering** between handlers of one send.
//! - **Reentrancy**: no registry lock is held while handlers run, so a handler
//!   may register, unregister or send.
//!
//! ## Panic handling
//! Handlers run under `catch_unwind` (unless `capture_panics` is off):
//! - The panic is converted to [`HandlerError::Panicked`]
//! - Delivery continues with the next handler
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a handler uses `Arc<Mutex<T>>` and panics while holding the lock.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use courier::{Messenger, MessengerConfig, Recipient};
//!
//! let messenger = Messenger::new(MessengerConfig::default());
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! messenger
//!     .register("logger", move |msg: &String| {
//!         sink.lock().unwrap().push(msg.clone());
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let delivery = messenger.send(&String::from("hello"));
//! assert_eq!(delivery.delivered, 1);
//! assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string()]);
//!
//! messenger.unregister("logger");
//! assert!(messenger.send(&String::from("ignored")).is_empty());
//! ```

use std::any::type_name;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, trace};

use crate::config::MessengerConfig;
use crate::dispatch::Delivery;
use crate::error::{HandlerError, HandlerResult, MessengerError};
use crate::handlers::{panic_message, SyncSlot};
use crate::identity::{Context, Recipient};
use crate::registry::{Registration, Registry};

/// Synchronous publish/subscribe messenger.
#[derive(Debug)]
pub struct Messenger {
    registry: Registry,
    config: MessengerConfig,
}

impl Messenger {
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

    /// Registers `handler` for messages of type `T` sent without context.
    pub fn register<T, F>(
        &self,
        recipient: impl Into<Recipient>,
        handler: F,
    ) -> Result<Registration, MessengerError>
    where
        T: 'static,
        F: Fn(&T) -> HandlerResult + Send + Sync + 'static,
    {
        self.insert(recipient.into(), None, handler)
    }

    /// Registers `handler` for messages of type `T` sent with `context`.
    pub fn register_with_context<T, F>(
        &self,
        recipient: impl Into<Recipient>,
        context: impl Into<Context>,
        handler: F,
    ) -> Result<Registration, MessengerError>
    where
        T: 'static,
        F: Fn(&T) -> HandlerResult + Send + Sync + 'static,
    {
        self.insert(recipient.into(), Some(context.into()), handler)
    }

    /// Registers `handler` under an optional context.
    ///
    /// Re-registering the same `(recipient, context)` follows
    /// [`MessengerConfig::duplicates`].
    pub fn register_in<T, F>(
        &self,
        recipient: impl Into<Recipient>,
        context: Option<&Context>,
        handler: F,
    ) -> Result<Registration, MessengerError>
    where
        T: 'static,
        F: Fn(&T) -> HandlerResult + Send + Sync + 'static,
    {
        self.insert(recipient.into(), context.cloned(), handler)
    }

    fn insert<T, F>(
        &self,
        recipient: Recipient,
        context: Option<Context>,
        handler: F,
    ) -> Result<Registration, MessengerError>
    where
        T: 'static,
        F: Fn(&T) -> HandlerResult + Send + Sync + 'static,
    {
        let message_type = type_name::<T>();
        debug!(
            message_type,
            recipient = ?recipient,
            context = ?context,
            "[Messenger] Register"
        );
        self.registry
            .insert(recipient, context, message_type, SyncSlot::new(handler))
    }

    /// Removes every registration of `recipient`, whatever the context.
    ///
    /// Returns the number of registrations removed; `0` is not an error.
    pub fn unregister(&self, recipient: impl Into<Recipient>) -> usize {
        let recipient = recipient.into();
        let removed = self.registry.remove_recipient(&recipient);
        debug!(recipient = ?recipient, removed, "[Messenger] Unregister");
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
            "[Messenger] Unregister exact"
        );
        removed
    }

    /// Sends `message` to handlers registered without context.
    pub fn send<T: 'static>(&self, message: &T) -> Delivery {
        self.send_in(message, None)
    }

    /// Sends `message` to handlers registered with `context`.
    pub fn send_with_context<T: 'static>(
        &self,
        message: &T,
        context: impl Into<Context>,
    ) -> Delivery {
        let context = context.into();
        self.send_in(message, Some(&context))
    }

    /// Sends `message` to every handler for `T` registered under exactly `context`.
    ///
    /// Returns after all matched handlers have returned.
    pub fn send_in<T: 'static>(&self, message: &T, context: Option<&Context>) -> Delivery {
        let message_type = type_name::<T>();
        let targets = self.registry.resolve::<SyncSlot<T>>(context);
        let mut delivery = Delivery::expecting(targets.len());

        for target in targets {
            let result = self.invoke(&target.handler, message);
            delivery.record(
                "[Messenger]",
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
            "[Messenger] Sent"
        );
        delivery
    }

    fn invoke<T: 'static>(&self, slot: &SyncSlot<T>, message: &T) -> HandlerResult {
        if !self.config.capture_panics {
            return slot.call(message);
        }
        match catch_unwind(AssertUnwindSafe(|| slot.call(message))) {
            Ok(result) => result,
            Err(panic_err) => Err(HandlerError::Panicked {
                info: panic_message(&*panic_err),
            }),
        }
    }
}

impl Default for Messenger {
    fn default() -> Self {
        Self::new(MessengerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&String) -> HandlerResult + Send + Sync) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        (hits, move |_: &String| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn delivers_once_per_matching_registration() {
        let m = Messenger::default();
        let (hits, handler) = counter();
        m.register("a", handler).unwrap();

        let d = m.send(&"hi".to_string());
        assert_eq!((d.matched, d.delivered), (1, 1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn message_type_filters_handlers() {
        let m = Messenger::default();
        let (hits, handler) = counter();
        m.register("a", handler).unwrap();

        assert!(m.send(&5u32).is_empty());
        assert!(m.send(&"str slice").is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn context_is_exact() {
        let m = Messenger::default();
        let (hits, handler) = counter();
        m.register_with_context("a", "A", handler).unwrap();

        assert!(m.send(&"x".to_string()).is_empty());
        assert!(m.send_with_context(&"x".to_string(), "B").is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        m.send_with_context(&"x".to_string(), "A");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_and_panicking_handlers_are_isolated() {
        let m = Messenger::default();
        let (hits, handler) = counter();
        m.register("err", |_: &String| Err(HandlerError::fail("nope")))
            .unwrap();
        m.register("panic", |_: &String| -> HandlerResult { panic!("kaboom") })
            .unwrap();
        m.register("ok", handler).unwrap();

        let d = m.send(&"safe".to_string());
        assert_eq!(d.matched, 3);
        assert_eq!(d.delivered, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(
            d.failure_of(&Recipient::named("err")),
            Some(&HandlerError::fail("nope"))
        );
        assert_eq!(
            d.failure_of(&Recipient::named("panic")),
            Some(&HandlerError::Panicked {
                info: "kaboom".into()
            })
        );
    }

    #[test]
    fn replace_policy_keeps_last_handler() {
        let m = Messenger::default();
        let (first, h1) = counter();
        let (second, h2) = counter();
        assert_eq!(m.register("a", h1), Ok(Registration::Inserted));
        assert_eq!(m.register("a", h2), Ok(Registration::Replaced));

        m.send(&"x".to_string());
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reject_policy_keeps_first_handler() {
        let m = Messenger::new(MessengerConfig::default().with_duplicates(DuplicatePolicy::Reject));
        let (first, h1) = counter();
        let (second, h2) = counter();
        m.register("a", h1).unwrap();
        assert!(matches!(
            m.register("a", h2),
            Err(MessengerError::AlreadyRegistered { .. })
        ));

        m.send(&"x".to_string());
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unregister_removes_all_contexts() {
        let m = Messenger::default();
        let (hits, handler) = counter();
        let handler = Arc::new(handler);
        for ctx in [None, Some(Context::from("A")), Some(Context::from(7u64))] {
            let h = Arc::clone(&handler);
            m.register_in("a", ctx.as_ref(), move |s: &String| h(s)).unwrap();
        }
        assert_eq!(m.unregister("a"), 3);
        assert_eq!(m.unregister("a"), 0);

        m.send(&"x".to_string());
        m.send_with_context(&"x".to_string(), "A");
        m.send_with_context(&"x".to_string(), 7u64);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn in_methods_take_a_borrowed_context() {
        let m = Messenger::default();
        let (hits, handler) = counter();
        let topic = Context::from("orders");

        m.register_in("a", Some(&topic), handler).unwrap();
        assert_eq!(m.send_in(&"x".to_string(), Some(&topic)).delivered, 1);
        assert!(m.send_in(&"x".to_string(), None).is_empty());
        assert!(m.unregister_exact("a", Some(&topic)));
        assert!(m.send_in(&"x".to_string(), Some(&topic)).is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregister_exact_leaves_other_contexts() {
        let m = Messenger::default();
        let (hits, handler) = counter();
        let handler = Arc::new(handler);
        let h = Arc::clone(&handler);
        m.register("a", move |s: &String| h(s)).unwrap();
        let h = Arc::clone(&handler);
        m.register_with_context("a", "A", move |s: &String| h(s))
            .unwrap();

        assert!(m.unregister_exact("a", None));
        assert!(!m.unregister_exact("a", None));

        m.send(&"x".to_string());
        m.send_with_context(&"x".to_string(), "A");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handlers_may_reenter_the_messenger() {
        let m = Arc::new(Messenger::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner = Arc::clone(&m);
        m.register("forwarder", move |n: &u32| {
            inner.send(&format!("n={n}"));
            inner.unregister("forwarder");
            Ok(())
        })
        .unwrap();

        let sink = Arc::clone(&seen);
        m.register("sink", move |s: &String| {
            sink.lock().unwrap().push(s.clone());
            Ok(())
        })
        .unwrap();

        assert_eq!(m.send(&3u32).delivered, 1);
        assert!(m.send(&4u32).is_empty());
        assert_eq!(*seen.lock().unwrap(), vec!["n=3".to_string()]);
    }
}
