//! # Registry - concurrent handler store.
//!
//! [`Registry`] maps a `(recipient, context)` key to exactly one handler slot.
//! Handlers for different message types share the same map; the slot's
//! concrete type carries the message type and is checked on lookup.
//!
//! ## Rules
//! - Backed by a sharded `DashMap`; unrelated keys never contend on one lock.
//! - `resolve` collects a snapshot and releases every shard lock before
//!   returning, so handlers may call back into the registry.
//! - A registration racing with a `resolve` may or may not be observed.
//! - Duplicate keys follow the configured [`DuplicatePolicy`].

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::DuplicatePolicy;
use crate::error::MessengerError;
use crate::identity::{Context, Recipient};
use crate::registry::Key;

/// Outcome of a successful registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// The key was free; a new entry was created.
    Inserted,
    /// The key existed; its handler was replaced (last write wins).
    Replaced,
}

/// Stored handler plus the message type it accepts.
struct Slot {
    message: &'static str,
    handler: Arc<dyn Any + Send + Sync>,
}

/// A resolved delivery target (snapshot entry).
pub(crate) struct Target<H> {
    pub(crate) recipient: Recipient,
    pub(crate) context: Option<Context>,
    pub(crate) handler: Arc<H>,
}

/// Concurrent `(recipient, context) → handler` store.
///
/// Each messenger owns one; it is reachable read-only through
/// `Messenger::registry()` / `AsyncMessenger::registry()` for introspection.
///
/// ```compile_fail
/// let registry = courier::Registry::new(courier::DuplicatePolicy::Replace);
/// ```
pub struct Registry {
    entries: DashMap<Key, Slot>,
    duplicates: DuplicatePolicy,
}

impl Registry {
    /// Creates an empty registry with the given duplicate policy.
    pub(crate) fn new(duplicates: DuplicatePolicy) -> Self {
        Self {
            entries: DashMap::new(),
            duplicates,
        }
    }

    /// Inserts `handler` under `(recipient, context)`.
    ///
    /// `message` is the accepted message type name, kept for diagnostics.
    pub(crate) fn insert<H>(
        &self,
        recipient: Recipient,
        context: Option<Context>,
        message: &'static str,
        handler: H,
    ) -> Result<Registration, MessengerError>
    where
        H: Any + Send + Sync,
    {
        recipient
            .validate()
            .map_err(|reason| MessengerError::InvalidRecipient { reason })?;

        let slot = Slot {
            message,
            handler: Arc::new(handler),
        };

        match self.entries.entry(Key::new(recipient, context)) {
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
                Ok(Registration::Inserted)
            }
            Entry::Occupied(mut occupied) => match self.duplicates {
                DuplicatePolicy::Replace => {
                    occupied.insert(slot);
                    Ok(Registration::Replaced)
                }
                DuplicatePolicy::Reject => {
                    let key = occupied.key();
                    Err(MessengerError::AlreadyRegistered {
                        recipient: format!("{:?}", key.recipient),
                        context: key.context.as_ref().map(|c| format!("{c:?}")),
                    })
                }
            },
        }
    }

    /// Removes exactly the `(recipient, context)` entry.
    ///
    /// Returns `false` if there was nothing to remove.
    pub(crate) fn remove(&self, recipient: &Recipient, context: Option<&Context>) -> bool {
        let key = Key::new(recipient.clone(), context.cloned());
        self.entries.remove(&key).is_some()
    }

    /// Removes every entry of `recipient`, whatever its context.
    ///
    /// Returns the number of entries removed.
    pub(crate) fn remove_recipient(&self, recipient: &Recipient) -> usize {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            if key.recipient == *recipient {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    /// Snapshot of handlers of concrete slot type `H` registered under `context`.
    pub(crate) fn resolve<H>(&self, context: Option<&Context>) -> Vec<Target<H>>
    where
        H: Any + Send + Sync,
    {
        self.entries
            .iter()
            .filter(|entry| entry.key().matches_context(context))
            .filter_map(|entry| {
                let handler = Arc::clone(&entry.value().handler).downcast::<H>().ok()?;
                Some(Target {
                    recipient: entry.key().recipient.clone(),
                    context: entry.key().context.clone(),
                    handler,
                })
            })
            .collect()
    }

    /// Message type name accepted by the entry, if present.
    pub fn message_type(&self, recipient: &Recipient, context: Option<&Context>) -> Option<&'static str> {
        let key = Key::new(recipient.clone(), context.cloned());
        self.entries.get(&key).map(|slot| slot.message)
    }

    /// Returns `true` if `(recipient, context)` is registered.
    pub fn contains(&self, recipient: &Recipient, context: Option<&Context>) -> bool {
        let key = Key::new(recipient.clone(), context.cloned());
        self.entries.contains_key(&key)
    }

    /// Distinct recipients with at least one entry (unordered).
    pub fn recipients(&self) -> Vec<Recipient> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter_map(|entry| {
                let r = entry.key().recipient.clone();
                seen.insert(r.clone()).then_some(r)
            })
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Duplicate policy in effect.
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicates
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries.len())
            .field("duplicates", &self.duplicates)
            .finish()
    }
}
