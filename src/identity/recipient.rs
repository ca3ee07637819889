//! # Recipient identity.
//!
//! [`Recipient`] is the opaque "who" half of a registration key. Callers pick
//! whichever identity fits the subscriber:
//!
//! | Constructor               | Equality                                   |
//! |---------------------------|--------------------------------------------|
//! | [`Recipient::of`]         | same `Arc` allocation (reference identity) |
//! | [`Recipient::named`]      | same string                                |
//! | [`Recipient::unique`]     | only itself (and its clones)               |
//! | [`Recipient::value`]      | same type and equal value                  |
//!
//! ## Notes
//! A reference recipient holds a strong clone of the `Arc`. The object stays
//! alive for as long as any registration keyed by it exists, so its address
//! can never be handed to another allocation while it is still registered.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use courier::Recipient;
//!
//! let view = Arc::new(42u8);
//! assert_eq!(Recipient::of(&view), Recipient::of(&Arc::clone(&view)));
//! assert_ne!(Recipient::of(&view), Recipient::of(&Arc::new(42u8)));
//!
//! assert_eq!(Recipient::named("audit"), Recipient::from("audit"));
//! assert_ne!(Recipient::unique(), Recipient::unique());
//! ```

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use super::token::Token;

/// Global counter for [`Recipient::unique`].
static RECIPIENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Pinned reference identity: the address plus a strong handle on the object.
struct Address {
    addr: usize,
    _object: Arc<dyn Any + Send + Sync>,
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{:#x}", self.addr)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct Unique(u64);

impl fmt::Debug for Unique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque identity under which handlers are registered.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Recipient(Token);

impl Recipient {
    /// Reference identity of a shared object.
    ///
    /// The recipient keeps `object` alive until the last clone of it (including
    /// the ones held by registrations) is dropped.
    pub fn of<T>(object: &Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let addr = Arc::as_ptr(object).cast::<()>() as usize;
        Self(Token::new(Address {
            addr,
            _object: Arc::new(Arc::clone(object)),
        }))
    }

    /// String handle identity.
    pub fn named(name: impl Into<String>) -> Self {
        Self(Token::new(name.into()))
    }

    /// Fresh identity that equals nothing but its own clones.
    pub fn unique() -> Self {
        let id = RECIPIENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed);
        Self(Token::new(Unique(id)))
    }

    /// Arbitrary value identity, compared by value.
    pub fn value<V>(value: V) -> Self
    where
        V: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        Self(Token::new(value))
    }

    /// Returns the name if this is a named recipient.
    pub fn name(&self) -> Option<&str> {
        self.0.downcast_ref::<String>().map(String::as_str)
    }

    /// Checks the identity is usable as a registration key.
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        match self.name() {
            Some(name) if name.trim().is_empty() => Err("recipient name is empty"),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Recipient({:?})", self.0)
    }
}

impl From<&str> for Recipient {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for Recipient {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

impl From<&Recipient> for Recipient {
    fn from(recipient: &Recipient) -> Self {
        recipient.clone()
    }
}

impl<T> From<&Arc<T>> for Recipient
where
    T: ?Sized + Send + Sync + 'static,
{
    fn from(object: &Arc<T>) -> Self {
        Self::of(object)
    }
}
