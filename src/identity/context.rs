//! # Delivery context (topic).
//!
//! [`Context`] is the optional second half of a registration key. Matching is
//! exact: a registration without context only sees sends without context, and
//! a registration with context `"a"` only sees sends with context `"a"`.
//!
//! Strings are normalised to `String`, so `"a"` and `String::from("a")` are the
//! same context.

use std::fmt;
use std::hash::Hash;

use super::token::Token;

/// Opaque, value-compared topic for filtering delivery.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Context(Token);

impl Context {
    /// Wraps any hashable value as a context.
    pub fn new<V>(value: V) -> Self
    where
        V: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        Self(Token::new(value))
    }

    /// Returns the inner value if it is a `V`.
    pub fn get<V: 'static>(&self) -> Option<&V> {
        self.0.downcast_ref::<V>()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context({:?})", self.0)
    }
}

impl From<&Context> for Context {
    fn from(context: &Context) -> Self {
        context.clone()
    }
}

impl From<&str> for Context {
    fn from(topic: &str) -> Self {
        Self::new(topic.to_string())
    }
}

impl From<String> for Context {
    fn from(topic: String) -> Self {
        Self::new(topic)
    }
}

impl From<u64> for Context {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<i64> for Context {
    fn from(id: i64) -> Self {
        Self::new(id)
    }
}
