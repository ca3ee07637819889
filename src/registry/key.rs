//! Composite registration key.

use crate::identity::{Context, Recipient};

/// `(recipient, context)` pair; equal iff both halves are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Key {
    pub(crate) recipient: Recipient,
    pub(crate) context: Option<Context>,
}

impl Key {
    pub(crate) fn new(recipient: Recipient, context: Option<Context>) -> Self {
        Self { recipient, context }
    }

    /// Exact context match; `None` only matches `None`.
    #[inline]
    pub(crate) fn matches_context(&self, context: Option<&Context>) -> bool {
        self.context.as_ref() == context
    }
}
