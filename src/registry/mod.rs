//! # Subscription registry.
//!
//! Concurrent store of `(recipient, context) → handler slot` used by both
//! messengers. See [`Registry`] for the concurrency rules.
//!
//! ## Architecture
//! ```text
//! register(recipient, ctx, slot) ──► Key{recipient, ctx} ──► DashMap shard (write)
//!
//! send::<T>(msg, ctx)
//!     └─► resolve::<Slot<T>>(ctx)
//!            ├─ iterate shards (read), keep key.context == ctx
//!            ├─ keep slots that downcast to Slot<T>
//!            └─ collect Vec<Target> ─► shard locks released ─► invoke handlers
//! ```

mod key;
mod store;

pub use store::{Registration, Registry};

pub(crate) use key::Key;
pub(crate) use store::Target;
