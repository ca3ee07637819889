//! Dispatch: the two messengers and their delivery report.
//!
//! - [`Messenger`]: synchronous fan-out on the caller's thread;
//! - [`AsyncMessenger`]: concurrent fan-out on tokio tasks with fan-in;
//! - [`Delivery`]: per-send outcome (matched / delivered / failures).
//!
//! Both messengers follow the same pipeline:
//! ```text
//! send(msg, ctx)
//!   ├─► registry.resolve::<Slot<T>>(ctx)      (snapshot, no lock kept)
//!   ├─► invoke each handler                   (sync: in turn / async: spawned)
//!   ├─► isolate failures                      (Err / panic → Failure, warn!)
//!   └─► Delivery
//! ```

mod async_messenger;
mod delivery;
#[cfg(feature = "global")]
mod global;
mod messenger;

pub use async_messenger::AsyncMessenger;
pub use delivery::{Delivery, Failure};
pub use messenger::Messenger;
