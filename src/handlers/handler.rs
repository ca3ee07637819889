//! # Asynchronous handler trait.
//!
//! A [`Handler<T>`] receives a shared [`Arc<T>`] so one message can be handed
//! to many handlers running in parallel without cloning the payload.
//! The common handle type is [`HandlerRef`], an `Arc<dyn Handler<T>>`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerResult;

/// # Asynchronous handler for messages of type `T`.
///
/// Each delivery runs on its own tokio task. Returning an error or panicking
/// only affects this handler's entry in the [`Delivery`](crate::Delivery)
/// report.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use courier::{Handler, HandlerResult};
///
/// struct Audit;
///
/// #[async_trait]
/// impl Handler<String> for Audit {
///     async fn handle(&self, message: Arc<String>) -> HandlerResult {
///         // write audit record...
///         let _ = message.len();
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<T>: Send + Sync + 'static
where
    T: Send + Sync + 'static,
{
    /// Processes a single message.
    async fn handle(&self, message: Arc<T>) -> HandlerResult;
}

/// Shared handle to an asynchronous handler.
pub type HandlerRef<T> = Arc<dyn Handler<T>>;
