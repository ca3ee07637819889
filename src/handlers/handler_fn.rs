//! # Closure-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(Arc<T>) -> Fut`, producing a fresh
//! future per delivery. State shared between deliveries must be captured
//! explicitly (e.g. `Arc<Mutex<..>>`).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use courier::{HandlerFn, HandlerRef};
//!
//! let h: HandlerRef<String> = HandlerFn::arc(|msg: Arc<String>| async move {
//!     println!("got {msg}");
//!     Ok::<_, courier::HandlerError>(())
//! });
//! # let _ = h;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerResult;
use crate::handlers::handler::Handler;

/// Function-backed handler implementation.
#[derive(Debug, Clone)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<T, F, Fut> Handler<T> for HandlerFn<F>
where
    T: Send + Sync + 'static,
    F: Fn(Arc<T>) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, message: Arc<T>) -> HandlerResult {
        (self.f)(message).await
    }
}
