//! Error types used by the messenger and its handlers.
//!
//! This module defines two main error enums:
//!
//! - [`MessengerError`]: registration errors raised by the messenger itself.
//! - [`HandlerError`]: errors raised by handlers or on their behalf.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! A handler error never escapes a send: it is recorded in the
//! [`Delivery`](crate::Delivery) report and logged.

use thiserror::Error;

/// Result type returned by every handler.
pub type HandlerResult = Result<(), HandlerError>;

/// # Errors produced by the messenger.
///
/// These represent contract violations at registration time. Dispatch never
/// produces a `MessengerError`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessengerError {
    /// The recipient identity cannot be used as a registration key.
    #[error("invalid recipient: {reason}")]
    InvalidRecipient {
        /// Why the recipient was rejected.
        reason: &'static str,
    },

    /// The key is already registered and the messenger rejects duplicates.
    #[error("recipient {recipient} already registered (context: {context:?})")]
    AlreadyRegistered {
        /// Debug rendering of the recipient.
        recipient: String,
        /// Debug rendering of the context, if any.
        context: Option<String>,
    },
}

impl MessengerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use courier::MessengerError;
    ///
    /// let err = MessengerError::InvalidRecipient { reason: "empty name" };
    /// assert_eq!(err.as_label(), "messenger_invalid_recipient");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            MessengerError::InvalidRecipient { .. } => "messenger_invalid_recipient",
            MessengerError::AlreadyRegistered { .. } => "messenger_already_registered",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            MessengerError::InvalidRecipient { reason } => format!("invalid recipient: {reason}"),
            MessengerError::AlreadyRegistered { recipient, context } => match context {
                Some(ctx) => format!("duplicate registration: recipient={recipient} context={ctx}"),
                None => format!("duplicate registration: recipient={recipient}"),
            },
        }
    }
}

/// # Errors produced by handler invocation.
///
/// `Failed` is returned by handlers themselves; `Panicked` and `Cancelled`
/// are synthesised by the dispatchers.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Handler reported a failure.
    #[error("handler failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Handler panicked while processing the message.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The fan-out was cancelled before the handler finished.
    #[error("delivery cancelled")]
    Cancelled,
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Failed`].
    ///
    /// # Example
    /// ```
    /// use courier::HandlerError;
    ///
    /// let err = HandlerError::fail("disk full");
    /// assert_eq!(err.to_string(), "handler failed: disk full");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        HandlerError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
            HandlerError::Cancelled => "handler_cancelled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Failed { error } => format!("error: {error}"),
            HandlerError::Panicked { info } => format!("panic: {info}"),
            HandlerError::Cancelled => "delivery cancelled".to_string(),
        }
    }

    /// Returns `true` if the handler panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self, HandlerError::Panicked { .. })
    }
}
