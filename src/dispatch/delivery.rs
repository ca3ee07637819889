//! # Delivery report.
//!
//! Every send returns a [`Delivery`]. It is informational only: handler
//! failures are already contained and logged, and ignoring the report is fine.

use tracing::warn;

use crate::error::{HandlerError, HandlerResult};
use crate::identity::{Context, Recipient};

/// A handler that did not complete successfully.
#[derive(Clone, Debug)]
pub struct Failure {
    /// Recipient whose handler failed.
    pub recipient: Recipient,
    /// Context of the failed registration.
    pub context: Option<Context>,
    /// What went wrong.
    pub error: HandlerError,
}

/// Outcome of one send.
#[derive(Clone, Debug, Default)]
pub struct Delivery {
    /// Handlers that matched the message type and context.
    pub matched: usize,
    /// Handlers that returned `Ok(())`.
    pub delivered: usize,
    /// Handlers that failed, panicked or were cancelled.
    pub failures: Vec<Failure>,
}

impl Delivery {
    pub(crate) fn expecting(matched: usize) -> Self {
        Self {
            matched,
            delivered: 0,
            failures: Vec::new(),
        }
    }

    /// Records one handler outcome, logging failures under `origin`
    /// (the dispatcher's log prefix).
    pub(crate) fn record(
        &mut self,
        origin: &'static str,
        message_type: &'static str,
        recipient: Recipient,
        context: Option<Context>,
        result: HandlerResult,
    ) {
        match result {
            Ok(()) => self.delivered += 1,
            Err(error) => {
                warn!(
                    message_type,
                    recipient = ?recipient,
                    context = ?context,
                    error = error.as_label(),
                    detail = %error.as_message(),
                    "{origin} Handler failed"
                );
                self.failures.push(Failure {
                    recipient,
                    context,
                    error,
                });
            }
        }
    }

    /// Number of failed handlers.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Returns `true` if no handler failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns `true` if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.matched == 0
    }

    /// Returns the failure for `recipient`, if any.
    pub fn failure_of(&self, recipient: &Recipient) -> Option<&HandlerError> {
        self.failures
            .iter()
            .find(|f| &f.recipient == recipient)
            .map(|f| &f.error)
    }
}
