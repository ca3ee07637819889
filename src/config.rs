//! # Messenger configuration.
//!
//! Provides [`MessengerConfig`], the settings shared by [`Messenger`](crate::Messenger)
//! and [`AsyncMessenger`](crate::AsyncMessenger).
//!
//! ## Sentinel values
//! - `max_parallel = 0` → unlimited (no semaphore created)

/// What `register` does when the `(recipient, context)` key already exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Overwrite the previous handler (last write wins). Default.
    #[default]
    Replace,
    /// Keep the previous handler and return
    /// [`MessengerError::AlreadyRegistered`](crate::MessengerError::AlreadyRegistered).
    Reject,
}

/// Configuration for a messenger instance.
///
/// ## Field semantics
/// - `duplicates`: policy for re-registering an existing key
/// - `max_parallel`: async fan-out parallelism (`0` = unlimited)
/// - `capture_panics`: catch panics of synchronous handlers
///
/// ## Notes
/// All fields are public. Prefer the helper accessors over checking the
/// `0` sentinel directly.
#[derive(Clone, Debug)]
pub struct MessengerConfig {
    /// Policy applied when a key is registered twice.
    pub duplicates: DuplicatePolicy,

    /// Maximum number of async handlers running at once for one send.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = at most `n` handlers of the same fan-out run simultaneously;
    ///   the rest wait for a permit. Does not throttle producers.
    ///
    /// Ignored by the synchronous [`Messenger`](crate::Messenger).
    pub max_parallel: usize,

    /// Catch panics raised by synchronous handlers.
    ///
    /// When `false`, a panicking sync handler unwinds through `send`
    /// (useful while debugging). Async handler panics are always contained by
    /// their task and reported.
    pub capture_panics: bool,
}

impl MessengerConfig {
    /// Returns the fan-out parallelism limit as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` concurrent handlers per send
    #[inline]
    pub fn parallelism_limit(&self) -> Option<usize> {
        if self.max_parallel == 0 {
            None
        } else {
            Some(self.max_parallel)
        }
    }

    /// Returns a copy with `duplicates` set.
    #[must_use]
    pub fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Returns a copy with `max_parallel` set.
    #[must_use]
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }
}

impl Default for MessengerConfig {
    /// Default configuration:
    ///
    /// - `duplicates = DuplicatePolicy::Replace`
    /// - `max_parallel = 0` (unlimited)
    /// - `capture_panics = true`
    fn default() -> Self {
        Self {
            duplicates: DuplicatePolicy::Replace,
            max_parallel: 0,
            capture_panics: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_means_unlimited() {
        let cfg = MessengerConfig::default();
        assert_eq!(cfg.parallelism_limit(), None);
        assert_eq!(cfg.with_max_parallel(4).parallelism_limit(), Some(4));
    }

    #[test]
    fn defaults() {
        let cfg = MessengerConfig::default();
        assert_eq!(cfg.duplicates, DuplicatePolicy::Replace);
        assert!(cfg.capture_panics);
        assert_eq!(
            cfg.with_duplicates(DuplicatePolicy::Reject).duplicates,
            DuplicatePolicy::Reject
        );
    }
}
