//! Process-wide default messengers (feature `global`).
//!
//! Convenience only: each is an ordinary messenger built with
//! [`MessengerConfig::default`], created on first use and never torn down.
//! Code that needs isolation (tests, multiple subsystems) should construct and
//! pass its own instance instead.

use std::sync::OnceLock;

use crate::config::MessengerConfig;
use crate::dispatch::{AsyncMessenger, Messenger};

static GLOBAL_SYNC: OnceLock<Messenger> = OnceLock::new();
static GLOBAL_ASYNC: OnceLock<AsyncMessenger> = OnceLock::new();

impl Messenger {
    /// Shared process-wide synchronous messenger.
    pub fn global() -> &'static Messenger {
        GLOBAL_SYNC.get_or_init(|| Messenger::new(MessengerConfig::default()))
    }
}

impl AsyncMessenger {
    /// Shared process-wide asynchronous messenger.
    pub fn global() -> &'static AsyncMessenger {
        GLOBAL_ASYNC.get_or_init(|| AsyncMessenger::new(MessengerConfig::default()))
    }
}
