//! Outbound seams: notification sink, error reporter, key payload

use serde_json::Value;
use std::error::Error;
use tracing::error;

/// Topic emitted when the key file changes
pub const WALLET_KEYS_TOPIC: &str = "wallet_keys";

/// Inbound API of whatever consumes classified notifications
///
/// Emission never fails from the watcher's perspective; delivery problems are
/// the sink's own concern.
pub trait NotificationSink: Send + Sync {
    fn emit(&self, topic: &str, payload: Vec<Value>);
}

/// Channel for surfacing watcher failures to the application
pub trait ErrorReporter: Send + Sync {
    fn report(&self, context: &str, err: &(dyn Error + 'static));
}

/// Reporter that only logs, for hosts without an application error channel
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, context: &str, err: &(dyn Error + 'static)) {
        error!("{context}{err}");
    }
}

/// Opaque key payload attached to key-change notifications
///
/// The actual key handling lives outside this subsystem; the watcher only
/// forwards whatever the application resolved at startup.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    pub private_key: String,
    pub public_key: String,
}

impl KeyMaterial {
    pub fn new(private_key: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            private_key: private_key.into(),
            public_key: public_key.into(),
        }
    }

    /// Payload shape for `WALLET_KEYS_TOPIC`: `[private, public]`
    pub fn payload(&self) -> Vec<Value> {
        vec![
            Value::String(self.private_key.clone()),
            Value::String(self.public_key.clone()),
        ]
    }
}
