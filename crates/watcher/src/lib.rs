//! Directory watching for wallet state files
//!
//! This crate provides the background event pipeline that keeps the
//! application informed about external changes to the files under the wallet
//! directory:
//! - A long-lived listener on the single watched directory
//! - Operation-mask filtering and per-path role classification
//! - Outbound seams for notifications (`NotificationSink`) and failures
//!   (`ErrorReporter`)
//! - Deterministic shutdown via a cancellation token
//!
//! Self-induced events are kept quiet by construction: writers use
//! `wallet_core::write_json`, whose remove-then-create pattern does not
//! satisfy the watcher's combined write+create filter.

pub mod event;
pub mod sink;
pub mod watch;

// Re-exports
pub use event::{ChangeEvent, Op};
pub use sink::{ErrorReporter, KeyMaterial, LogReporter, NotificationSink, WALLET_KEYS_TOPIC};
pub use watch::{DirectoryWatcher, WatcherError, WatcherHandle};
