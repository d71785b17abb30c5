//! Wallet file-state primitives
//!
//! This crate provides:
//! - Canonical wallet path resolution (`WalletPaths`)
//! - Role classification for watched files (`WalletRole`)
//! - The remove-then-create atomic JSON writer (`store::write_json`)
//! - Directory bootstrap & seed-file setup (`bootstrap`)

pub mod bootstrap;
pub mod error;
pub mod paths;
pub mod store;

// Re-exports
pub use error::{PathError, StoreError};
pub use paths::{WalletPaths, WalletRole};
pub use store::{file_exists, write_json};
