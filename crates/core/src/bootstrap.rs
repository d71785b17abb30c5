//! Directory and seed-file bootstrap
//!
//! Runs once before the watcher starts: creates the wallet directory tree and
//! seeds the transaction-history file with an empty JSON object so the
//! frontend always has something parseable to read.

use crate::error::StoreError;
use crate::paths::WalletPaths;
use crate::store::file_exists;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Empty JSON object used to seed the transaction history
const EMPTY_HISTORY: &str = "{}";

/// Create a directory and any missing ancestors
pub fn ensure_directory(path: &Path) -> Result<(), StoreError> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Create `path` with `default_contents` if it does not already exist
///
/// Existing files are never touched, whatever their content.
pub fn ensure_seed_file(path: &Path, default_contents: &str) -> Result<(), StoreError> {
    if file_exists(path) {
        return Ok(());
    }

    let mut file = File::create(path)?;
    file.write_all(default_contents.as_bytes())?;
    file.sync_all()?;

    info!("seeded {}", path.display());
    Ok(())
}

/// Set up the on-disk structure the watcher and writers expect
pub fn bootstrap(paths: &WalletPaths) -> Result<(), StoreError> {
    ensure_directory(&paths.dag_dir)?;
    ensure_directory(&paths.encrypted_dir)?;
    ensure_seed_file(&paths.tx_history_file, EMPTY_HISTORY)?;
    Ok(())
}
