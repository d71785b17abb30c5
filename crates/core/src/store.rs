//! Remove-then-create atomic JSON writer
//!
//! Writers that target files inside the watched directory must go through
//! [`write_json`] rather than ad hoc `fs::write` calls. An in-place
//! truncate-and-rewrite produces a stream of plain write notifications, while
//! remove → create → single write produces the replace-style signal that the
//! watcher's filter deliberately suppresses, so the application's own writes
//! never loop back as change notifications.

use crate::error::StoreError;
use serde::Serialize;
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::debug;

/// Serialize `value` as JSON and replace the file at `path` with it
///
/// The payload is fully encoded before the old file is removed, so a
/// serialization failure leaves any existing file untouched. The new file is
/// written in a single call and fsynced before returning.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let payload = serde_json::to_vec(value)?;

    remove_if_exists(path)?;

    let mut file = File::create(path)?;
    file.write_all(&payload)?;
    file.sync_all()?;

    debug!("wrote {} bytes to {}", payload.len(), path.display());
    Ok(())
}

/// Remove a file, treating absence as success
fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Check that a path exists and is a regular file, not a directory
pub fn file_exists(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => !meta.is_dir(),
        Err(_) => false,
    }
}
