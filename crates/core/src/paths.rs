//! Canonical wallet path resolution and role classification
//!
//! All wallet state lives in one flat directory, `<home>/.dag`. The path set is
//! computed once at startup and is read-only afterwards, so it can be shared
//! across tasks without locking.

use crate::error::PathError;
use std::path::{Path, PathBuf};
use tracing::info;

/// The logical entity a watched file represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletRole {
    /// Decrypted private key (`private_decrypted.pem`)
    KeyFile,
    /// Last transaction / account file (`acct`)
    LastTxFile,
    /// Chart data consumed by the frontend
    ChartDataFile,
}

/// Resolved set of wallet file paths
///
/// Invariant: `dag_dir` is an ancestor of every absolute path below. The
/// chart-data path is the historical exception: it is a project-relative
/// literal, compared verbatim during classification (see DESIGN.md).
#[derive(Debug, Clone)]
pub struct WalletPaths {
    /// Home directory of the user
    pub home_dir: PathBuf,
    /// DAG directory for configuration files and wallet specific data
    pub dag_dir: PathBuf,
    /// Subdirectory holding the encrypted key material
    pub encrypted_dir: PathBuf,
    /// Decrypted private key file
    pub key_file: PathBuf,
    /// Public key file inside the encrypted-key directory
    pub pub_key_file: PathBuf,
    /// Account information ("last transaction") file
    pub last_tx_file: PathBuf,
    /// Transaction history JSON, seeded with `{}` at bootstrap
    pub tx_history_file: PathBuf,
    /// Chart data file, referenced by a relative path
    pub chart_data_file: PathBuf,
}

impl WalletPaths {
    /// Resolve the canonical path set from the current user's home directory
    pub fn resolve() -> Result<Self, PathError> {
        let home = dirs::home_dir().ok_or(PathError::HomeDirUnavailable)?;
        Ok(Self::resolve_from(&home))
    }

    /// Resolve the canonical path set from an explicit home directory
    ///
    /// Pure path computation; nothing is created on disk.
    pub fn resolve_from(home: &Path) -> Self {
        let dag_dir = home.join(".dag");
        let encrypted_dir = dag_dir.join("encrypted_key");

        let paths = Self {
            home_dir: home.to_path_buf(),
            key_file: dag_dir.join("private_decrypted.pem"),
            pub_key_file: encrypted_dir.join("pub.pem"),
            last_tx_file: dag_dir.join("acct"),
            tx_history_file: dag_dir.join("txhistory.json"),
            chart_data_file: Path::new("JSONdata").join("chart_data.json"),
            dag_dir,
            encrypted_dir,
        };

        info!("DAG directory: {}", paths.dag_dir.display());
        paths
    }

    /// The single directory whose direct children are watched
    pub fn watched_dir(&self) -> &Path {
        &self.dag_dir
    }

    /// Classify a path against the registry by exact comparison
    ///
    /// Pure function of the path; unmatched paths yield `None`, never an error.
    pub fn role_for(&self, path: &Path) -> Option<WalletRole> {
        if path == self.key_file {
            Some(WalletRole::KeyFile)
        } else if path == self.last_tx_file {
            Some(WalletRole::LastTxFile)
        } else if path == self.chart_data_file {
            Some(WalletRole::ChartDataFile)
        } else {
            None
        }
    }
}
