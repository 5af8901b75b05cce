//! Credential store persistence
//!
//! The reference digest lives in a small JSON record under the per-user
//! configuration directory. It is written by `ml-lock --set-password` and
//! read once when a session starts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::credential::{CredentialReference, DigestError};

/// Configuration directory under ~/.config
pub const CONFIG_DIR_NAME: &str = "ml_lock";

/// Credential file name
const STORE_FILE_NAME: &str = "config.json";

/// On-disk record
#[derive(Debug, Serialize, Deserialize)]
struct StoredCredential {
    password_hash: String,
}

/// Credential store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No password set. Please run with -p to set a password first.")]
    NotInitialized(PathBuf),

    #[error("Credential store at {path:?} is malformed: {reason}. Please run with -p to set a password again.")]
    Malformed { path: PathBuf, reason: String },

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Per-user credential store
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

/// Get the ml_lock configuration directory
///
/// Honors XDG_CONFIG_HOME, then falls back to the platform config dir.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(xdg_config) = std::env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join(CONFIG_DIR_NAME));
    }
    dirs::config_dir().map(|p| p.join(CONFIG_DIR_NAME))
}

impl CredentialStore {
    /// Store at the default per-user location
    pub fn locate() -> Result<Self, StoreError> {
        let dir = config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(Self::at(dir.join(STORE_FILE_NAME)))
    }

    /// Store at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the reference digest
    pub fn load(&self) -> Result<CredentialReference, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotInitialized(self.path.clone()))
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let stored: StoredCredential =
            serde_json::from_str(&contents).map_err(|e| self.malformed(e.to_string()))?;
        let reference = CredentialReference::from_hex(&stored.password_hash)
            .map_err(|e: DigestError| self.malformed(e.to_string()))?;

        debug!("Loaded credential reference from {:?}", self.path);
        Ok(reference)
    }

    /// Persist a reference digest, replacing any previous one
    pub fn save(&self, reference: &CredentialReference) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let record = StoredCredential {
            password_hash: reference.to_hex(),
        };
        let contents = serde_json::to_string_pretty(&record)
            .map_err(|e| self.malformed(e.to_string()))?;
        fs::write(&self.path, contents).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        // Set restrictive permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).map_err(
                |source| StoreError::Io {
                    path: self.path.clone(),
                    source,
                },
            )?;
        }

        debug!("Saved credential reference to {:?}", self.path);
        Ok(())
    }

    fn malformed(&self, reason: String) -> StoreError {
        StoreError::Malformed {
            path: self.path.clone(),
            reason,
        }
    }
}
