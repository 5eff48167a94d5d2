//! On-disk session cache
//!
//! A restarted process restores its session from this cache instead of
//! sending the user back through sign-in. The cache is a single JSON
//! file; anything unreadable in it is treated as no session.

use log::{debug, warn};
use std::fs;
use std::path::PathBuf;

use crate::{IdentityError, ProviderSession};

/// File-backed store for the current session
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the cached session, if the file exists and parses.
    pub fn load(&self) -> Option<ProviderSession> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    debug!("session cache unreadable: {}", err);
                }
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!("discarding malformed session cache: {}", err);
                None
            }
        }
    }

    /// Write the session to disk, replacing any previous one.
    pub fn store(&self, session: &ProviderSession) -> Result<(), IdentityError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let raw = serde_json::to_string(session)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    /// Remove the cache file. Missing file is not an error.
    pub fn clear(&self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to clear session cache: {}", err);
            }
        }
    }
}
