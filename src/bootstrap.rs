//! On-disk bootstrap state
//!
//! A small JSON sidecar next to the working directory records whether the
//! registry schema has been installed, which backup archive was last
//! restored, and identification of the last successful boot. It is read once
//! at startup and rewritten after install, restore and boot.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Default sidecar file name, resolved against the current directory
pub const STATE_FILE: &str = ".fiscus";

/// Persisted process state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfo {
    pub is_registry_installed: bool,
    pub last_backup_restored: String,
    pub last_known_process_id: u32,
    pub last_successful_start: i64,

    pub build_platform: String,
    pub build_number: String,
    pub full_version: String,
    pub database_driver: String,
}

impl AppInfo {
    /// Fill in build identification for the running binary
    pub fn stamp(&mut self, driver: &str) {
        self.full_version = env!("CARGO_PKG_VERSION").to_string();
        self.build_number = option_env!("FISCUS_BUILD").unwrap_or("dev").to_string();
        self.build_platform = format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH);
        self.database_driver = driver.to_string();
    }
}

/// Read the sidecar state, if any
///
/// A missing or empty file yields the default state; a file that exists but
/// cannot be decoded is fatal, since acting on half-known state could
/// reinstall over live data.
pub fn awake(path: &Path) -> Result<AppInfo> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AppInfo::default()),
        Err(e) => return Err(e.into()),
    };

    if data.len() <= 1 {
        return Ok(AppInfo::default());
    }

    serde_json::from_slice(&data)
        .map_err(|e| Error::Bootstrap(format!("corrupted state file {}: {}", path.display(), e)))
}

/// Persist the sidecar state
pub fn save(path: &Path, info: &AppInfo) -> Result<()> {
    let data = serde_json::to_vec(info)?;
    std::fs::write(path, data)?;
    debug!("saved bootstrap state to {}", path.display());

    Ok(())
}

/// Sidecar location in the current working directory
pub fn state_path() -> PathBuf {
    PathBuf::from(STATE_FILE)
}
