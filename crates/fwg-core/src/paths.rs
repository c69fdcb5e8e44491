//! File locations for managed interfaces.
//!
//! Every component receives a [`StorePaths`] at construction instead of
//! reading process-wide constants, so tests can point the whole store at a
//! temporary directory.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FwgError, Result};

/// Default directory holding `wg-quick` configuration files.
pub const DEFAULT_CONFIG_DIR: &str = "/etc/wireguard";

/// File name of the managed-interface log inside the config directory.
pub const TRACKER_FILE_NAME: &str = ".fwg_managed_interfaces";

/// Linux limits interface names to 15 bytes (`IFNAMSIZ - 1`).
static INTERFACE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_=+.-]{1,15}$").unwrap_or_else(|_| unreachable!()));

/// Validates a WireGuard interface name.
///
/// # Errors
///
/// Returns [`FwgError::InvalidInterfaceName`] if the name is empty, too long
/// or contains characters `wg-quick` rejects.
pub fn validate_interface_name(name: &str) -> Result<()> {
    if INTERFACE_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(FwgError::InvalidInterfaceName(name.to_string()))
    }
}

/// Directory and tracker locations used by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    config_dir: PathBuf,
    tracker_path: PathBuf,
}

impl StorePaths {
    /// Uses `config_dir` with the tracker log inside it.
    #[must_use]
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let tracker_path = config_dir.join(TRACKER_FILE_NAME);
        Self {
            config_dir,
            tracker_path,
        }
    }

    /// Overrides the tracker log location.
    #[must_use]
    pub fn with_tracker_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tracker_path = path.into();
        self
    }

    /// The configuration directory.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// The managed-interface log.
    #[must_use]
    pub fn tracker_path(&self) -> &Path {
        &self.tracker_path
    }

    /// `<dir>/<iface>.conf`
    #[must_use]
    pub fn config_file(&self, interface: &str) -> PathBuf {
        self.config_dir.join(format!("{interface}.conf"))
    }

    /// `<dir>/<iface>.key`
    #[must_use]
    pub fn private_key_file(&self, interface: &str) -> PathBuf {
        self.config_dir.join(format!("{interface}.key"))
    }

    /// `<dir>/<iface>.pub`
    #[must_use]
    pub fn public_key_file(&self, interface: &str) -> PathBuf {
        self.config_dir.join(format!("{interface}.pub"))
    }
}

impl Default for StorePaths {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_DIR)
    }
}
