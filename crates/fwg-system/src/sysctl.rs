//! Kernel IP forwarding for the tunnel.

use std::fs;
use std::path::{Path, PathBuf};

use fwg_core::store::remove_if_exists;
use fwg_core::{FwgError, Result};
use tracing::{debug, info};

use crate::command::{AllowedProgram, SafeCommand};

/// Drop-in written by [`IpForwarding::enable`].
pub const DEFAULT_SYSCTL_FILE: &str = "/etc/sysctl.d/99-fwg.conf";

const FORWARDING_CONFIG: &str = "\
# Managed by fwg
net.ipv4.ip_forward = 1
net.ipv6.conf.all.forwarding = 1
";

/// Manages the sysctl drop-in that enables forwarding.
#[derive(Debug, Clone)]
pub struct IpForwarding {
    path: PathBuf,
}

impl Default for IpForwarding {
    fn default() -> Self {
        Self::new(DEFAULT_SYSCTL_FILE)
    }
}

impl IpForwarding {
    /// Uses the drop-in at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The drop-in location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the drop-in is present with the expected settings.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        fs::read_to_string(&self.path).is_ok_and(|content| content == FORWARDING_CONFIG)
    }

    /// Writes the drop-in if needed and loads it.
    pub fn enable(&self) -> Result<()> {
        if self.is_configured() {
            debug!(path = %self.path.display(), "forwarding already configured");
        } else {
            fs::write(&self.path, FORWARDING_CONFIG).map_err(|e| FwgError::io(&self.path, e))?;
            info!(path = %self.path.display(), "forwarding drop-in written");
        }
        let path = self.path.to_string_lossy().into_owned();
        SafeCommand::new(AllowedProgram::Sysctl)
            .args(["-p", path.as_str()])
            .execute()?;
        Ok(())
    }

    /// Removes the drop-in and reloads the remaining system settings.
    ///
    /// Returns false if there was nothing to remove.
    pub fn restore(&self) -> Result<bool> {
        if !remove_if_exists(&self.path)? {
            debug!(path = %self.path.display(), "no forwarding drop-in");
            return Ok(false);
        }
        SafeCommand::new(AllowedProgram::Sysctl)
            .arg("--system")
            .execute()?;
        info!(path = %self.path.display(), "forwarding drop-in removed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path() {
        assert_eq!(IpForwarding::default().path(), Path::new(DEFAULT_SYSCTL_FILE));
    }

    #[test]
    fn configured_only_with_expected_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let forwarding = IpForwarding::new(dir.path().join("99-fwg.conf"));
        assert!(!forwarding.is_configured());

        fs::write(forwarding.path(), "net.ipv4.ip_forward = 0\n").expect("seed");
        assert!(!forwarding.is_configured());

        fs::write(forwarding.path(), FORWARDING_CONFIG).expect("seed");
        assert!(forwarding.is_configured());
    }

    #[test]
    fn restore_without_file_is_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let forwarding = IpForwarding::new(dir.path().join("99-fwg.conf"));
        assert!(!forwarding.restore().expect("restore"));
    }
}
