//! Install and uninstall commands.

use std::io::Write;

use fwg_system::{InstallStatus, ensure_installed};

use crate::context::Services;
use crate::error::CliError;
use crate::output::{Message, OutputFormat};

/// Handler for install and uninstall.
pub struct SetupCommand<'a> {
    services: &'a Services,
}

impl<'a> SetupCommand<'a> {
    /// Creates a new setup command handler.
    #[must_use]
    pub const fn new(services: &'a Services) -> Self {
        Self { services }
    }

    /// Installs wireguard-tools if `wg` is missing.
    pub fn install<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let message = match ensure_installed(self.services.prompter())? {
            InstallStatus::AlreadyInstalled => match fwg_system::install::wg_version() {
                Ok(version) => format!("WireGuard is already installed: {version}"),
                Err(_) => "WireGuard is already installed".to_string(),
            },
            InstallStatus::Installed(manager) => format!("Installed wireguard-tools with {manager}"),
            InstallStatus::Declined => "Installation skipped".to_string(),
        };
        format.write(out, &Message::new(message))
    }

    /// Restores IP forwarding and, if confirmed, deletes every managed
    /// interface.
    pub fn uninstall<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let prompter = self.services.prompter();
        if !prompter.confirm("Uninstall fwg host settings?", false)? {
            return format.write(out, &Message::new("Aborted"));
        }

        if self.services.forwarding().restore()? {
            format.write(out, &Message::new("IP forwarding settings restored"))?;
        }

        if prompter.confirm("Also delete every interface managed by fwg?", false)? {
            let report = self.services.lifecycle().delete_all()?;
            format.write(out, &report)?;
            if !report.is_complete() {
                return Err(CliError::Incomplete(format!(
                    "{} interface(s) could not be deleted",
                    report.failed.len()
                )));
            }
        }
        Ok(())
    }
}
