//! Server create and delete commands.

use std::io::Write;

use fwg_core::CreateOutcome;
use fwg_system::{InstallStatus, ensure_installed};
use tracing::info;

use super::write_qr;
use crate::cli::CreateArgs;
use crate::context::Services;
use crate::error::CliError;
use crate::output::{Message, OutputFormat};

/// Handler for create, delete and delete-all.
pub struct ServerCommand<'a> {
    services: &'a Services,
}

impl<'a> ServerCommand<'a> {
    /// Creates a new server command handler.
    #[must_use]
    pub const fn new(services: &'a Services) -> Self {
        Self { services }
    }

    /// Installs WireGuard if missing, enables IP forwarding, writes the
    /// configuration and starts the service.
    ///
    /// `--dry-run` stops after preparing the host.
    pub fn create<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &CreateArgs,
    ) -> Result<(), CliError> {
        let options = args.options();
        fwg_core::validate_interface_name(&args.interface)?;

        if ensure_installed(self.services.prompter())? == InstallStatus::Declined {
            return Err(CliError::Aborted(
                "WireGuard is required to create a server".into(),
            ));
        }
        self.services.forwarding().enable()?;

        if options.dry_run {
            info!(interface = %args.interface, "dry run, no configuration written");
            return format.write(
                out,
                &Message::new(format!("Dry run: host prepared, {} not created", args.interface)),
            );
        }

        let lifecycle = self.services.lifecycle();
        let outcome = lifecycle.create(&args.interface, &options)?;
        if let CreateOutcome::Created { interface, .. } = &outcome {
            lifecycle.activate(interface)?;
        }

        format.write(out, &outcome)?;
        if let CreateOutcome::Created {
            peer: Some(added), ..
        } = &outcome
        {
            if args.qr {
                write_qr(out, format, added)?;
            }
        }
        Ok(())
    }

    /// Deletes one interface after confirmation.
    pub fn delete<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        interface: &str,
    ) -> Result<(), CliError> {
        fwg_core::validate_interface_name(interface)?;
        let question = format!("Delete {interface} and its keys?");
        if !self.services.prompter().confirm(&question, false)? {
            return format.write(out, &Message::new("Aborted"));
        }

        self.services.lifecycle().delete(interface)?;
        format.write(out, &Message::new(format!("Deleted {interface}")))
    }

    /// Deletes every managed interface after confirmation.
    pub fn delete_all<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        if !self
            .services
            .prompter()
            .confirm("Delete every interface managed by fwg?", false)?
        {
            return format.write(out, &Message::new("Aborted"));
        }

        let report = self.services.lifecycle().delete_all()?;
        format.write(out, &report)?;
        if report.is_complete() {
            Ok(())
        } else {
            Err(CliError::Incomplete(format!(
                "{} interface(s) could not be deleted",
                report.failed.len()
            )))
        }
    }
}
