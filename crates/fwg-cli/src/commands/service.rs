//! Service control and status commands.

use std::io::Write;

use crate::context::Services;
use crate::error::CliError;
use crate::output::{InterfaceStatus, Message, OutputFormat};

/// A `wg-quick@` unit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    /// Report the state.
    Status,
    /// Start the unit.
    Start,
    /// Stop the unit.
    Stop,
    /// Restart the unit.
    Restart,
    /// Enable at boot.
    Enable,
    /// Disable at boot.
    Disable,
}

/// Handler for service subcommands.
pub struct ServiceCommand<'a> {
    services: &'a Services,
}

impl<'a> ServiceCommand<'a> {
    /// Creates a new service command handler.
    #[must_use]
    pub const fn new(services: &'a Services) -> Self {
        Self { services }
    }

    /// Runs `action` on `interface`.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        action: ServiceAction,
        interface: &str,
    ) -> Result<(), CliError> {
        let lifecycle = self.services.lifecycle();
        let state = match action {
            ServiceAction::Status => lifecycle.state(interface)?,
            ServiceAction::Start => lifecycle.start(interface)?,
            ServiceAction::Stop => lifecycle.stop(interface)?,
            ServiceAction::Restart => lifecycle.restart(interface)?,
            ServiceAction::Enable => {
                lifecycle.enable(interface)?;
                return format.write(out, &Message::new(format!("Enabled {interface} at boot")));
            }
            ServiceAction::Disable => {
                lifecycle.disable(interface)?;
                return format.write(out, &Message::new(format!("Disabled {interface} at boot")));
            }
        };

        format.write(
            out,
            &InterfaceStatus {
                interface: interface.to_string(),
                state,
            },
        )
    }
}
