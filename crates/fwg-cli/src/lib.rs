//! # fwg-cli
//!
//! Command-line interface for fast-wireguard.
//!
//! Provides commands for:
//! - Creating and deleting `WireGuard` servers
//! - Adding, removing and listing peers
//! - Controlling the `wg-quick@` service
//! - Preparing and restoring the host (package install, IP forwarding)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────┐   ┌──────────────────┐   ┌────────────────────────┐
//! │ fwg-cli │──►│ fwg-core         │──►│ fwg-system             │
//! │ (clap)  │   │ ServerLifecycle  │   │ wg, systemctl, sysctl, │
//! └─────────┘   │ PeerRegistry     │   │ ip, HTTP, terminal     │
//!               └──────────────────┘   └────────────────────────┘
//! ```
//!
//! [`run`] dispatches a parsed [`Cli`] against the real host services.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::io::Write;

pub mod cli;
pub mod commands;
pub mod context;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, CreateArgs, Format, InterfaceArg, PeerAddArgs, PeerCommands};
pub use context::Services;
pub use error::CliError;
pub use output::OutputFormat;

use commands::{PeerCommand, ServerCommand, ServiceAction, ServiceCommand, SetupCommand};

/// Executes `cli`, writing results to `out`.
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<(), CliError> {
    let format = OutputFormat::new(cli.format);
    let services = Services::from_cli(cli);

    let (action, arg) = match &cli.command {
        Commands::Create(args) => return ServerCommand::new(&services).create(out, &format, args),
        Commands::Delete(arg) => {
            return ServerCommand::new(&services).delete(out, &format, &arg.interface);
        }
        Commands::DeleteAll => return ServerCommand::new(&services).delete_all(out, &format),
        Commands::Peer { command } => {
            return PeerCommand::new(&services).execute(out, &format, command);
        }
        Commands::Install => return SetupCommand::new(&services).install(out, &format),
        Commands::Uninstall => return SetupCommand::new(&services).uninstall(out, &format),
        Commands::Status(arg) => (ServiceAction::Status, arg),
        Commands::Start(arg) => (ServiceAction::Start, arg),
        Commands::Stop(arg) => (ServiceAction::Stop, arg),
        Commands::Restart(arg) => (ServiceAction::Restart, arg),
        Commands::Enable(arg) => (ServiceAction::Enable, arg),
        Commands::Disable(arg) => (ServiceAction::Disable, arg),
    };
    ServiceCommand::new(&services).execute(out, &format, action, &arg.interface)
}
