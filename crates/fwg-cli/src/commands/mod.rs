//! Command implementations.
//!
//! Each handler borrows the [`Services`](crate::context::Services) for the
//! invocation and writes its result through an [`OutputFormat`](crate::output::OutputFormat).

mod peer;
mod server;
mod service;
mod setup;

pub use peer::PeerCommand;
pub use server::ServerCommand;
pub use service::{ServiceAction, ServiceCommand};
pub use setup::SetupCommand;

use std::io::Write;

use fwg_core::AddedPeer;
use tracing::warn;

use crate::error::CliError;
use crate::output::OutputFormat;

/// Prints the client configuration of `added` as a QR code in table mode.
fn write_qr<W: Write>(
    out: &mut W,
    format: &OutputFormat,
    added: &AddedPeer,
) -> Result<(), CliError> {
    if format.is_json() {
        warn!("QR output is not available in JSON mode");
        return Ok(());
    }
    let code = fwg_system::qr::render_terminal(&added.client_config)?;
    writeln!(out)?;
    writeln!(out, "{code}")?;
    Ok(())
}
