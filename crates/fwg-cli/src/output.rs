//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats. Results always go
//! to the writer passed in; diagnostics go through `tracing` to stderr.

use std::io::Write;

use fwg_core::{AddedPeer, BulkDeleteReport, CreateOutcome, PeerBlock, ServerState};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as human-readable text.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// A one-line result.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Text shown to the operator.
    pub message: String,
}

impl Message {
    /// Creates a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.message)?;
        Ok(())
    }
}

/// State of one interface.
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceStatus {
    /// Interface name.
    pub interface: String,
    /// Lifecycle state.
    pub state: ServerState,
}

impl TableDisplay for InterfaceStatus {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}: {}", self.interface, self.state)?;
        Ok(())
    }
}

/// Peers of one interface.
#[derive(Debug, Clone, Serialize)]
pub struct PeerList {
    /// Interface name.
    pub interface: String,
    /// Peers in file order.
    pub peers: Vec<PeerBlock>,
}

impl TableDisplay for PeerList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.peers.is_empty() {
            writeln!(writer, "No peers configured on {}.", self.interface)?;
            return Ok(());
        }

        let name_width = self
            .peers
            .iter()
            .map(|p| p.name.chars().count())
            .chain(std::iter::once(4))
            .max()
            .unwrap_or(4);
        writeln!(
            writer,
            "{:<name_width$}  {:<44}  ALLOWED IPS",
            "NAME", "PUBLIC KEY"
        )?;
        writeln!(writer, "{}", "─".repeat(name_width + 60))?;
        for peer in &self.peers {
            writeln!(
                writer,
                "{:<name_width$}  {:<44}  {}",
                peer.name, peer.public_key, peer.allowed_ips
            )?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} peer(s)", self.peers.len())?;
        Ok(())
    }
}

fn write_client_config<W: Write>(writer: &mut W, added: &AddedPeer) -> Result<(), CliError> {
    writeln!(writer, "Client configuration:")?;
    writeln!(writer, "{}", "═".repeat(34))?;
    write!(writer, "{}", added.client_config)?;
    Ok(())
}

impl TableDisplay for AddedPeer {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let verb = if self.replaced { "Replaced" } else { "Added" };
        writeln!(writer, "{verb} peer {}", self.peer.name)?;
        writeln!(writer, "  Public Key:   {}", self.peer.public_key)?;
        writeln!(writer, "  Allowed IPs:  {}", self.peer.allowed_ips)?;
        writeln!(writer)?;
        write_client_config(writer, self)
    }
}

impl TableDisplay for CreateOutcome {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        match self {
            Self::Created {
                interface,
                server_public_key,
                peer,
            } => {
                writeln!(writer, "Created {interface}")?;
                writeln!(writer, "  Server Public Key:  {server_public_key}")?;
                match peer {
                    Some(added) => {
                        writeln!(writer, "  First Peer:         {}", added.peer.name)?;
                        writeln!(writer)?;
                        write_client_config(writer, added)?;
                    }
                    None => writeln!(writer, "  First Peer:         none")?,
                }
            }
            Self::Skipped { interface } => {
                writeln!(writer, "Kept the existing configuration of {interface}")?;
            }
        }
        Ok(())
    }
}

impl TableDisplay for BulkDeleteReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.deleted.is_empty() && self.failed.is_empty() {
            writeln!(writer, "No managed interfaces.")?;
            return Ok(());
        }
        for interface in &self.deleted {
            writeln!(writer, "deleted  {interface}")?;
        }
        for failure in &self.failed {
            writeln!(writer, "failed   {}: {}", failure.interface, failure.error)?;
        }
        if !self.tracker_cleared {
            writeln!(writer)?;
            writeln!(writer, "Some interfaces remain tracked; fix the errors and retry.")?;
        }
        Ok(())
    }
}
