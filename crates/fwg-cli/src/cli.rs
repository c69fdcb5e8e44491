//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fwg_core::{DEFAULT_INTERFACE, ServerOptions};

/// fast-wireguard: set up WireGuard servers and manage their peers.
#[derive(Parser, Debug, Clone)]
#[command(name = "fwg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `<iface>.conf` and key files.
    #[arg(long, global = true, env = "FWG_CONFIG_DIR", default_value = fwg_core::paths::DEFAULT_CONFIG_DIR)]
    pub config_dir: PathBuf,

    /// Managed-interface log. Defaults to a file inside the config directory.
    #[arg(long, global = true, env = "FWG_TRACKER")]
    pub tracker: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Answer yes to every question and take every default.
    #[arg(short, long, global = true, env = "FWG_ASSUME_YES")]
    pub yes: bool,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable output.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Install WireGuard if needed, write a server configuration and start it.
    Create(CreateArgs),

    /// Stop a server and remove its configuration and keys.
    Delete(InterfaceArg),

    /// Delete every interface created by this tool.
    DeleteAll,

    /// Peer management commands.
    Peer {
        /// Peer subcommand to execute.
        #[command(subcommand)]
        command: PeerCommands,
    },

    /// Show whether an interface is configured and running.
    Status(InterfaceArg),

    /// Start the `wg-quick` service.
    Start(InterfaceArg),

    /// Stop the `wg-quick` service.
    Stop(InterfaceArg),

    /// Restart the `wg-quick` service.
    Restart(InterfaceArg),

    /// Start the service at boot.
    Enable(InterfaceArg),

    /// Do not start the service at boot.
    Disable(InterfaceArg),

    /// Install wireguard-tools through the system package manager.
    Install,

    /// Restore IP forwarding and optionally delete all managed interfaces.
    Uninstall,
}

/// A single interface name.
#[derive(Args, Debug, Clone)]
pub struct InterfaceArg {
    /// Interface name.
    #[arg(default_value = DEFAULT_INTERFACE)]
    pub interface: String,
}

/// Arguments for the create command.
///
/// Omitted values take the defaults of [`ServerOptions`].
#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Interface name.
    #[arg(default_value = DEFAULT_INTERFACE)]
    pub interface: String,

    /// UDP listen port [default: 51820].
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Server tunnel addresses [default: 10.0.0.1/24, fd00::1/64].
    #[arg(short, long)]
    pub address: Option<String>,

    /// Tunnel MTU [default: 1420].
    #[arg(short, long)]
    pub mtu: Option<u16>,

    /// First peer name; `[n]` is replaced with the peer number.
    #[arg(short = 'n', long)]
    pub peer_name: Option<String>,

    /// First peer allowed IPs; `[n+1]` is replaced with the peer number plus one.
    #[arg(short = 'c', long = "address-client")]
    pub client_address: Option<String>,

    /// First peer public key. Asked for when omitted.
    #[arg(long)]
    pub peer_public_key: Option<String>,

    /// First peer private key, only written into the client configuration.
    #[arg(long, requires = "peer_public_key")]
    pub peer_private_key: Option<String>,

    /// Overwrite an existing configuration without asking.
    #[arg(short, long)]
    pub force: bool,

    /// Prepare the host (install, IP forwarding) without writing a configuration.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the client configuration as a QR code.
    #[arg(long)]
    pub qr: bool,
}

impl CreateArgs {
    /// Merges the arguments over the default server options.
    #[must_use]
    pub fn options(&self) -> ServerOptions {
        let defaults = ServerOptions::default();
        ServerOptions {
            listen_port: self.port.unwrap_or(defaults.listen_port),
            address: self.address.clone().unwrap_or(defaults.address),
            mtu: self.mtu.unwrap_or(defaults.mtu),
            peer_name: self.peer_name.clone().unwrap_or(defaults.peer_name),
            client_address: self
                .client_address
                .clone()
                .unwrap_or(defaults.client_address),
            peer_public_key: self.peer_public_key.clone(),
            peer_private_key: self.peer_private_key.clone(),
            force: self.force,
            dry_run: self.dry_run,
        }
    }
}

/// Peer subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum PeerCommands {
    /// Add a peer, or replace the peer with the same public key.
    Add(PeerAddArgs),

    /// Remove the peer with the given public key.
    Remove {
        /// Interface name.
        #[arg(default_value = DEFAULT_INTERFACE)]
        interface: String,

        /// Public key of the peer.
        #[arg(short = 'k', long)]
        public_key: String,
    },

    /// List the peers of an interface.
    List(InterfaceArg),
}

/// Arguments for `peer add`.
#[derive(Args, Debug, Clone)]
pub struct PeerAddArgs {
    /// Interface name.
    #[arg(default_value = DEFAULT_INTERFACE)]
    pub interface: String,

    /// Peer public key.
    #[arg(short = 'k', long, required_unless_present = "generate_keys")]
    pub public_key: Option<String>,

    /// Peer private key, only written into the client configuration.
    #[arg(long, requires = "public_key")]
    pub private_key: Option<String>,

    /// Generate a fresh key pair for the peer.
    #[arg(short, long, conflicts_with_all = ["public_key", "private_key"])]
    pub generate_keys: bool,

    /// Peer name; `[n]` is replaced with the peer number.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Allowed IPs; `[n+1]` is replaced with the peer number plus one.
    #[arg(short = 'c', long)]
    pub allowed_ips: Option<String>,

    /// Print the client configuration as a QR code.
    #[arg(long)]
    pub qr: bool,
}
