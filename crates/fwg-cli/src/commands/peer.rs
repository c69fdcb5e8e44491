//! Peer management commands.

use std::io::Write;

use fwg_core::{KeyGenerator, NewPeer, PrivateKey, PublicKey, ServerOptions};
use fwg_system::NativeKeyGenerator;

use super::write_qr;
use crate::cli::{PeerAddArgs, PeerCommands};
use crate::context::Services;
use crate::error::CliError;
use crate::output::{Message, OutputFormat, PeerList};

/// Handler for peer subcommands.
pub struct PeerCommand<'a> {
    services: &'a Services,
}

impl<'a> PeerCommand<'a> {
    /// Creates a new peer command handler.
    #[must_use]
    pub const fn new(services: &'a Services) -> Self {
        Self { services }
    }

    /// Executes the peer subcommand.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &PeerCommands,
    ) -> Result<(), CliError> {
        match command {
            PeerCommands::Add(args) => self.add(out, format, args),
            PeerCommands::Remove {
                interface,
                public_key,
            } => self.remove(out, format, interface, public_key),
            PeerCommands::List(arg) => self.list(out, format, &arg.interface),
        }
    }

    fn add<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &PeerAddArgs,
    ) -> Result<(), CliError> {
        let (public_key, private_key) = if args.generate_keys {
            let pair = NativeKeyGenerator::ephemeral().generate(&args.interface)?;
            (*pair.public_key(), Some(pair.private_key().clone()))
        } else {
            let public_key = args.public_key.as_deref().ok_or_else(|| {
                CliError::InvalidArgument("--public-key or --generate-keys is required".into())
            })?;
            let private_key = args
                .private_key
                .as_deref()
                .map(|key| PrivateKey::from_base64(key.trim()))
                .transpose()?;
            (PublicKey::from_base64(public_key.trim())?, private_key)
        };

        let defaults = ServerOptions::default();
        let peer = NewPeer {
            name: args.name.clone().unwrap_or(defaults.peer_name),
            allowed_ips: args.allowed_ips.clone().unwrap_or(defaults.client_address),
            public_key,
            private_key,
        };

        let added = self.services.lifecycle().add_peer(&args.interface, &peer)?;
        format.write(out, &added)?;
        if args.qr {
            write_qr(out, format, &added)?;
        }
        Ok(())
    }

    fn remove<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        interface: &str,
        public_key: &str,
    ) -> Result<(), CliError> {
        let key = PublicKey::from_base64(public_key.trim())?;
        let message = if self.services.lifecycle().remove_peer(interface, &key)? {
            format!("Removed peer {key} from {interface}")
        } else {
            format!("No peer with key {key} on {interface}")
        };
        format.write(out, &Message::new(message))
    }

    fn list<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        interface: &str,
    ) -> Result<(), CliError> {
        let peers = self.services.lifecycle().list_peers(interface)?;
        format.write(
            out,
            &PeerList {
                interface: interface.to_string(),
                peers,
            },
        )
    }
}
