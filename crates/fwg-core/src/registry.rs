//! Peer registry keyed by client public key.
//!
//! The registry works on a [`ConfigDocument`]: adding renders one peer block
//! and appends it, removing drops the blocks whose `PublicKey` equals the
//! given key. [`PeerRegistry`] applies the same operations to the
//! configuration files under a [`StorePaths`] directory.
//!
//! Peer names and allowed IPs may contain position placeholders. `[n]` in a
//! name becomes `count + 1` and `[n+1]` in allowed IPs becomes `count + 2`,
//! where `count` is the number of peer blocks in the document before the
//! new block is appended. Suffix 1 is the server's own address.
//!
//! # Conflicts
//!
//! When the incoming key is already registered the caller picks a
//! [`ConflictResolution`]. Both `Overwrite` and `Reuse` remove the existing
//! block and append a freshly rendered one; they differ only in whether the
//! new block carries the incoming name and allowed IPs or the existing ones.
//! Only `Abort` leaves the document untouched.

use serde::Serialize;
use tracing::{debug, info};

use crate::document::{ConfigDocument, InterfaceSettings, PeerBlock};
use crate::error::{FwgError, Result};
use crate::keys::{PrivateKey, PublicKey};
use crate::paths::StorePaths;
use crate::render::{self, ClientFields, PEER_DELIMITER, PeerFields};
use crate::store::ConfigFile;
use crate::types::{AllowedIps, Endpoint};

/// Placeholder for the peer position in a name template.
pub const NAME_PLACEHOLDER: &str = "[n]";

/// Placeholder for the host suffix in an allowed-IP template.
pub const ADDRESS_PLACEHOLDER: &str = "[n+1]";

/// Written into the client document when the client key is not known.
pub const CLIENT_PRIVATE_KEY_PLACEHOLDER: &str = "<your_client_private_key>";

/// MTU used when the interface block does not set one.
pub const DEFAULT_MTU: u16 = 1420;

/// What to do when a peer with the same public key already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Replace the existing block with the incoming values.
    Overwrite,
    /// Re-render the existing block with its own name and allowed IPs.
    Reuse,
    /// Fail with [`FwgError::PeerConflict`].
    Abort,
}

/// A peer to add, before placeholder resolution.
#[derive(Debug, Clone)]
pub struct NewPeer {
    /// Name template, may contain `[n]`.
    pub name: String,
    /// Allowed-IP template, may contain `[n+1]`.
    pub allowed_ips: String,
    /// Client public key.
    pub public_key: PublicKey,
    /// Client private key, written into the client document if known.
    pub private_key: Option<PrivateKey>,
}

/// Server values needed for the client document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    /// Public key of the server interface.
    pub server_public_key: PublicKey,
    /// Address clients connect to.
    pub endpoint: Endpoint,
    /// Tunnel MTU.
    pub mtu: u16,
}

impl ClientContext {
    /// Derives the context from the server's interface settings.
    ///
    /// # Errors
    ///
    /// Fails if the interface block lacks a valid `PrivateKey` or a
    /// `ListenPort`.
    pub fn from_settings(settings: &InterfaceSettings, public_host: &str) -> Result<Self> {
        let server_public_key = settings.private_key()?.public_key();
        let port = settings.require_listen_port()?;
        Ok(Self {
            server_public_key,
            endpoint: Endpoint::new(public_host, port),
            mtu: settings.mtu.unwrap_or(DEFAULT_MTU),
        })
    }
}

/// Result of adding a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddedPeer {
    /// The stored values after placeholder resolution.
    pub peer: PeerBlock,
    /// Rendered client document. Never persisted.
    pub client_config: String,
    /// True if an existing block with the same key was removed first.
    pub replaced: bool,
    /// The rendered peer block that was appended.
    #[serde(skip)]
    pub block: String,
}

/// Replaces every `token` in `template` with `value`.
#[must_use]
pub fn resolve_placeholder(template: &str, token: &str, value: usize) -> String {
    template.replace(token, &value.to_string())
}

fn validate_peer_name(name: &str) -> Result<()> {
    if name.contains(['\n', '\r']) || name.contains(PEER_DELIMITER) {
        return Err(FwgError::InvalidPeerName(name.to_string()));
    }
    Ok(())
}

/// Adds `peer` to `document` and renders the matching client document.
///
/// `on_conflict` is called only if the key is already registered.
///
/// # Errors
///
/// Returns [`FwgError::PeerConflict`] if `on_conflict` answers `Abort`,
/// and validation errors for names or allowed IPs that cannot be stored.
pub fn add_peer<F>(
    document: &mut ConfigDocument,
    peer: &NewPeer,
    client: &ClientContext,
    on_conflict: F,
) -> Result<AddedPeer>
where
    F: FnOnce(&PeerBlock) -> Result<ConflictResolution>,
{
    let key = peer.public_key.to_base64();

    let (name_template, ips_template, replaced) = match document.find(&key) {
        Some(existing) => match on_conflict(&existing)? {
            ConflictResolution::Abort => {
                return Err(FwgError::PeerConflict { public_key: key });
            }
            ConflictResolution::Overwrite => {
                (peer.name.trim().to_string(), peer.allowed_ips.trim().to_string(), true)
            }
            ConflictResolution::Reuse => (existing.name, existing.allowed_ips, true),
        },
        None => (peer.name.trim().to_string(), peer.allowed_ips.trim().to_string(), false),
    };

    let mut next = document.clone();
    if replaced {
        let removed = next.remove_peer(&key);
        debug!(peer = %peer.public_key, removed, "removed conflicting peer block");
    }

    let count = next.section_count();
    let name = resolve_placeholder(&name_template, NAME_PLACEHOLDER, count + 1);
    let allowed_ips = resolve_placeholder(&ips_template, ADDRESS_PLACEHOLDER, count + 2);

    validate_peer_name(&name)?;
    AllowedIps::parse(&allowed_ips)?;

    let block = render::render_peer(&PeerFields {
        peer_name: name.clone(),
        public_key: key.clone(),
        allowed_ips: allowed_ips.clone(),
    })?;
    next.append(&block);

    let client_config = render::render_client(&ClientFields {
        private_key: peer
            .private_key
            .as_ref()
            .map_or_else(|| CLIENT_PRIVATE_KEY_PLACEHOLDER.to_string(), PrivateKey::to_base64),
        allowed_ips: allowed_ips.clone(),
        server_public_key: client.server_public_key.to_base64(),
        endpoint: client.endpoint.to_string(),
        mtu: client.mtu,
    })?;

    *document = next;
    Ok(AddedPeer {
        peer: PeerBlock {
            name,
            public_key: key,
            allowed_ips,
        },
        client_config,
        replaced,
        block,
    })
}

/// Removes every block registered under `public_key`.
///
/// Returns the number of blocks removed.
pub fn remove_peer(document: &mut ConfigDocument, public_key: &PublicKey) -> usize {
    document.remove_peer(&public_key.to_base64())
}

/// Lists the registered peers in document order.
#[must_use]
pub fn find_all(document: &ConfigDocument) -> Vec<PeerBlock> {
    document.peers()
}

/// File-backed registry over the configuration directory.
#[derive(Debug, Clone)]
pub struct PeerRegistry {
    paths: StorePaths,
}

impl PeerRegistry {
    /// Creates a registry for the files under `paths`.
    #[must_use]
    pub fn new(paths: StorePaths) -> Self {
        Self { paths }
    }

    /// The configuration file of `interface`.
    #[must_use]
    pub fn config_file(&self, interface: &str) -> ConfigFile {
        ConfigFile::new(self.paths.config_file(interface))
    }

    /// Reads the `[Interface]` settings of `interface`.
    pub fn settings(&self, interface: &str) -> Result<InterfaceSettings> {
        self.config_file(interface).load()?.interface_settings()
    }

    /// Adds a peer to the configuration of `interface`.
    ///
    /// Without a conflict the rendered block is appended to the file and
    /// nothing else is touched. After a conflict the whole file is rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`FwgError::NotFound`] if the interface has no configuration
    /// file, and everything [`add_peer`] returns.
    pub fn add_peer<F>(
        &self,
        interface: &str,
        peer: &NewPeer,
        public_host: &str,
        on_conflict: F,
    ) -> Result<AddedPeer>
    where
        F: FnOnce(&PeerBlock) -> Result<ConflictResolution>,
    {
        let file = self.config_file(interface);
        let mut document = file.load()?;
        let client = ClientContext::from_settings(&document.interface_settings()?, public_host)?;

        let added = add_peer(&mut document, peer, &client, on_conflict)?;
        if added.replaced {
            file.save(&document)?;
        } else {
            file.append(&added.block)?;
        }

        info!(
            interface = %interface,
            peer = %added.peer.name,
            allowed_ips = %added.peer.allowed_ips,
            replaced = added.replaced,
            "peer added"
        );
        Ok(added)
    }

    /// Removes the peer registered under `public_key`.
    ///
    /// Returns false, leaving the file untouched, if no block matched.
    pub fn remove_peer(&self, interface: &str, public_key: &PublicKey) -> Result<bool> {
        let file = self.config_file(interface);
        let mut document = file.load()?;
        let removed = remove_peer(&mut document, public_key);
        if removed == 0 {
            debug!(interface = %interface, peer = %public_key, "peer not registered");
            return Ok(false);
        }
        file.save(&document)?;
        info!(interface = %interface, peer = %public_key, "peer removed");
        Ok(true)
    }

    /// Lists the peers of `interface`.
    pub fn find_all(&self, interface: &str) -> Result<Vec<PeerBlock>> {
        Ok(find_all(&self.config_file(interface).load()?))
    }
}
