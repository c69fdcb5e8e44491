//! Server lifecycle orchestration.
//!
//! [`ServerLifecycle`] composes the tracker, the renderer and the peer
//! registry with the host services from [`crate::host`]. Every transition
//! either completes or returns the first error. Files already written by a
//! failed `create` are left in place; the only compensating action is
//! disabling autostart again when the daemon fails to start right after it
//! was enabled.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::document::PeerBlock;
use crate::error::{FwgError, Result};
use crate::host::{DaemonControl, KeyGenerator, NetworkProbe, Prompter};
use crate::keys::{PrivateKey, PublicKey};
use crate::paths::{StorePaths, validate_interface_name};
use crate::registry::{AddedPeer, ConflictResolution, NewPeer, PeerRegistry};
use crate::render::{self, ServerFields};
use crate::store::{remove_if_exists, write_private};
use crate::tracker::InterfaceTracker;

/// Interface created when none is named.
pub const DEFAULT_INTERFACE: &str = "wg0";

/// Parameters for [`ServerLifecycle::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// UDP listen port.
    pub listen_port: u16,
    /// Server tunnel addresses.
    pub address: String,
    /// Tunnel MTU.
    pub mtu: u16,
    /// Name template for the first peer.
    pub peer_name: String,
    /// Allowed-IP template for the first peer.
    pub client_address: String,
    /// First peer public key. `None` asks the operator; an empty answer
    /// skips the peer.
    pub peer_public_key: Option<String>,
    /// First peer private key, only used in the client document.
    pub peer_private_key: Option<String>,
    /// Overwrite an existing configuration without asking.
    pub force: bool,
    /// Prepare the host only; write nothing.
    pub dry_run: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            listen_port: 51820,
            address: "10.0.0.1/24, fd00::1/64".to_string(),
            mtu: 1420,
            peer_name: "default-peer[n]".to_string(),
            client_address: "10.0.0.[n+1]/32, fd00::[n+1]/128".to_string(),
            peer_public_key: None,
            peer_private_key: None,
            force: false,
            dry_run: false,
        }
    }
}

/// Where an interface is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerState {
    /// No configuration file.
    Absent,
    /// Configuration written, daemon not running.
    Configured,
    /// Daemon running.
    Running,
    /// Daemon stopped by the operator.
    Stopped,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Absent => "absent",
            Self::Configured => "configured",
            Self::Running => "running",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Result of [`ServerLifecycle::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CreateOutcome {
    /// The configuration was written.
    Created {
        /// Interface name.
        interface: String,
        /// Public key of the new server.
        server_public_key: PublicKey,
        /// The first peer, if one was added.
        peer: Option<AddedPeer>,
    },
    /// An existing configuration was kept because the operator declined to
    /// overwrite it.
    Skipped {
        /// Interface name.
        interface: String,
    },
}

/// One interface that [`ServerLifecycle::delete_all`] could not delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFailure {
    /// Interface name.
    pub interface: String,
    /// Error message.
    pub error: String,
}

/// Outcome of deleting every managed interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkDeleteReport {
    /// Interfaces deleted, in tracker order.
    pub deleted: Vec<String>,
    /// Interfaces that failed, in tracker order.
    pub failed: Vec<DeleteFailure>,
    /// True if the tracker log was removed.
    pub tracker_cleared: bool,
}

impl BulkDeleteReport {
    /// Returns true if every interface was deleted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Host services used by the lifecycle.
#[derive(Clone, Copy)]
pub struct Host<'a> {
    /// Server key generation.
    pub keys: &'a dyn KeyGenerator,
    /// Egress interface and public address discovery.
    pub network: &'a dyn NetworkProbe,
    /// Service manager.
    pub daemon: &'a dyn DaemonControl,
    /// Operator questions.
    pub prompter: &'a dyn Prompter,
}

impl fmt::Debug for Host<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}

/// Creates, changes and removes managed interfaces.
#[derive(Debug)]
pub struct ServerLifecycle<'a> {
    paths: StorePaths,
    tracker: InterfaceTracker,
    registry: PeerRegistry,
    host: Host<'a>,
}

impl<'a> ServerLifecycle<'a> {
    /// Creates a lifecycle over the files under `paths`.
    #[must_use]
    pub fn new(paths: StorePaths, host: Host<'a>) -> Self {
        let tracker = InterfaceTracker::new(paths.tracker_path());
        let registry = PeerRegistry::new(paths.clone());
        Self {
            paths,
            tracker,
            registry,
            host,
        }
    }

    /// The store locations.
    #[must_use]
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// The managed-interface log.
    #[must_use]
    pub fn tracker(&self) -> &InterfaceTracker {
        &self.tracker
    }

    /// Reports the current state of `interface`.
    ///
    /// A configured interface whose daemon is down is reported as
    /// [`ServerState::Configured`].
    pub fn state(&self, interface: &str) -> Result<ServerState> {
        validate_interface_name(interface)?;
        if !self.paths.config_file(interface).exists() {
            return Ok(ServerState::Absent);
        }
        if self.host.daemon.is_active(interface)? {
            Ok(ServerState::Running)
        } else {
            Ok(ServerState::Configured)
        }
    }

    fn require_config(&self, interface: &str) -> Result<()> {
        validate_interface_name(interface)?;
        let path = self.paths.config_file(interface);
        if path.exists() {
            Ok(())
        } else {
            Err(FwgError::NotFound { path })
        }
    }

    /// Absent → Configured: generates keys, writes the server configuration,
    /// tracks the interface and optionally adds a first peer.
    ///
    /// If the configuration exists and `force` is unset the operator is asked
    /// before anything is touched; declining returns
    /// [`CreateOutcome::Skipped`].
    pub fn create(&self, interface: &str, options: &ServerOptions) -> Result<CreateOutcome> {
        validate_interface_name(interface)?;
        let config_path = self.paths.config_file(interface);

        if config_path.exists() && !options.force {
            let overwrite = self.host.prompter.confirm(
                &format!("Config file for {interface} already exists. Do you want to overwrite it?"),
                false,
            )?;
            if !overwrite {
                info!(interface = %interface, "keeping existing configuration");
                return Ok(CreateOutcome::Skipped {
                    interface: interface.to_string(),
                });
            }
        }

        let keys = self.host.keys.generate(interface)?;
        let egress = self.host.network.egress_interface()?;
        debug!(interface = %interface, egress = %egress, "egress interface selected");

        let text = render::render_server(&ServerFields {
            interface: interface.to_string(),
            private_key: keys.private_key().to_base64(),
            listen_port: options.listen_port,
            address: options.address.clone(),
            mtu: options.mtu,
            egress_interface: egress,
        })?;
        write_private(&config_path, &text)?;
        self.tracker.add(interface)?;
        info!(interface = %interface, path = %config_path.display(), "server configuration written");

        let public_key = match &options.peer_public_key {
            Some(key) => key.trim().to_string(),
            None => self
                .host
                .prompter
                .input("Input the public key for the peer (Enter to skip):", "")?
                .trim()
                .to_string(),
        };
        if public_key.is_empty() {
            info!(interface = %interface, "no first peer");
            return Ok(CreateOutcome::Created {
                interface: interface.to_string(),
                server_public_key: *keys.public_key(),
                peer: None,
            });
        }

        let private_key = match &options.peer_private_key {
            Some(key) => Some(key.trim().to_string()),
            None if options.peer_public_key.is_none() => Some(
                self.host
                    .prompter
                    .input("Input the private key for the peer (Not necessary, Enter to skip):", "")?
                    .trim()
                    .to_string(),
            ),
            None => None,
        }
        .filter(|key| !key.is_empty())
        .map(|key| PrivateKey::from_base64(&key))
        .transpose()?;

        let peer = NewPeer {
            name: options.peer_name.clone(),
            allowed_ips: options.client_address.clone(),
            public_key: PublicKey::from_base64(&public_key)?,
            private_key,
        };
        let added = self.add_peer(interface, &peer)?;

        Ok(CreateOutcome::Created {
            interface: interface.to_string(),
            server_public_key: *keys.public_key(),
            peer: Some(added),
        })
    }

    /// Adds a peer to an existing interface.
    ///
    /// On a key conflict the operator is asked whether to overwrite; a "no"
    /// keeps the existing name and allowed IPs but still re-renders the block
    /// at the end of the file.
    pub fn add_peer(&self, interface: &str, peer: &NewPeer) -> Result<AddedPeer> {
        self.require_config(interface)?;
        let address = self.host.network.public_address()?;
        let config_path = self.paths.config_file(interface);
        let prompter = self.host.prompter;

        self.registry
            .add_peer(interface, peer, &address.to_string(), |existing| {
                warn!(interface = %interface, peer = %existing.name, "public key already registered");
                let overwrite = prompter.confirm(
                    &format!(
                        "A peer with the same public key already exists in {}. Do you want to overwrite it?",
                        config_path.display()
                    ),
                    false,
                )?;
                Ok(if overwrite {
                    ConflictResolution::Overwrite
                } else {
                    ConflictResolution::Reuse
                })
            })
    }

    /// Removes a peer. Returns false if no peer had that key.
    pub fn remove_peer(&self, interface: &str, public_key: &PublicKey) -> Result<bool> {
        self.require_config(interface)?;
        self.registry.remove_peer(interface, public_key)
    }

    /// Lists the peers of an interface.
    pub fn list_peers(&self, interface: &str) -> Result<Vec<PeerBlock>> {
        self.require_config(interface)?;
        self.registry.find_all(interface)
    }

    /// Configured → Running: enables autostart, then starts the daemon.
    ///
    /// If the start fails autostart is disabled again before the start error
    /// is returned.
    pub fn activate(&self, interface: &str) -> Result<ServerState> {
        self.require_config(interface)?;
        self.host.daemon.enable(interface)?;
        if let Err(err) = self.host.daemon.start(interface) {
            warn!(interface = %interface, error = %err, "start failed, disabling autostart");
            if let Err(undo) = self.host.daemon.disable(interface) {
                warn!(interface = %interface, error = %undo, "could not disable autostart");
            }
            return Err(err);
        }
        info!(interface = %interface, "service enabled and started");
        Ok(ServerState::Running)
    }

    /// Starts the daemon.
    pub fn start(&self, interface: &str) -> Result<ServerState> {
        self.require_config(interface)?;
        self.host.daemon.start(interface)?;
        info!(interface = %interface, "service started");
        Ok(ServerState::Running)
    }

    /// Running → Stopped.
    pub fn stop(&self, interface: &str) -> Result<ServerState> {
        self.require_config(interface)?;
        self.host.daemon.stop(interface)?;
        info!(interface = %interface, "service stopped");
        Ok(ServerState::Stopped)
    }

    /// Restarts the daemon.
    pub fn restart(&self, interface: &str) -> Result<ServerState> {
        self.require_config(interface)?;
        self.host.daemon.restart(interface)?;
        info!(interface = %interface, "service restarted");
        Ok(ServerState::Running)
    }

    /// Starts the daemon at boot.
    pub fn enable(&self, interface: &str) -> Result<()> {
        self.require_config(interface)?;
        self.host.daemon.enable(interface)?;
        info!(interface = %interface, "autostart enabled");
        Ok(())
    }

    /// Stops starting the daemon at boot.
    pub fn disable(&self, interface: &str) -> Result<()> {
        self.require_config(interface)?;
        self.host.daemon.disable(interface)?;
        info!(interface = %interface, "autostart disabled");
        Ok(())
    }

    /// Any → Absent: disables and stops the daemon, removes the
    /// configuration and key files and untracks the interface.
    ///
    /// Stops at the first failing step.
    pub fn delete(&self, interface: &str) -> Result<ServerState> {
        validate_interface_name(interface)?;
        self.host.daemon.disable(interface)?;
        self.host.daemon.stop(interface)?;

        for path in [
            self.paths.config_file(interface),
            self.paths.public_key_file(interface),
            self.paths.private_key_file(interface),
        ] {
            if remove_if_exists(&path)? {
                debug!(path = %path.display(), "removed");
            }
        }

        self.tracker.remove(interface)?;
        info!(interface = %interface, "interface deleted");
        Ok(ServerState::Absent)
    }

    /// Deletes every tracked interface, continuing past failures.
    ///
    /// The tracker log is removed only when every interface was deleted.
    ///
    /// # Errors
    ///
    /// Fails only if the tracker log cannot be read or removed; per-interface
    /// failures are collected in the report.
    pub fn delete_all(&self) -> Result<BulkDeleteReport> {
        let mut report = BulkDeleteReport::default();

        for interface in self.tracker.list_all()? {
            match self.delete(&interface) {
                Ok(_) => report.deleted.push(interface),
                Err(err) => {
                    warn!(interface = %interface, error = %err, "delete failed");
                    report.failed.push(DeleteFailure {
                        interface,
                        error: err.to_string(),
                    });
                }
            }
        }

        if report.is_complete() {
            self.tracker.clear()?;
            report.tracker_cleared = true;
        }
        info!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "bulk delete finished"
        );
        Ok(report)
    }
}
