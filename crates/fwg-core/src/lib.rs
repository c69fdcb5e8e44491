//! `WireGuard` server configuration store for fast-wireguard.
//!
//! This crate owns the text files a `wg-quick` server reads:
//!
//! - [`InterfaceTracker`]: the log of interfaces this tool created
//! - [`ConfigDocument`]: lossless split of a configuration into the
//!   interface block and its `[Peer]` blocks
//! - [`registry`]: add, find and remove peers keyed by public key, with
//!   `[n]` / `[n+1]` placeholder numbering
//! - [`render`]: the server, peer and client templates
//! - [`ServerLifecycle`]: create, run and delete whole interfaces through the
//!   host services in [`host`]
//!
//! The tool is single-operator: no file locking is done, and two
//! invocations against the same interface race with last-writer-wins.
//!
//! # Example
//!
//! ```rust
//! use fwg_core::{ConfigDocument, registry};
//!
//! let doc = ConfigDocument::parse("[Interface]\nListenPort = 51820\n");
//! assert!(registry::find_all(&doc).is_empty());
//! ```

pub mod document;
pub mod error;
pub mod host;
mod keys;
pub mod lifecycle;
pub mod paths;
pub mod registry;
pub mod render;
pub mod store;
mod tracker;
pub mod types;

pub use document::{ConfigDocument, InterfaceSettings, PeerBlock, PeerSection};
pub use error::{FwgError, Result};
pub use host::{DaemonControl, KeyGenerator, NetworkProbe, Prompter};
pub use keys::{KEY_SIZE, KeyPair, PrivateKey, PublicKey};
pub use lifecycle::{
    BulkDeleteReport, CreateOutcome, DEFAULT_INTERFACE, DeleteFailure, Host, ServerLifecycle,
    ServerOptions, ServerState,
};
pub use paths::{StorePaths, validate_interface_name};
pub use registry::{AddedPeer, ConflictResolution, NewPeer, PeerRegistry};
pub use tracker::InterfaceTracker;
pub use types::{AllowedIps, Endpoint};
