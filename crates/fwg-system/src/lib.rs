//! Host integration for fast-wireguard.
//!
//! Implements the `fwg-core` host traits against a real Linux system:
//!
//! - [`WgToolKeyGenerator`] / [`NativeKeyGenerator`]: server keys
//! - [`SystemdControl`]: `wg-quick@` units via `systemctl`
//! - [`SystemNetworkProbe`]: egress interface and public address
//! - [`TerminalPrompter`] / [`AssumeYes`]: operator questions
//!
//! plus IP forwarding, package installation and QR rendering. Every external
//! program goes through [`command::SafeCommand`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod install;
pub mod keygen;
pub mod network;
pub mod prompt;
pub mod qr;
pub mod service;
pub mod sysctl;

pub use command::{AllowedProgram, SafeCommand};
pub use error::CommandError;
pub use install::{InstallStatus, ensure_installed};
pub use keygen::{NativeKeyGenerator, WgToolKeyGenerator};
pub use network::SystemNetworkProbe;
pub use prompt::{AssumeYes, TerminalPrompter};
pub use service::SystemdControl;
pub use sysctl::IpForwarding;
