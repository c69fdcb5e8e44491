//! Error types for the configuration store.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for configuration store operations.
pub type Result<T> = std::result::Result<T, FwgError>;

/// Errors that can occur while managing WireGuard configuration.
#[derive(Debug, Error)]
pub enum FwgError {
    /// A configuration or tracker file does not exist.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// The missing file.
        path: PathBuf,
    },

    /// A peer with the same public key is already registered.
    #[error("peer with public key {public_key} already exists")]
    PeerConflict {
        /// The conflicting public key.
        public_key: String,
    },

    /// A configuration block is missing a required field or cannot be read.
    #[error("malformed document at line {line}: {message}")]
    MalformedDocument {
        /// 1-based line number, 0 when the whole document is affected.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// A template referenced a field that was not supplied.
    #[error("unresolved field '{field}' in {template} template")]
    UnresolvedField {
        /// Template name.
        template: &'static str,
        /// The placeholder without braces.
        field: String,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// An external tool is missing or exited unsuccessfully.
    #[error("{tool} failed: {message}")]
    ExternalTool {
        /// Program name.
        tool: String,
        /// Failure details.
        message: String,
    },

    /// Network discovery could not produce a result.
    #[error("discovery failed: {0}")]
    Discovery(String),

    /// Invalid base64 encoding.
    #[error("invalid base64 encoding: {0}")]
    InvalidBase64(String),

    /// Invalid key length.
    #[error("invalid key length: expected 32, got {0}")]
    InvalidKeyLength(usize),

    /// Invalid address or CIDR list.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Peer name that cannot be stored in a comment line.
    #[error("invalid peer name: {0:?}")]
    InvalidPeerName(String),

    /// Invalid network interface name.
    #[error("invalid interface name: {0}")]
    InvalidInterfaceName(String),
}

impl FwgError {
    /// Wraps an I/O error, mapping `NotFound` to [`FwgError::NotFound`].
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }

    /// Creates an external tool error.
    pub fn external(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Creates a malformed document error.
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            line,
            message: message.into(),
        }
    }

    /// Returns true if the error means a file is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err = FwgError::io("/tmp/x.conf", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "file not found: /tmp/x.conf");
    }

    #[test]
    fn io_other_stays_io() {
        let err = FwgError::io("/tmp/x.conf", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, FwgError::Io { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn display_conflict() {
        let err = FwgError::PeerConflict {
            public_key: "abc=".into(),
        };
        assert_eq!(err.to_string(), "peer with public key abc= already exists");
    }

    #[test]
    fn display_unresolved_field() {
        let err = FwgError::UnresolvedField {
            template: "peer",
            field: "name".into(),
        };
        assert_eq!(err.to_string(), "unresolved field 'name' in peer template");
    }
}
