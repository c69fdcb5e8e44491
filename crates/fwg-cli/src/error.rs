//! CLI error types.

use fwg_core::FwgError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// A store or host operation failed.
    #[error(transparent)]
    Fwg(#[from] FwgError),

    /// Invalid argument combination.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operator declined a required step.
    #[error("aborted: {0}")]
    Aborted(String),

    /// A bulk operation finished with failures.
    #[error("{0}")]
    Incomplete(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("failed to write output")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_error_display_invalid_argument() {
        let err = CliError::InvalidArgument("--public-key is required".into());
        assert_eq!(err.to_string(), "invalid argument: --public-key is required");
    }

    #[test]
    fn cli_error_is_transparent_over_store_errors() {
        let err = CliError::from(FwgError::InvalidInterfaceName("bad/name".into()));
        assert_eq!(
            err.to_string(),
            FwgError::InvalidInterfaceName("bad/name".into()).to_string()
        );
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        assert!(matches!(CliError::from(io_err), CliError::Io(_)));
    }
}
