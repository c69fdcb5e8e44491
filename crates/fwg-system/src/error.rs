//! Error types for host command execution.
//!
//! Command failures are reported as [`CommandError`] inside this crate and
//! converted to [`FwgError::ExternalTool`] at the trait boundary, so callers
//! of the `fwg-core` traits see a single error type.

use fwg_core::FwgError;
use thiserror::Error;

/// Result type alias for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Errors that can occur while running an external program.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program is not installed or not on `PATH`.
    #[error("{program} not found: {message}")]
    ToolMissing {
        /// Program name.
        program: String,
        /// Underlying error.
        message: String,
    },

    /// The program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The program exited unsuccessfully.
    #[error("'{command}' exited with code {exit_code}: {stderr}")]
    NonZeroExit {
        /// The full command line.
        command: String,
        /// Exit code, -1 if killed by a signal.
        exit_code: i32,
        /// Standard error output.
        stderr: String,
    },

    /// An argument contained a forbidden character.
    #[error("invalid argument {argument:?}: contains {character:?}")]
    InvalidArgument {
        /// The rejected argument.
        argument: String,
        /// The offending character.
        character: char,
    },
}

impl CommandError {
    /// Creates a non-zero exit error.
    #[must_use]
    pub fn non_zero_exit(
        command: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        Self::NonZeroExit {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Returns the program name when known.
    #[must_use]
    pub fn program(&self) -> &str {
        match self {
            Self::ToolMissing { program, .. } | Self::Spawn { program, .. } => program,
            Self::NonZeroExit { command, .. } => {
                command.split_whitespace().next().unwrap_or_default()
            }
            Self::InvalidArgument { .. } => "command",
        }
    }
}

impl From<CommandError> for FwgError {
    fn from(err: CommandError) -> Self {
        Self::external(err.program().to_string(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_zero_exit_maps_to_external_tool() {
        let err = CommandError::non_zero_exit("systemctl start wg-quick@wg0", 1, "unit failed");
        assert_eq!(err.program(), "systemctl");

        let converted = FwgError::from(err);
        assert!(matches!(
            converted,
            FwgError::ExternalTool { ref tool, ref message }
                if tool == "systemctl" && message.contains("unit failed")
        ));
    }

    #[test]
    fn tool_missing_display() {
        let err = CommandError::ToolMissing {
            program: "wg".into(),
            message: "cannot find binary path".into(),
        };
        assert_eq!(err.to_string(), "wg not found: cannot find binary path");
    }
}
