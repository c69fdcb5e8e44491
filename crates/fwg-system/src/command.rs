//! Validated execution of the external programs this tool drives.
//!
//! Only programs listed in [`AllowedProgram`] can be run. No shell is
//! involved: arguments are passed directly, and arguments containing NUL or
//! line breaks are rejected before the process is spawned. Calls block until
//! the program exits.

use std::fmt;
use std::io::{self, Write};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{CommandError, Result};

/// Programs this crate is allowed to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AllowedProgram {
    /// `wg` from wireguard-tools.
    Wg,
    /// `systemctl` for `wg-quick@` units.
    Systemctl,
    /// `sysctl` for forwarding settings.
    Sysctl,
    /// `ip` from iproute2.
    Ip,
    /// Debian/Ubuntu package manager.
    Apt,
    /// Fedora/RHEL package manager.
    Dnf,
    /// Older RHEL/CentOS package manager.
    Yum,
    /// Arch Linux package manager.
    Pacman,
}

impl AllowedProgram {
    /// The program name looked up on `PATH`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wg => "wg",
            Self::Systemctl => "systemctl",
            Self::Sysctl => "sysctl",
            Self::Ip => "ip",
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Pacman => "pacman",
        }
    }

    /// Returns true if the program is on `PATH`.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        which::which(self.as_str()).is_ok()
    }
}

impl fmt::Display for AllowedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const FORBIDDEN_CHARS: &[char] = &['\0', '\n', '\r'];

/// Output of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output.
    pub stdout: Vec<u8>,
    /// Standard error.
    pub stderr: Vec<u8>,
    /// Exit code, -1 if killed by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    /// Standard output as trimmed UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn stdout_trimmed(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }

    /// Returns true if the exit code was 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Builder for one invocation of an allowed program.
#[derive(Debug, Clone)]
pub struct SafeCommand {
    program: AllowedProgram,
    args: Vec<String>,
    stdin: Option<Vec<u8>>,
    invalid: Option<(String, char)>,
}

impl SafeCommand {
    /// Starts a command for `program`.
    #[must_use]
    pub fn new(program: AllowedProgram) -> Self {
        Self {
            program,
            args: Vec::new(),
            stdin: None,
            invalid: None,
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: &str) -> Self {
        if self.invalid.is_none() {
            if let Some(character) = arg.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
                self.invalid = Some((arg.to_string(), character));
            }
        }
        self.args.push(arg.to_string());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter().fold(self, |cmd, arg| cmd.arg(arg.as_ref()))
    }

    /// Feeds `input` to the program's standard input.
    #[must_use]
    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// The program to run.
    #[must_use]
    pub fn program(&self) -> AllowedProgram {
        self.program
    }

    /// The arguments so far.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// The command line, for logs and errors.
    #[must_use]
    pub fn description(&self) -> String {
        if self.args.is_empty() {
            self.program.as_str().to_string()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    /// Runs the command and fails on a non-zero exit code.
    pub fn execute(self) -> Result<CommandOutput> {
        let description = self.description();
        let output = self.execute_unchecked()?;
        if !output.success() {
            return Err(CommandError::non_zero_exit(
                description,
                output.exit_code,
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }
        Ok(output)
    }

    /// Runs the command and returns its output whatever the exit code.
    pub fn execute_unchecked(mut self) -> Result<CommandOutput> {
        if let Some((argument, character)) = self.invalid.take() {
            return Err(CommandError::InvalidArgument {
                argument,
                character,
            });
        }

        let program = self.program.as_str();
        debug!(command = %self.description(), "running");

        let mut command = Command::new(program);
        command
            .args(&self.args)
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|source| spawn_error(program, source))?;
        if let (Some(input), Some(mut pipe)) = (self.stdin.as_deref(), child.stdin.take()) {
            pipe.write_all(input)
                .map_err(|source| spawn_error(program, source))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|source| spawn_error(program, source))?;

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

fn spawn_error(program: &str, source: io::Error) -> CommandError {
    if source.kind() == io::ErrorKind::NotFound {
        CommandError::ToolMissing {
            program: program.to_string(),
            message: source.to_string(),
        }
    } else {
        CommandError::Spawn {
            program: program.to_string(),
            source,
        }
    }
}
