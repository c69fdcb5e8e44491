//! Installation of wireguard-tools.

use fwg_core::{FwgError, Prompter, Result};
use tracing::info;

use crate::command::{AllowedProgram, SafeCommand};

/// Package providing `wg` and `wg-quick`.
pub const PACKAGE: &str = "wireguard-tools";

/// Package managers in lookup order.
pub const MANAGERS: &[AllowedProgram] = &[
    AllowedProgram::Apt,
    AllowedProgram::Dnf,
    AllowedProgram::Yum,
    AllowedProgram::Pacman,
];

/// Outcome of [`ensure_installed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    /// `wg` was already on `PATH`.
    AlreadyInstalled,
    /// The package was installed with the given manager.
    Installed(AllowedProgram),
    /// The operator declined the installation.
    Declined,
}

/// Builds the non-interactive install command for `manager`.
#[must_use]
pub fn install_command(manager: AllowedProgram) -> SafeCommand {
    let cmd = SafeCommand::new(manager);
    match manager {
        AllowedProgram::Pacman => cmd.args(["-S", "--noconfirm", PACKAGE]),
        _ => cmd.args(["install", "-y", PACKAGE]),
    }
}

/// Returns the first supported package manager on `PATH`.
#[must_use]
pub fn detect_manager() -> Option<AllowedProgram> {
    MANAGERS.iter().copied().find(AllowedProgram::is_installed)
}

/// Returns the output of `wg --version`, if `wg` runs.
pub fn wg_version() -> Result<String> {
    Ok(SafeCommand::new(AllowedProgram::Wg)
        .arg("--version")
        .execute()?
        .stdout_trimmed())
}

/// Installs wireguard-tools unless `wg` is already available.
///
/// The operator is asked first (default yes).
pub fn ensure_installed(prompter: &dyn Prompter) -> Result<InstallStatus> {
    if AllowedProgram::Wg.is_installed() {
        return Ok(InstallStatus::AlreadyInstalled);
    }
    if !prompter.confirm("WireGuard is not installed. Are you sure to install it now?", true)? {
        return Ok(InstallStatus::Declined);
    }

    let manager = detect_manager().ok_or_else(|| {
        FwgError::external(
            "package manager",
            "no supported package manager found, install wireguard-tools manually",
        )
    })?;
    info!(manager = %manager, package = PACKAGE, "installing");
    install_command(manager).execute()?;
    Ok(InstallStatus::Installed(manager))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(AllowedProgram::Apt, "apt install -y wireguard-tools" ; "apt")]
    #[test_case(AllowedProgram::Dnf, "dnf install -y wireguard-tools" ; "dnf")]
    #[test_case(AllowedProgram::Yum, "yum install -y wireguard-tools" ; "yum")]
    #[test_case(AllowedProgram::Pacman, "pacman -S --noconfirm wireguard-tools" ; "pacman")]
    fn install_commands(manager: AllowedProgram, expected: &str) {
        assert_eq!(install_command(manager).description(), expected);
    }
}
