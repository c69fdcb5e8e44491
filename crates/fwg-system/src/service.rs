//! `wg-quick@` unit control through systemd.

use fwg_core::{DaemonControl, Result};
use tracing::info;

use crate::command::{AllowedProgram, SafeCommand};

/// Name of the systemd unit for `interface`.
#[must_use]
pub fn unit_name(interface: &str) -> String {
    format!("wg-quick@{interface}")
}

/// Builds `systemctl <verb> wg-quick@<interface>`.
#[must_use]
pub fn unit_command(verb: &str, interface: &str) -> SafeCommand {
    SafeCommand::new(AllowedProgram::Systemctl).args([verb, unit_name(interface).as_str()])
}

/// Controls `wg-quick@` units with `systemctl`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemdControl;

impl SystemdControl {
    /// Creates the controller.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn run(&self, verb: &str, interface: &str) -> Result<()> {
        unit_command(verb, interface).execute()?;
        info!(unit = %unit_name(interface), verb, "systemctl");
        Ok(())
    }
}

impl DaemonControl for SystemdControl {
    fn start(&self, interface: &str) -> Result<()> {
        self.run("start", interface)
    }

    fn stop(&self, interface: &str) -> Result<()> {
        self.run("stop", interface)
    }

    fn restart(&self, interface: &str) -> Result<()> {
        self.run("restart", interface)
    }

    fn enable(&self, interface: &str) -> Result<()> {
        self.run("enable", interface)
    }

    fn disable(&self, interface: &str) -> Result<()> {
        self.run("disable", interface)
    }

    fn is_active(&self, interface: &str) -> Result<bool> {
        // `is-active` exits non-zero for inactive units.
        let output = unit_command("is-active", interface)
            .arg("--quiet")
            .execute_unchecked()?;
        Ok(output.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("start" ; "start")]
    #[test_case("stop" ; "stop")]
    #[test_case("enable" ; "enable")]
    #[test_case("disable" ; "disable")]
    fn unit_commands(verb: &str) {
        let cmd = unit_command(verb, "wg0");
        assert_eq!(cmd.program(), AllowedProgram::Systemctl);
        assert_eq!(cmd.description(), format!("systemctl {verb} wg-quick@wg0"));
    }

    #[test]
    fn unit_name_format() {
        assert_eq!(unit_name("office"), "wg-quick@office");
    }
}
