//! Host services the lifecycle orchestrator depends on.
//!
//! Each trait is a narrow seam around something that touches the machine:
//! key tooling, network discovery, the service manager and the operator's
//! terminal. `fwg-system` provides the real implementations; the fakes here
//! record calls and return scripted answers for tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::net::IpAddr;

use crate::error::{FwgError, Result};
use crate::keys::{KeyPair, PrivateKey};

/// Produces the server key pair for an interface.
pub trait KeyGenerator {
    /// Generates (and persists, where applicable) a key pair for `interface`.
    fn generate(&self, interface: &str) -> Result<KeyPair>;
}

/// Best-effort network discovery.
pub trait NetworkProbe {
    /// Name of the interface carrying the default route.
    fn egress_interface(&self) -> Result<String>;

    /// Address clients should connect to.
    fn public_address(&self) -> Result<IpAddr>;
}

/// Control of the `wg-quick` service for an interface.
pub trait DaemonControl {
    /// Brings the interface up.
    fn start(&self, interface: &str) -> Result<()>;
    /// Takes the interface down.
    fn stop(&self, interface: &str) -> Result<()>;
    /// Restarts the interface.
    fn restart(&self, interface: &str) -> Result<()>;
    /// Starts the interface at boot.
    fn enable(&self, interface: &str) -> Result<()>;
    /// No longer starts the interface at boot.
    fn disable(&self, interface: &str) -> Result<()>;
    /// Returns true if the interface is currently up.
    fn is_active(&self, interface: &str) -> Result<bool>;
}

/// Interactive questions to the operator.
pub trait Prompter {
    /// Asks a yes/no question.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
    /// Asks for a line of text; an empty answer yields `default`.
    fn input(&self, prompt: &str, default: &str) -> Result<String>;
}

/// Deterministic key generator.
#[derive(Debug, Default)]
pub struct FakeKeyGenerator {
    next_seed: RefCell<u8>,
    generated: RefCell<Vec<String>>,
}

impl FakeKeyGenerator {
    /// Creates a generator whose first key is derived from seed 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interfaces keys were generated for, in call order.
    #[must_use]
    pub fn generated(&self) -> Vec<String> {
        self.generated.borrow().clone()
    }
}

impl KeyGenerator for FakeKeyGenerator {
    fn generate(&self, interface: &str) -> Result<KeyPair> {
        let mut seed = self.next_seed.borrow_mut();
        *seed = seed.wrapping_add(1);
        self.generated.borrow_mut().push(interface.to_string());
        Ok(KeyPair::from_private_key(PrivateKey::from_bytes(
            [*seed; 32],
        )))
    }
}

/// Network probe with fixed answers.
#[derive(Debug, Clone)]
pub struct FakeNetworkProbe {
    egress: Option<String>,
    address: Option<IpAddr>,
}

impl FakeNetworkProbe {
    /// Answers with `egress` and `address`.
    #[must_use]
    pub fn new(egress: impl Into<String>, address: IpAddr) -> Self {
        Self {
            egress: Some(egress.into()),
            address: Some(address),
        }
    }

    /// A probe whose every lookup fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            egress: None,
            address: None,
        }
    }
}

impl NetworkProbe for FakeNetworkProbe {
    fn egress_interface(&self) -> Result<String> {
        self.egress
            .clone()
            .ok_or_else(|| FwgError::Discovery("no egress interface".into()))
    }

    fn public_address(&self) -> Result<IpAddr> {
        self.address
            .ok_or_else(|| FwgError::Discovery("no public address".into()))
    }
}

/// A recorded service manager call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonCall {
    /// `start`
    Start(String),
    /// `stop`
    Stop(String),
    /// `restart`
    Restart(String),
    /// `enable`
    Enable(String),
    /// `disable`
    Disable(String),
}

impl DaemonCall {
    fn verb(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Stop(_) => "stop",
            Self::Restart(_) => "restart",
            Self::Enable(_) => "enable",
            Self::Disable(_) => "disable",
        }
    }
}

/// Service manager that records calls and fails on request.
#[derive(Debug, Default)]
pub struct FakeDaemon {
    calls: RefCell<Vec<DaemonCall>>,
    active: RefCell<Vec<String>>,
    fail_on: RefCell<Vec<&'static str>>,
}

impl FakeDaemon {
    /// Creates a daemon where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call with `verb` (`"start"`, `"stop"`, ...) fail.
    pub fn fail_on(&self, verb: &'static str) {
        self.fail_on.borrow_mut().push(verb);
    }

    /// All calls so far.
    #[must_use]
    pub fn calls(&self) -> Vec<DaemonCall> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: DaemonCall) -> Result<()> {
        let verb = call.verb();
        self.calls.borrow_mut().push(call);
        if self.fail_on.borrow().contains(&verb) {
            return Err(FwgError::external("systemctl", format!("{verb} failed")));
        }
        Ok(())
    }
}

impl DaemonControl for FakeDaemon {
    fn start(&self, interface: &str) -> Result<()> {
        self.record(DaemonCall::Start(interface.to_string()))?;
        self.active.borrow_mut().push(interface.to_string());
        Ok(())
    }

    fn stop(&self, interface: &str) -> Result<()> {
        self.record(DaemonCall::Stop(interface.to_string()))?;
        self.active.borrow_mut().retain(|name| name != interface);
        Ok(())
    }

    fn restart(&self, interface: &str) -> Result<()> {
        self.record(DaemonCall::Restart(interface.to_string()))?;
        let mut active = self.active.borrow_mut();
        if !active.iter().any(|name| name == interface) {
            active.push(interface.to_string());
        }
        Ok(())
    }

    fn enable(&self, interface: &str) -> Result<()> {
        self.record(DaemonCall::Enable(interface.to_string()))
    }

    fn disable(&self, interface: &str) -> Result<()> {
        self.record(DaemonCall::Disable(interface.to_string()))
    }

    fn is_active(&self, interface: &str) -> Result<bool> {
        Ok(self.active.borrow().iter().any(|name| name == interface))
    }
}

/// Prompter that replays queued answers, then falls back to defaults.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    confirms: RefCell<VecDeque<bool>>,
    inputs: RefCell<VecDeque<String>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    /// Creates a prompter that accepts every default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an answer for the next [`Prompter::confirm`].
    #[must_use]
    pub fn with_confirm(self, answer: bool) -> Self {
        self.confirms.borrow_mut().push_back(answer);
        self
    }

    /// Queues an answer for the next [`Prompter::input`].
    #[must_use]
    pub fn with_input(self, answer: impl Into<String>) -> Self {
        self.inputs.borrow_mut().push_back(answer.into());
        self
    }

    /// Prompts shown so far.
    #[must_use]
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        self.asked.borrow_mut().push(prompt.to_string());
        Ok(self.confirms.borrow_mut().pop_front().unwrap_or(default))
    }

    fn input(&self, prompt: &str, default: &str) -> Result<String> {
        self.asked.borrow_mut().push(prompt.to_string());
        Ok(self
            .inputs
            .borrow_mut()
            .pop_front()
            .filter(|answer| !answer.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_keys_are_distinct() {
        let keys = FakeKeyGenerator::new();
        let a = keys.generate("wg0").expect("a");
        let b = keys.generate("wg1").expect("b");
        assert_ne!(a.public_key(), b.public_key());
        assert_eq!(keys.generated(), vec!["wg0", "wg1"]);
    }

    #[test]
    fn failing_probe() {
        let probe = FakeNetworkProbe::failing();
        assert!(matches!(probe.egress_interface(), Err(FwgError::Discovery(_))));
        assert!(matches!(probe.public_address(), Err(FwgError::Discovery(_))));
    }

    #[test]
    fn daemon_records_and_fails() {
        let daemon = FakeDaemon::new();
        daemon.start("wg0").expect("start");
        assert!(daemon.is_active("wg0").expect("active"));

        daemon.fail_on("stop");
        assert!(daemon.stop("wg0").is_err());
        assert!(daemon.is_active("wg0").expect("still active"));
        assert_eq!(
            daemon.calls(),
            vec![DaemonCall::Start("wg0".into()), DaemonCall::Stop("wg0".into())]
        );
    }

    #[test]
    fn prompter_replays_then_defaults() {
        let prompter = ScriptedPrompter::new()
            .with_confirm(false)
            .with_input("")
            .with_input("laptop");

        assert!(!prompter.confirm("first?", true).expect("confirm"));
        assert!(prompter.confirm("second?", true).expect("confirm"));
        assert_eq!(prompter.input("name", "peer").expect("input"), "peer");
        assert_eq!(prompter.input("name", "peer").expect("input"), "laptop");
        assert_eq!(prompter.asked().len(), 4);
    }
}
