//! Egress interface and public address discovery.
//!
//! Both lookups try an accurate strategy first and fall back to a local one:
//!
//! - egress interface: the interface owning the source address of a
//!   connected UDP socket, else the first usable interface in
//!   `/sys/class/net`
//! - public address: plain-text echo services over HTTP, else the local
//!   outbound address
//!
//! The UDP socket is only connected, never written to.

use std::fs;
use std::net::{IpAddr, UdpSocket};
use std::path::{Path, PathBuf};
use std::time::Duration;

use fwg_core::{FwgError, InterfaceTracker, NetworkProbe, Result};
use tracing::{debug, info, warn};

use crate::command::{AllowedProgram, SafeCommand};

/// Echo services returning the caller's address as plain text.
pub const IP_PROVIDERS: &[&str] = &[
    "https://api.ipify.org?format=text",
    "https://ifconfig.me/ip",
    "http://checkip.amazonaws.com",
    "https://icanhazip.com",
];

/// Timeout for each echo service request.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

const ROUTE_PROBE: &str = "8.8.8.8:80";
const SYSFS_NET: &str = "/sys/class/net";
const IFF_UP: u32 = 0x1;
const IFF_LOOPBACK: u32 = 0x8;
const VIRTUAL_PREFIXES: &[&str] = &["docker", "veth"];

/// Source address the kernel picks for outbound traffic.
pub fn local_outbound_address() -> Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .map_err(|e| FwgError::Discovery(format!("bind UDP socket: {e}")))?;
    socket
        .connect(ROUTE_PROBE)
        .map_err(|e| FwgError::Discovery(format!("no route to {ROUTE_PROBE}: {e}")))?;
    let address = socket
        .local_addr()
        .map_err(|e| FwgError::Discovery(format!("read socket address: {e}")))?
        .ip();
    Ok(address)
}

/// Finds the interface carrying `address` in `ip -o addr show` output.
#[must_use]
pub fn interface_for_address(output: &str, address: IpAddr) -> Option<String> {
    output.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        let _index = fields.next()?;
        let name = fields.next()?;
        let _family = fields.next()?;
        let cidr = fields.next()?;
        let ip: IpAddr = cidr.split('/').next()?.parse().ok()?;
        (ip == address).then(|| name.split('@').next().unwrap_or(name).to_string())
    })
}

/// Network discovery against the running system.
#[derive(Debug, Clone)]
pub struct SystemNetworkProbe {
    tracker: InterfaceTracker,
    providers: Vec<String>,
    timeout: Duration,
    sysfs_root: PathBuf,
}

impl SystemNetworkProbe {
    /// Creates a probe that skips interfaces recorded in `tracker`.
    #[must_use]
    pub fn new(tracker: InterfaceTracker) -> Self {
        Self {
            tracker,
            providers: IP_PROVIDERS.iter().map(ToString::to_string).collect(),
            timeout: LOOKUP_TIMEOUT,
            sysfs_root: PathBuf::from(SYSFS_NET),
        }
    }

    /// Replaces the echo service list.
    #[must_use]
    pub fn with_providers(mut self, providers: Vec<String>) -> Self {
        self.providers = providers;
        self
    }

    /// Replaces the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads interfaces from `root` instead of `/sys/class/net`.
    #[must_use]
    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    fn is_managed(&self, name: &str) -> bool {
        match self.tracker.contains(name) {
            Ok(managed) => managed,
            Err(err) => {
                warn!(interface = %name, error = %err, "cannot read tracker, skipping interface");
                true
            }
        }
    }

    fn egress_from_route(&self) -> Option<String> {
        let address = local_outbound_address().ok()?;
        let output = SafeCommand::new(AllowedProgram::Ip)
            .args(["-o", "addr", "show"])
            .execute()
            .ok()?;
        let name = interface_for_address(&String::from_utf8_lossy(&output.stdout), address)?;
        (!self.is_managed(&name)).then_some(name)
    }

    /// First interface in the sysfs directory that is up, not loopback,
    /// not a container bridge or veth, and not managed by this tool.
    pub fn egress_from_sysfs(&self) -> Result<String> {
        let entries =
            fs::read_dir(&self.sysfs_root).map_err(|e| FwgError::io(&self.sysfs_root, e))?;

        let mut candidates: Vec<(u32, String)> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let dir = entry.path();
                let flags = read_hex(&dir.join("flags"))?;
                let index = read_decimal(&dir.join("ifindex")).unwrap_or(u32::MAX);
                Some((index, name, flags))
            })
            .filter(|(_, _, flags)| flags & IFF_UP != 0 && flags & IFF_LOOPBACK == 0)
            .filter(|(_, name, _)| !VIRTUAL_PREFIXES.iter().any(|p| name.starts_with(p)))
            .map(|(index, name, _)| (index, name))
            .collect();
        candidates.sort();

        candidates
            .into_iter()
            .map(|(_, name)| name)
            .find(|name| !self.is_managed(name))
            .ok_or_else(|| FwgError::Discovery("no suitable physical interface found".into()))
    }

    fn fetch(&self, client: &reqwest::blocking::Client, url: &str) -> Option<IpAddr> {
        let response = client.get(url).send().ok()?.error_for_status().ok()?;
        response.text().ok()?.trim().parse().ok()
    }
}

fn read_hex(path: &Path) -> Option<u32> {
    let text = fs::read_to_string(path).ok()?;
    let text = text.trim();
    u32::from_str_radix(text.strip_prefix("0x").unwrap_or(text), 16).ok()
}

fn read_decimal(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

impl NetworkProbe for SystemNetworkProbe {
    fn egress_interface(&self) -> Result<String> {
        if let Some(name) = self.egress_from_route() {
            info!(interface = %name, "egress interface from route lookup");
            return Ok(name);
        }
        debug!("route lookup failed, scanning interfaces");
        let name = self.egress_from_sysfs()?;
        info!(interface = %name, "egress interface from interface scan");
        Ok(name)
    }

    fn public_address(&self) -> Result<IpAddr> {
        match reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
        {
            Ok(client) => {
                for url in &self.providers {
                    if let Some(address) = self.fetch(&client, url) {
                        info!(address = %address, provider = %url, "public address");
                        return Ok(address);
                    }
                    debug!(provider = %url, "address lookup failed");
                }
            }
            Err(err) => warn!(error = %err, "cannot build HTTP client"),
        }

        warn!("could not fetch public address, falling back to local address");
        let address = local_outbound_address()?;
        info!(address = %address, "local outbound address (may not be reachable from outside)");
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IP_ADDR_OUTPUT: &str = "\
1: lo    inet 127.0.0.1/8 scope host lo\\       valid_lft forever preferred_lft forever
2: eth0    inet 192.168.1.10/24 brd 192.168.1.255 scope global dynamic eth0\\       valid_lft 85000sec
2: eth0    inet6 2001:db8::10/64 scope global dynamic\\       valid_lft 85000sec
5: veth1a2b@if4    inet 172.17.0.1/16 scope global veth1a2b\\       valid_lft forever
";

    fn add_interface(root: &Path, name: &str, index: u32, flags: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("flags"), format!("{flags}\n")).expect("flags");
        fs::write(dir.join("ifindex"), format!("{index}\n")).expect("ifindex");
    }

    fn probe(dir: &tempfile::TempDir) -> SystemNetworkProbe {
        let tracker = InterfaceTracker::new(dir.path().join("managed"));
        SystemNetworkProbe::new(tracker).with_sysfs_root(dir.path().join("net"))
    }

    #[test]
    fn finds_interface_by_ipv4() {
        let found = interface_for_address(IP_ADDR_OUTPUT, "192.168.1.10".parse().expect("ip"));
        assert_eq!(found.as_deref(), Some("eth0"));
    }

    #[test]
    fn finds_interface_by_ipv6() {
        let found = interface_for_address(IP_ADDR_OUTPUT, "2001:db8::10".parse().expect("ip"));
        assert_eq!(found.as_deref(), Some("eth0"));
    }

    #[test]
    fn strips_peer_suffix() {
        let found = interface_for_address(IP_ADDR_OUTPUT, "172.17.0.1".parse().expect("ip"));
        assert_eq!(found.as_deref(), Some("veth1a2b"));
    }

    #[test]
    fn unknown_address() {
        assert!(interface_for_address(IP_ADDR_OUTPUT, "10.9.9.9".parse().expect("ip")).is_none());
    }

    #[test]
    fn sysfs_scan_skips_loopback_down_and_virtual() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("net");
        add_interface(&root, "lo", 1, "0x9");
        add_interface(&root, "docker0", 2, "0x1003");
        add_interface(&root, "eth1", 4, "0x1002");
        add_interface(&root, "ens3", 5, "0x1003");
        add_interface(&root, "ens4", 6, "0x1003");

        assert_eq!(probe(&dir).egress_from_sysfs().expect("scan"), "ens3");
    }

    #[test]
    fn sysfs_scan_skips_managed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("net");
        add_interface(&root, "wg0", 3, "0x91");
        add_interface(&root, "eth0", 7, "0x1003");
        InterfaceTracker::new(dir.path().join("managed"))
            .add("wg0")
            .expect("track");

        assert_eq!(probe(&dir).egress_from_sysfs().expect("scan"), "eth0");
    }

    #[test]
    fn sysfs_scan_without_candidates() {
        let dir = tempfile::tempdir().expect("tempdir");
        add_interface(&dir.path().join("net"), "lo", 1, "0x9");
        assert!(matches!(
            probe(&dir).egress_from_sysfs(),
            Err(FwgError::Discovery(_))
        ));
    }
}
