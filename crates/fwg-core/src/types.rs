//! Address types shared by the registry and the renderer.

use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use crate::error::{FwgError, Result};

/// A comma-separated list of networks in CIDR notation, as written after
/// `Address =` or `AllowedIPs =`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllowedIps {
    networks: Vec<IpNet>,
}

impl AllowedIps {
    /// Parses `10.0.0.2/32, fd00::2/128`.
    ///
    /// # Errors
    ///
    /// Returns [`FwgError::InvalidAddress`] if any entry is not valid CIDR
    /// or the list is empty.
    pub fn parse(s: &str) -> Result<Self> {
        let networks = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<IpNet>()
                    .map_err(|e| FwgError::InvalidAddress(format!("{part}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        if networks.is_empty() {
            return Err(FwgError::InvalidAddress(format!("no networks in '{s}'")));
        }
        Ok(Self { networks })
    }

    /// The parsed networks.
    #[must_use]
    pub fn networks(&self) -> &[IpNet] {
        &self.networks
    }
}

impl FromStr for AllowedIps {
    type Err = FwgError;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AllowedIps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.networks.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// The server endpoint written into client configurations.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Creates an endpoint from a host (IP or DNS name) and port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_ips_dual_stack() {
        let ips = AllowedIps::parse("10.0.0.2/32, fd00::2/128").expect("parse");
        assert_eq!(ips.networks().len(), 2);
        assert!(matches!(ips.networks()[1], IpNet::V6(_)));
        assert_eq!(ips.to_string(), "10.0.0.2/32, fd00::2/128");
    }

    #[test]
    fn allowed_ips_ipv4_only() {
        let ips: AllowedIps = "10.0.0.2/32".parse().expect("parse");
        assert_eq!(ips.networks().len(), 1);
    }

    #[test]
    fn allowed_ips_rejects_unresolved_placeholder() {
        assert!(AllowedIps::parse("10.0.0.[n+1]/32").is_err());
    }

    #[test]
    fn allowed_ips_rejects_empty() {
        assert!(AllowedIps::parse(" , ").is_err());
    }

    #[test]
    fn endpoint_ipv4() {
        let ep = Endpoint::new("203.0.113.7", 51820);
        assert_eq!(ep.to_string(), "203.0.113.7:51820");
    }

    #[test]
    fn endpoint_ipv6_is_bracketed() {
        let ep = Endpoint::new("2001:db8::1", 51820);
        assert_eq!(ep.to_string(), "[2001:db8::1]:51820");
    }

    #[test]
    fn endpoint_hostname() {
        let ep = Endpoint::new("vpn.example.com", 443);
        assert_eq!(ep.to_string(), "vpn.example.com:443");
        assert_eq!(ep.host(), "vpn.example.com");
        assert_eq!(ep.port(), 443);
    }
}
