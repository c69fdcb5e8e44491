//! WireGuard configuration file generation.
//!
//! Three fixed templates cover every file this tool writes: the server
//! document, one appended `[Peer]` block, and the client document handed to
//! the operator. Templates use `{field}` placeholders; rendering fails if a
//! placeholder has no value. Output depends only on the field values.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{FwgError, Result};

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").unwrap_or_else(|_| unreachable!()));

/// Marker opening every peer block.
pub const PEER_DELIMITER: &str = "[Peer]";

/// Comment prefix carrying the peer display name.
pub const PEER_NAME_PREFIX: &str = "# Peer name";

const SERVER_TEXT: &str = "\
[Interface]
# {interface} managed by fwg
PrivateKey = {private_key}
Address = {address}
ListenPort = {listen_port}
MTU = {mtu}
PostUp = iptables -A FORWARD -i %i -j ACCEPT; iptables -A FORWARD -o %i -j ACCEPT; iptables -t nat -A POSTROUTING -o {egress_interface} -j MASQUERADE; ip6tables -A FORWARD -i %i -j ACCEPT; ip6tables -A FORWARD -o %i -j ACCEPT; ip6tables -t nat -A POSTROUTING -o {egress_interface} -j MASQUERADE
PostDown = iptables -D FORWARD -i %i -j ACCEPT; iptables -D FORWARD -o %i -j ACCEPT; iptables -t nat -D POSTROUTING -o {egress_interface} -j MASQUERADE; ip6tables -D FORWARD -i %i -j ACCEPT; ip6tables -D FORWARD -o %i -j ACCEPT; ip6tables -t nat -D POSTROUTING -o {egress_interface} -j MASQUERADE
";

const PEER_TEXT: &str = "
[Peer]
# Peer name {peer_name}
PublicKey = {public_key}
AllowedIPs = {allowed_ips}
";

const CLIENT_TEXT: &str = "\
[Interface]
PrivateKey = {private_key}
Address = {allowed_ips}
MTU = {mtu}

[Peer]
PublicKey = {server_public_key}
Endpoint = {endpoint}
AllowedIPs = 0.0.0.0/0, ::/0
PersistentKeepalive = 25
";

/// Values a template can look up by name.
pub trait TemplateFields {
    /// Returns the value for `name`, or `None` if the field is unknown.
    fn field(&self, name: &str) -> Option<String>;
}

/// A named text template with `{field}` placeholders.
#[derive(Debug, Clone, Copy)]
pub struct Template {
    name: &'static str,
    text: &'static str,
}

impl Template {
    /// The server document template.
    pub const SERVER: Self = Self::new("server", SERVER_TEXT);
    /// The peer block template.
    pub const PEER: Self = Self::new("peer", PEER_TEXT);
    /// The client document template.
    pub const CLIENT: Self = Self::new("client", CLIENT_TEXT);

    /// Creates a template.
    #[must_use]
    pub const fn new(name: &'static str, text: &'static str) -> Self {
        Self { name, text }
    }

    /// Substitutes every placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`FwgError::UnresolvedField`] for the first placeholder that
    /// `fields` cannot supply.
    pub fn render(&self, fields: &impl TemplateFields) -> Result<String> {
        let mut output = String::with_capacity(self.text.len());
        let mut last = 0;
        for caps in PLACEHOLDER_REGEX.captures_iter(self.text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = fields
                .field(name.as_str())
                .ok_or_else(|| FwgError::UnresolvedField {
                    template: self.name,
                    field: name.as_str().to_string(),
                })?;
            output.push_str(&self.text[last..whole.start()]);
            output.push_str(&value);
            last = whole.end();
        }
        output.push_str(&self.text[last..]);
        Ok(output)
    }
}

/// Values for the server document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerFields {
    /// Interface name, e.g. `wg0`.
    pub interface: String,
    /// Server private key (base64).
    pub private_key: String,
    /// UDP listen port.
    pub listen_port: u16,
    /// Comma-separated interface addresses in CIDR form.
    pub address: String,
    /// Interface MTU.
    pub mtu: u16,
    /// Physical interface used for NAT.
    pub egress_interface: String,
}

impl TemplateFields for ServerFields {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "interface" => Some(self.interface.clone()),
            "private_key" => Some(self.private_key.clone()),
            "listen_port" => Some(self.listen_port.to_string()),
            "address" => Some(self.address.clone()),
            "mtu" => Some(self.mtu.to_string()),
            "egress_interface" => Some(self.egress_interface.clone()),
            _ => None,
        }
    }
}

/// Values for one `[Peer]` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerFields {
    /// Display name written as a comment.
    pub peer_name: String,
    /// Client public key (base64).
    pub public_key: String,
    /// Comma-separated allowed IPs.
    pub allowed_ips: String,
}

impl TemplateFields for PeerFields {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "peer_name" => Some(self.peer_name.clone()),
            "public_key" => Some(self.public_key.clone()),
            "allowed_ips" => Some(self.allowed_ips.clone()),
            _ => None,
        }
    }
}

/// Values for the client document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientFields {
    /// Client private key, or a placeholder the operator fills in.
    pub private_key: String,
    /// Addresses assigned to the client.
    pub allowed_ips: String,
    /// Server public key (base64).
    pub server_public_key: String,
    /// `host:port` of the server; IPv6 hosts are bracketed.
    pub endpoint: String,
    /// Tunnel MTU.
    pub mtu: u16,
}

impl TemplateFields for ClientFields {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "private_key" => Some(self.private_key.clone()),
            "allowed_ips" => Some(self.allowed_ips.clone()),
            "server_public_key" => Some(self.server_public_key.clone()),
            "endpoint" => Some(self.endpoint.clone()),
            "mtu" => Some(self.mtu.to_string()),
            _ => None,
        }
    }
}

/// Renders a full server document.
pub fn render_server(fields: &ServerFields) -> Result<String> {
    Template::SERVER.render(fields)
}

/// Renders one peer block, including its leading blank line.
pub fn render_peer(fields: &PeerFields) -> Result<String> {
    Template::PEER.render(fields)
}

/// Renders a client document.
pub fn render_client(fields: &ClientFields) -> Result<String> {
    Template::CLIENT.render(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_fields() -> ServerFields {
        ServerFields {
            interface: "wg0".into(),
            private_key: "c2VydmVyLXByaXZhdGU=".into(),
            listen_port: 51820,
            address: "10.0.0.1/24, fd00::1/64".into(),
            mtu: 1420,
            egress_interface: "eth0".into(),
        }
    }

    #[test]
    fn server_document_contains_fields() {
        let output = render_server(&server_fields()).expect("render");

        assert!(output.starts_with("[Interface]\n"));
        assert!(output.contains("PrivateKey = c2VydmVyLXByaXZhdGU=\n"));
        assert!(output.contains("Address = 10.0.0.1/24, fd00::1/64\n"));
        assert!(output.contains("ListenPort = 51820\n"));
        assert!(output.contains("MTU = 1420\n"));
        assert!(output.contains("-t nat -A POSTROUTING -o eth0 -j MASQUERADE"));
        assert!(output.contains("-t nat -D POSTROUTING -o eth0 -j MASQUERADE"));
        assert!(!output.contains(PEER_DELIMITER));
        assert!(!output.contains('{'));
    }

    #[test]
    fn peer_block_layout() {
        let output = render_peer(&PeerFields {
            peer_name: "laptop".into(),
            public_key: "cGVlcg==".into(),
            allowed_ips: "10.0.0.2/32".into(),
        })
        .expect("render");

        assert_eq!(
            output,
            "\n[Peer]\n# Peer name laptop\nPublicKey = cGVlcg==\nAllowedIPs = 10.0.0.2/32\n"
        );
    }

    #[test]
    fn client_document_layout() {
        let output = render_client(&ClientFields {
            private_key: "Y2xpZW50".into(),
            allowed_ips: "10.0.0.2/32".into(),
            server_public_key: "c2VydmVy".into(),
            endpoint: "203.0.113.7:51820".into(),
            mtu: 1420,
        })
        .expect("render");

        assert!(output.contains("PrivateKey = Y2xpZW50\n"));
        assert!(output.contains("Address = 10.0.0.2/32\n"));
        assert!(output.contains("PublicKey = c2VydmVy\n"));
        assert!(output.contains("Endpoint = 203.0.113.7:51820\n"));
        assert!(output.contains("MTU = 1420\n"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let fields = server_fields();
        assert_eq!(
            render_server(&fields).expect("first"),
            render_server(&fields).expect("second")
        );
    }

    #[test]
    fn unresolved_field_is_an_error() {
        let template = Template::new("custom", "Name = {peer_name}\nExtra = {missing}\n");
        let fields = PeerFields {
            peer_name: "x".into(),
            public_key: "k".into(),
            allowed_ips: "a".into(),
        };

        let err = template.render(&fields).expect_err("should fail");
        assert!(matches!(
            err,
            FwgError::UnresolvedField { template: "custom", ref field } if field == "missing"
        ));
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let template = Template::new("plain", "[Interface]\n");
        let fields = PeerFields {
            peer_name: String::new(),
            public_key: String::new(),
            allowed_ips: String::new(),
        };
        assert_eq!(template.render(&fields).expect("render"), "[Interface]\n");
    }
}
