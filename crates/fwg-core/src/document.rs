//! Section parsing for `wg-quick` configuration documents.
//!
//! A document is the interface block followed by zero or more peer blocks,
//! each introduced by `[Peer]`. Parsing splits on that delimiter and keeps
//! every byte: text between blocks stays with the block before it, so
//! [`ConfigDocument::to_text`] reproduces the input exactly.

use std::fmt;

use serde::Serialize;

use crate::error::{FwgError, Result};
use crate::keys::PrivateKey;
use crate::render::{PEER_DELIMITER, PEER_NAME_PREFIX};

/// Fields extracted from one `[Peer]` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerBlock {
    /// Display name from the `# Peer name` comment; empty if absent.
    pub name: String,
    /// Client public key, the registry key.
    pub public_key: String,
    /// Allowed IPs as written.
    pub allowed_ips: String,
}

/// Raw text of one peer block, without its leading delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSection {
    raw: String,
}

impl PeerSection {
    /// The text following `[Peer]` up to the next delimiter.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Extracts the labelled fields. Returns `None` when the block has no
    /// public key, which marks it as partial or malformed.
    #[must_use]
    pub fn block(&self) -> Option<PeerBlock> {
        let mut name = String::new();
        let mut public_key = String::new();
        let mut allowed_ips = String::new();

        for line in self.raw.lines().map(str::trim) {
            if let Some(rest) = line.strip_prefix(PEER_NAME_PREFIX) {
                name = rest.trim().to_string();
            } else if let Some(value) = assignment(line, "PublicKey") {
                public_key = value.to_string();
            } else if let Some(value) = assignment(line, "AllowedIPs") {
                allowed_ips = value.to_string();
            }
        }

        if public_key.is_empty() {
            return None;
        }
        Some(PeerBlock {
            name,
            public_key,
            allowed_ips,
        })
    }
}

/// Returns the value of `key = value` if `line` assigns `key`.
fn assignment<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.strip_prefix(key)?
        .trim_start()
        .strip_prefix('=')
        .map(str::trim)
}

/// A parsed configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    interface: String,
    sections: Vec<PeerSection>,
}

impl ConfigDocument {
    /// Splits `text` into the interface block and the peer blocks.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut parts = text.split(PEER_DELIMITER);
        let interface = parts.next().unwrap_or_default().to_string();
        let sections = parts
            .map(|raw| PeerSection {
                raw: raw.to_string(),
            })
            .collect();
        Self {
            interface,
            sections,
        }
    }

    /// Text before the first `[Peer]`.
    #[must_use]
    pub fn interface_text(&self) -> &str {
        &self.interface
    }

    /// Every peer block, including ones without a public key.
    #[must_use]
    pub fn sections(&self) -> &[PeerSection] {
        &self.sections
    }

    /// Number of `[Peer]` delimiters in the document.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Peer blocks that carry a public key, in document order.
    #[must_use]
    pub fn peers(&self) -> Vec<PeerBlock> {
        self.sections.iter().filter_map(PeerSection::block).collect()
    }

    /// Finds the peer whose public key equals `public_key`.
    #[must_use]
    pub fn find(&self, public_key: &str) -> Option<PeerBlock> {
        self.sections
            .iter()
            .filter_map(PeerSection::block)
            .find(|peer| peer.public_key == public_key)
    }

    /// Drops every block whose public key equals `public_key` and returns how
    /// many were removed. Blocks without a key are kept.
    ///
    /// Rendered blocks open with a blank line, which ends up at the tail of
    /// the preceding segment. When the last block goes, that blank line goes
    /// with it, so removing an appended block restores the earlier text.
    pub fn remove_peer(&mut self, public_key: &str) -> usize {
        let matches = |section: &PeerSection| {
            section
                .block()
                .is_some_and(|peer| peer.public_key == public_key)
        };
        let tail_removed = self.sections.last().is_some_and(matches);

        let before = self.sections.len();
        self.sections.retain(|section| !matches(section));

        if tail_removed {
            let tail = match self.sections.last_mut() {
                Some(section) => &mut section.raw,
                None => &mut self.interface,
            };
            if tail.ends_with("\n\n") {
                tail.pop();
            }
        }
        before - self.sections.len()
    }

    /// Appends rendered text (normally one peer block) to the document.
    pub fn append(&mut self, text: &str) {
        let mut combined = self.to_text();
        combined.push_str(text);
        *self = Self::parse(&combined);
    }

    /// Serializes the document back to text.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = self.interface.clone();
        for section in &self.sections {
            output.push_str(PEER_DELIMITER);
            output.push_str(&section.raw);
        }
        output
    }

    /// Reads the `[Interface]` settings.
    pub fn interface_settings(&self) -> Result<InterfaceSettings> {
        InterfaceSettings::parse(&self.interface)
    }
}

impl fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Values read back from the `[Interface]` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceSettings {
    /// `PrivateKey`, base64.
    pub private_key: Option<String>,
    /// `Address`, as written.
    pub address: Option<String>,
    /// `ListenPort`.
    pub listen_port: Option<u16>,
    /// `MTU`.
    pub mtu: Option<u16>,
}

impl InterfaceSettings {
    /// Parses `key = value` lines, ignoring comments and unknown keys.
    ///
    /// # Errors
    ///
    /// Returns [`FwgError::MalformedDocument`] if `ListenPort` or `MTU` is
    /// not a number.
    pub fn parse(text: &str) -> Result<Self> {
        let mut settings = Self::default();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            let line_number = index + 1;

            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "PrivateKey" => settings.private_key = Some(value.to_string()),
                "Address" => settings.address = Some(value.to_string()),
                "ListenPort" => {
                    settings.listen_port = Some(value.parse().map_err(|_| {
                        FwgError::malformed(line_number, format!("invalid ListenPort: {value}"))
                    })?);
                }
                "MTU" => {
                    settings.mtu = Some(value.parse().map_err(|_| {
                        FwgError::malformed(line_number, format!("invalid MTU: {value}"))
                    })?);
                }
                _ => {}
            }
        }

        Ok(settings)
    }

    /// Decodes the interface private key.
    ///
    /// # Errors
    ///
    /// Returns [`FwgError::MalformedDocument`] if the key is missing and a
    /// key error if it does not decode.
    pub fn private_key(&self) -> Result<PrivateKey> {
        let encoded = self
            .private_key
            .as_deref()
            .ok_or_else(|| FwgError::malformed(0, "missing PrivateKey in [Interface] section"))?;
        PrivateKey::from_base64(encoded)
    }

    /// Returns the listen port.
    ///
    /// # Errors
    ///
    /// Returns [`FwgError::MalformedDocument`] if `ListenPort` is absent.
    pub fn require_listen_port(&self) -> Result<u16> {
        self.listen_port
            .ok_or_else(|| FwgError::malformed(0, "missing ListenPort in [Interface] section"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERFACE: &str = "[Interface]\nPrivateKey = aW50ZXJmYWNl\nListenPort = 51820\nMTU = 1420\n";

    fn peer_text(name: &str, key: &str, ips: &str) -> String {
        format!("\n[Peer]\n# Peer name {name}\nPublicKey = {key}\nAllowedIPs = {ips}\n")
    }

    #[test]
    fn empty_document_has_no_peers() {
        let doc = ConfigDocument::parse("");
        assert_eq!(doc.interface_text(), "");
        assert_eq!(doc.section_count(), 0);
        assert!(doc.peers().is_empty());
    }

    #[test]
    fn interface_only() {
        let doc = ConfigDocument::parse(INTERFACE);
        assert_eq!(doc.interface_text(), INTERFACE);
        assert!(doc.peers().is_empty());
    }

    #[test]
    fn peers_in_order() {
        let text = format!(
            "{INTERFACE}{}{}",
            peer_text("a", "KEY_A", "10.0.0.2/32"),
            peer_text("b", "KEY_B", "10.0.0.3/32")
        );
        let doc = ConfigDocument::parse(&text);
        let peers = doc.peers();
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0].name, "a");
        assert_eq!(peers[0].public_key, "KEY_A");
        assert_eq!(peers[1].allowed_ips, "10.0.0.3/32");
    }

    #[test]
    fn parse_is_lossless() {
        let text = format!(
            "{INTERFACE}\n\n# trailing comment{}\n\n\n{}",
            peer_text("a", "KEY_A", "10.0.0.2/32"),
            peer_text("b", "KEY_B", "10.0.0.3/32")
        );
        assert_eq!(ConfigDocument::parse(&text).to_text(), text);
    }

    #[test]
    fn fields_in_any_order_and_unknown_lines_ignored() {
        let text = "[Interface]\n[Peer]\nAllowedIPs = 10.0.0.9/32\nPersistentKeepalive = 25\nPublicKey=KEY_Z\n# Peer name  zed \n";
        let peers = ConfigDocument::parse(text).peers();
        assert_eq!(
            peers,
            vec![PeerBlock {
                name: "zed".into(),
                public_key: "KEY_Z".into(),
                allowed_ips: "10.0.0.9/32".into(),
            }]
        );
    }

    #[test]
    fn block_without_key_is_dropped() {
        let text = format!("{INTERFACE}\n[Peer]\n# Peer name half\n{}", peer_text("a", "KEY_A", "x"));
        let doc = ConfigDocument::parse(&text);
        assert_eq!(doc.section_count(), 2);
        assert_eq!(doc.peers().len(), 1);
    }

    #[test]
    fn trailing_empty_delimiter_is_not_a_peer() {
        let doc = ConfigDocument::parse("[Interface]\n[Peer]");
        assert_eq!(doc.section_count(), 1);
        assert!(doc.peers().is_empty());
    }

    #[test]
    fn remove_matches_exact_key_only() {
        let text = format!(
            "{INTERFACE}{}{}",
            peer_text("a", "KEY", "10.0.0.2/32"),
            peer_text("b", "KEY_LONGER", "10.0.0.3/32")
        );
        let mut doc = ConfigDocument::parse(&text);
        assert_eq!(doc.remove_peer("KEY"), 1);
        let peers = doc.peers();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].public_key, "KEY_LONGER");
    }

    #[test]
    fn remove_missing_key_changes_nothing() {
        let text = format!("{INTERFACE}{}", peer_text("a", "KEY_A", "10.0.0.2/32"));
        let mut doc = ConfigDocument::parse(&text);
        assert_eq!(doc.remove_peer("KEY_B"), 0);
        assert_eq!(doc.to_text(), text);
    }

    #[test]
    fn remove_last_then_append_restores_text() {
        let text = format!(
            "{INTERFACE}{}{}",
            peer_text("a", "KEY_A", "10.0.0.2/32"),
            peer_text("b", "KEY_B", "10.0.0.3/32")
        );
        let mut doc = ConfigDocument::parse(&text);
        assert_eq!(doc.remove_peer("KEY_B"), 1);
        assert_eq!(
            doc.to_text(),
            format!("{INTERFACE}{}", peer_text("a", "KEY_A", "10.0.0.2/32"))
        );

        doc.append(&peer_text("b", "KEY_B", "10.0.0.3/32"));
        assert_eq!(doc.to_text(), text);
    }

    #[test]
    fn remove_middle_keeps_separator() {
        let text = format!(
            "{INTERFACE}{}{}",
            peer_text("a", "KEY_A", "10.0.0.2/32"),
            peer_text("b", "KEY_B", "10.0.0.3/32")
        );
        let mut doc = ConfigDocument::parse(&text);
        assert_eq!(doc.remove_peer("KEY_A"), 1);
        assert_eq!(
            doc.to_text(),
            format!("{INTERFACE}{}", peer_text("b", "KEY_B", "10.0.0.3/32"))
        );
    }

    #[test]
    fn append_adds_section() {
        let mut doc = ConfigDocument::parse(INTERFACE);
        doc.append(&peer_text("a", "KEY_A", "10.0.0.2/32"));
        assert_eq!(doc.section_count(), 1);
        assert_eq!(doc.find("KEY_A").map(|p| p.name), Some("a".to_string()));
    }

    #[test]
    fn interface_settings_parsed() {
        let settings = ConfigDocument::parse(INTERFACE)
            .interface_settings()
            .expect("settings");
        assert_eq!(settings.private_key.as_deref(), Some("aW50ZXJmYWNl"));
        assert_eq!(settings.listen_port, Some(51820));
        assert_eq!(settings.mtu, Some(1420));
        assert_eq!(settings.require_listen_port().expect("port"), 51820);
    }

    #[test]
    fn interface_settings_invalid_port() {
        let err = InterfaceSettings::parse("[Interface]\nListenPort = abc\n").expect_err("invalid");
        assert!(matches!(err, FwgError::MalformedDocument { line: 2, .. }));
    }

    #[test]
    fn interface_settings_missing_key() {
        let settings = InterfaceSettings::parse("[Interface]\nListenPort = 1\n").expect("parse");
        assert!(matches!(
            settings.private_key(),
            Err(FwgError::MalformedDocument { .. })
        ));
    }
}
