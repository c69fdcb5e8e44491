//! Curve25519 key material as it appears in `wg-quick` files.
//!
//! Both key kinds are 32 bytes, written as padded standard base64 (44
//! characters). A peer is identified by its public key string, so
//! [`PublicKey`] prints in full; [`PrivateKey`] never does.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use x25519_dalek::{PublicKey as DalekPublic, StaticSecret};

use crate::error::{FwgError, Result};

/// Length of a raw key.
pub const KEY_SIZE: usize = 32;

/// Decodes one base64 key, ignoring surrounding whitespace from files and
/// command output.
fn decode(text: &str) -> Result<[u8; KEY_SIZE]> {
    let raw = BASE64
        .decode(text.trim())
        .map_err(|e| FwgError::InvalidBase64(e.to_string()))?;
    <[u8; KEY_SIZE]>::try_from(raw.as_slice()).map_err(|_| FwgError::InvalidKeyLength(raw.len()))
}

/// Public half of a key pair; the identity of a peer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PublicKey([u8; KEY_SIZE]);

impl PublicKey {
    /// Parses the form used in `PublicKey =` lines.
    pub fn from_base64(text: &str) -> Result<Self> {
        decode(text).map(Self)
    }

    /// The form used in `PublicKey =` lines.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_base64()).finish()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl FromStr for PublicKey {
    type Err = FwgError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base64(s)
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        key.to_base64()
    }
}

impl TryFrom<String> for PublicKey {
    type Error = FwgError;

    fn try_from(text: String) -> Result<Self> {
        Self::from_base64(&text)
    }
}

/// Secret half of a key pair.
///
/// Equality is constant-time and `Debug` is redacted.
#[derive(Clone)]
pub struct PrivateKey(StaticSecret);

impl PrivateKey {
    /// Draws a fresh key from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        Self(StaticSecret::random_from_rng(OsRng))
    }

    /// Wraps raw key bytes. Clamping happens at use, as in `wg`.
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Parses the form used in `PrivateKey =` lines and `wg genkey` output.
    pub fn from_base64(text: &str) -> Result<Self> {
        decode(text).map(Self::from_bytes)
    }

    /// The form used in `PrivateKey =` lines.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0.as_bytes())
    }

    /// Same result as `wg pubkey`.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey(DalekPublic::from(&self.0).to_bytes())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl Eq for PrivateKey {}

/// A private key with its derived public key.
#[derive(Clone)]
pub struct KeyPair {
    private: PrivateKey,
    public: PublicKey,
}

impl KeyPair {
    /// Fresh random pair.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_private_key(PrivateKey::generate())
    }

    /// Pair for an existing private key.
    #[must_use]
    pub fn from_private_key(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }

    /// The private key.
    #[must_use]
    pub const fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// The public key.
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.public
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    // RFC 7748 section 6.1, Alice.
    const ALICE_PRIVATE: &str = "dwdtCnMYpX08FsFyUbJmRd9ML4frwJkqsXf7pR25LCo=";
    const ALICE_PUBLIC: &str = "hSDwCYkwp1R0i33ctD73Wg2/Og0mOBr066SpjqqbTmo=";

    #[test]
    fn derives_the_same_public_key_as_wg() {
        let private = PrivateKey::from_base64(ALICE_PRIVATE).expect("private");
        assert_eq!(private.public_key().to_base64(), ALICE_PUBLIC);
    }

    #[test]
    fn private_key_text_is_stable() {
        let private = PrivateKey::from_base64(ALICE_PRIVATE).expect("private");
        assert_eq!(private.to_base64(), ALICE_PRIVATE);
        assert_eq!(private, PrivateKey::from_base64(&private.to_base64()).expect("again"));
    }

    #[test]
    fn generated_pairs_differ() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.public_key(), b.public_key());
        assert_ne!(a.private_key(), b.private_key());
        assert_eq!(a.public_key(), &a.private_key().public_key());
    }

    #[test]
    fn tool_output_with_newline_parses() {
        let key: PublicKey = format!("{ALICE_PUBLIC}\n").parse().expect("parse");
        assert_eq!(key.to_string(), ALICE_PUBLIC);
    }

    #[test_case("AAAA" => matches Err(FwgError::InvalidKeyLength(3)) ; "too short")]
    #[test_case("not base64!" => matches Err(FwgError::InvalidBase64(_)) ; "not base64")]
    #[test_case("" => matches Err(FwgError::InvalidKeyLength(0)) ; "empty")]
    fn rejects_bad_public_keys(text: &str) -> Result<PublicKey> {
        PublicKey::from_base64(text)
    }

    #[test]
    fn debug_output() {
        let pair = KeyPair::from_private_key(PrivateKey::from_base64(ALICE_PRIVATE).expect("key"));
        let debug = format!("{pair:?} {:?}", pair.private_key());
        assert!(debug.contains(ALICE_PUBLIC));
        assert!(!debug.contains(ALICE_PRIVATE));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn public_key_is_a_json_string() {
        let key = PublicKey::from_base64(ALICE_PUBLIC).expect("key");
        let json = serde_json::to_string(&key).expect("serialize");
        assert_eq!(json, format!("\"{ALICE_PUBLIC}\""));
        assert_eq!(serde_json::from_str::<PublicKey>(&json).expect("deserialize"), key);
        assert!(serde_json::from_str::<PublicKey>("\"short\"").is_err());
    }
}
