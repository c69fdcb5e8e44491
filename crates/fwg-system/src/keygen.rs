//! Server key generation.
//!
//! Both generators store the pair as `<iface>.key` and `<iface>.pub` in the
//! configuration directory with mode 0600.

use fwg_core::store::write_private;
use fwg_core::{KeyGenerator, KeyPair, PrivateKey, PublicKey, Result, StorePaths};
use tracing::{debug, info};

use crate::command::{AllowedProgram, SafeCommand};

fn persist(paths: &StorePaths, interface: &str, pair: &KeyPair) -> Result<()> {
    let private_path = paths.private_key_file(interface);
    let public_path = paths.public_key_file(interface);
    write_private(&private_path, &format!("{}\n", pair.private_key().to_base64()))?;
    write_private(&public_path, &format!("{}\n", pair.public_key().to_base64()))?;
    debug!(
        private = %private_path.display(),
        public = %public_path.display(),
        "key files written"
    );
    Ok(())
}

/// Generates keys with `wg genkey` and `wg pubkey`.
#[derive(Debug, Clone)]
pub struct WgToolKeyGenerator {
    paths: StorePaths,
}

impl WgToolKeyGenerator {
    /// Stores keys under `paths`.
    #[must_use]
    pub fn new(paths: StorePaths) -> Self {
        Self { paths }
    }
}

impl KeyGenerator for WgToolKeyGenerator {
    fn generate(&self, interface: &str) -> Result<KeyPair> {
        let private_text = SafeCommand::new(AllowedProgram::Wg)
            .arg("genkey")
            .execute()?
            .stdout_trimmed();
        let private = PrivateKey::from_base64(&private_text)?;

        let public_text = SafeCommand::new(AllowedProgram::Wg)
            .arg("pubkey")
            .stdin(format!("{private_text}\n"))
            .execute()?
            .stdout_trimmed();
        let public = PublicKey::from_base64(&public_text)?;

        let pair = KeyPair::from_private_key(private);
        if *pair.public_key() != public {
            return Err(fwg_core::FwgError::external(
                "wg",
                "pubkey output does not match the generated private key",
            ));
        }

        persist(&self.paths, interface, &pair)?;
        info!(interface = %interface, public_key = %public, "generated keys with wg");
        Ok(pair)
    }
}

/// Generates keys in-process with x25519.
#[derive(Debug, Clone)]
pub struct NativeKeyGenerator {
    paths: Option<StorePaths>,
}

impl NativeKeyGenerator {
    /// Stores keys under `paths`.
    #[must_use]
    pub fn new(paths: StorePaths) -> Self {
        Self { paths: Some(paths) }
    }

    /// Generates keys without writing key files, for client keys.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self { paths: None }
    }
}

impl KeyGenerator for NativeKeyGenerator {
    fn generate(&self, interface: &str) -> Result<KeyPair> {
        let pair = KeyPair::generate();
        if let Some(paths) = &self.paths {
            persist(paths, interface, &pair)?;
        }
        info!(interface = %interface, public_key = %pair.public_key(), "generated keys");
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    #[test]
    fn native_generator_writes_key_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = StorePaths::new(dir.path());
        let pair = NativeKeyGenerator::new(paths.clone())
            .generate("wg0")
            .expect("generate");

        let private = fs::read_to_string(paths.private_key_file("wg0")).expect("private");
        let public = fs::read_to_string(paths.public_key_file("wg0")).expect("public");
        assert_eq!(private.trim(), pair.private_key().to_base64());
        assert_eq!(public.trim(), pair.public_key().to_base64());

        let mode = fs::metadata(paths.private_key_file("wg0"))
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn ephemeral_generator_writes_nothing() {
        let pair = NativeKeyGenerator::ephemeral().generate("client").expect("generate");
        assert_eq!(pair.private_key().public_key(), *pair.public_key());
    }
}
