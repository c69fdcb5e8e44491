//! Owner-only configuration files on disk.

use std::fs::{self, OpenOptions, Permissions};
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::ConfigDocument;
use crate::error::{FwgError, Result};

/// Permission bits for configuration and key files.
pub const CONFIG_FILE_MODE: u32 = 0o600;

/// One `wg-quick` configuration file.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    /// Wraps the file at `path`. Nothing is read until [`ConfigFile::load`].
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads and parses the file.
    ///
    /// # Errors
    ///
    /// Returns [`FwgError::NotFound`] if the file is absent.
    pub fn load(&self) -> Result<ConfigDocument> {
        let text = fs::read_to_string(&self.path).map_err(|e| FwgError::io(&self.path, e))?;
        Ok(ConfigDocument::parse(&text))
    }

    /// Appends `text` to the existing file.
    pub fn append(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .mode(CONFIG_FILE_MODE)
            .open(&self.path)
            .map_err(|e| FwgError::io(&self.path, e))?;
        file.write_all(text.as_bytes())
            .map_err(|e| FwgError::io(&self.path, e))?;
        debug!(path = %self.path.display(), bytes = text.len(), "appended to config");
        Ok(())
    }

    /// Replaces the file contents with `document`.
    pub fn save(&self, document: &ConfigDocument) -> Result<()> {
        write_private(&self.path, &document.to_text())
    }
}

/// Writes `contents` to `path` and forces mode 0600, also when the file
/// already existed with wider permissions.
pub fn write_private(path: &Path, contents: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(CONFIG_FILE_MODE)
        .open(path)
        .map_err(|e| FwgError::io(path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| FwgError::io(path, e))?;
    fs::set_permissions(path, Permissions::from_mode(CONFIG_FILE_MODE))
        .map_err(|e| FwgError::io(path, e))?;
    debug!(path = %path.display(), bytes = contents.len(), "wrote private file");
    Ok(())
}

/// Removes `path`, treating an absent file as already removed.
///
/// Returns true if a file was deleted.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FwgError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode_of(path: &Path) -> u32 {
        fs::metadata(path).expect("metadata").permissions().mode() & 0o777
    }

    #[test]
    fn load_missing_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = ConfigFile::new(dir.path().join("wg0.conf"));
        assert!(!file.exists());
        assert!(file.load().expect_err("missing").is_not_found());
    }

    #[test]
    fn write_private_sets_mode_on_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wg0.conf");
        fs::write(&path, "old").expect("seed");
        fs::set_permissions(&path, Permissions::from_mode(0o644)).expect("chmod");

        write_private(&path, "[Interface]\n").expect("write");

        assert_eq!(mode_of(&path), 0o600);
        assert_eq!(fs::read_to_string(&path).expect("read"), "[Interface]\n");
    }

    #[test]
    fn append_keeps_existing_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = ConfigFile::new(dir.path().join("wg0.conf"));
        write_private(file.path(), "[Interface]\n").expect("write");

        file.append("\n[Peer]\nPublicKey = k\n").expect("append");

        let doc = file.load().expect("load");
        assert_eq!(doc.section_count(), 1);
        assert!(doc.to_text().starts_with("[Interface]\n"));
    }

    #[test]
    fn append_requires_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = ConfigFile::new(dir.path().join("wg0.conf"));
        assert!(file.append("x").expect_err("missing").is_not_found());
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = ConfigFile::new(dir.path().join("wg0.conf"));
        let doc = ConfigDocument::parse("[Interface]\nMTU = 1420\n");
        file.save(&doc).expect("save");
        assert_eq!(file.load().expect("load"), doc);
        assert_eq!(mode_of(file.path()), 0o600);
    }

    #[test]
    fn remove_if_exists_tolerates_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wg0.key");
        assert!(!remove_if_exists(&path).expect("missing"));
        fs::write(&path, "k").expect("seed");
        assert!(remove_if_exists(&path).expect("present"));
        assert!(!path.exists());
    }
}
