//! Log of interfaces created by this tool.
//!
//! The log is a plain text file with one interface name per line. It lets
//! the tool tell its own interfaces apart from ones configured by hand or by
//! other software. A missing log file is the empty set.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{FwgError, Result};

const TRACKER_MODE: u32 = 0o644;

/// Append-only, deduplicated set of managed interface names.
#[derive(Debug, Clone)]
pub struct InterfaceTracker {
    path: PathBuf,
}

impl InterfaceTracker {
    /// Creates a tracker backed by the log file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FwgError::io(&self.path, e)),
        }
    }

    /// Returns true if `name` appears as a line in the log.
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self
            .read()?
            .is_some_and(|content| content.lines().any(|line| line.trim() == name)))
    }

    /// Records `name`. Recording an already tracked name does nothing.
    pub fn add(&self, name: &str) -> Result<()> {
        let existing = self.read()?;
        if existing
            .as_deref()
            .is_some_and(|content| content.lines().any(|line| line.trim() == name))
        {
            debug!(interface = %name, "interface already tracked");
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .mode(TRACKER_MODE)
            .open(&self.path)
            .map_err(|e| FwgError::io(&self.path, e))?;

        let mut line = String::new();
        if existing.is_some_and(|content| !content.is_empty() && !content.ends_with('\n')) {
            line.push('\n');
        }
        line.push_str(name);
        line.push('\n');

        file.write_all(line.as_bytes())
            .map_err(|e| FwgError::io(&self.path, e))?;
        debug!(interface = %name, path = %self.path.display(), "interface tracked");
        Ok(())
    }

    /// Forgets `name`, rewriting the log without it and without blank lines.
    ///
    /// Untracked names and a missing log are not errors.
    pub fn remove(&self, name: &str) -> Result<()> {
        let Some(content) = self.read()? else {
            return Ok(());
        };

        let mut found = false;
        let kept: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| {
                if *line == name {
                    found = true;
                    false
                } else {
                    true
                }
            })
            .collect();

        if !found {
            return Ok(());
        }

        let mut output = kept.join("\n");
        if !output.is_empty() {
            output.push('\n');
        }
        fs::write(&self.path, output).map_err(|e| FwgError::io(&self.path, e))?;
        debug!(interface = %name, "interface untracked");
        Ok(())
    }

    /// Returns every tracked name in log order.
    pub fn list_all(&self) -> Result<Vec<String>> {
        Ok(self
            .read()?
            .map(|content| {
                content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Deletes the log file. A missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FwgError::io(&self.path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    fn tracker() -> (tempfile::TempDir, InterfaceTracker) {
        let dir = tempfile::tempdir().expect("tempdir");
        let tracker = InterfaceTracker::new(dir.path().join("managed"));
        (dir, tracker)
    }

    #[test]
    fn missing_file_is_empty() {
        let (_dir, tracker) = tracker();
        assert!(!tracker.contains("wg0").expect("contains"));
        assert!(tracker.list_all().expect("list").is_empty());
    }

    #[test]
    fn add_then_contains() {
        let (_dir, tracker) = tracker();
        tracker.add("wg0").expect("add");
        assert!(tracker.contains("wg0").expect("contains"));
        assert!(!tracker.contains("wg1").expect("contains"));
    }

    #[test]
    fn add_is_idempotent() {
        let (_dir, tracker) = tracker();
        tracker.add("wg0").expect("add");
        tracker.add("wg0").expect("add again");
        let content = fs::read_to_string(tracker.path()).expect("read");
        assert_eq!(content, "wg0\n");
    }

    #[test]
    fn add_creates_file_with_0644() {
        let (_dir, tracker) = tracker();
        tracker.add("wg0").expect("add");
        let mode = fs::metadata(tracker.path()).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn add_after_unterminated_line() {
        let (_dir, tracker) = tracker();
        fs::write(tracker.path(), "wg0").expect("seed");
        tracker.add("wg1").expect("add");
        assert_eq!(tracker.list_all().expect("list"), vec!["wg0", "wg1"]);
    }

    #[test]
    fn contains_matches_whole_lines_only() {
        let (_dir, tracker) = tracker();
        tracker.add("wg10").expect("add");
        assert!(!tracker.contains("wg1").expect("contains"));
    }

    #[test]
    fn remove_then_not_contained() {
        let (_dir, tracker) = tracker();
        tracker.add("wg0").expect("add");
        tracker.add("wg1").expect("add");
        tracker.remove("wg0").expect("remove");
        assert!(!tracker.contains("wg0").expect("contains"));
        assert_eq!(tracker.list_all().expect("list"), vec!["wg1"]);
    }

    #[test]
    fn remove_untracked_is_noop() {
        let (_dir, tracker) = tracker();
        tracker.remove("wg0").expect("remove on missing file");
        tracker.add("wg1").expect("add");
        tracker.remove("wg0").expect("remove untracked");
        assert_eq!(tracker.list_all().expect("list"), vec!["wg1"]);
    }

    #[test]
    fn remove_skips_blank_lines_and_preserves_order() {
        let (_dir, tracker) = tracker();
        fs::write(tracker.path(), "wg2\n\nwg0\n  \nwg1\n").expect("seed");
        tracker.remove("wg0").expect("remove");
        let content = fs::read_to_string(tracker.path()).expect("read");
        assert_eq!(content, "wg2\nwg1\n");
    }

    #[test]
    fn remove_last_leaves_empty_file() {
        let (_dir, tracker) = tracker();
        tracker.add("wg0").expect("add");
        tracker.remove("wg0").expect("remove");
        assert_eq!(fs::read_to_string(tracker.path()).expect("read"), "");
    }

    #[test]
    fn clear_removes_file() {
        let (_dir, tracker) = tracker();
        tracker.add("wg0").expect("add");
        tracker.clear().expect("clear");
        assert!(!tracker.path().exists());
        tracker.clear().expect("clear twice");
    }
}
