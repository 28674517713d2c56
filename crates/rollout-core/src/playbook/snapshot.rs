//! Isolated snapshot directories

use rollout_fs::NormalizedPath;
use tempfile::{Builder, TempDir};

use crate::Result;

const PREFIX: &str = "rollout-";

/// A temporary directory holding a pinned checkout.
///
/// The directory is removed by [`Snapshot::release`] or, failing that, when
/// the snapshot is dropped.
#[derive(Debug)]
pub struct Snapshot {
    path: NormalizedPath,
    dir: Option<TempDir>,
}

impl Snapshot {
    /// Create an empty snapshot directory, under `root` if given, otherwise
    /// under the system temporary directory.
    pub fn create(root: Option<&NormalizedPath>) -> Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(PREFIX);
        let dir = match root {
            Some(root) => builder.tempdir_in(root.to_native())?,
            None => builder.tempdir()?,
        };
        let path = NormalizedPath::new(dir.path());
        tracing::debug!(%path, "Created snapshot directory");
        Ok(Self {
            path,
            dir: Some(dir),
        })
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// Whether the directory still exists under this snapshot's ownership.
    pub fn is_held(&self) -> bool {
        self.dir.is_some()
    }

    /// Remove the directory. Calling this again is a no-op.
    pub fn release(&mut self) -> Result<()> {
        if let Some(dir) = self.dir.take() {
            tracing::debug!(path = %self.path, "Removing snapshot directory");
            dir.close()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_release_is_idempotent() {
        let root = tempfile::TempDir::new().unwrap();
        let mut snapshot = Snapshot::create(Some(&NormalizedPath::new(root.path()))).unwrap();
        let path = snapshot.path().to_native();
        assert!(path.is_dir());
        assert!(path.file_name().unwrap().to_string_lossy().starts_with(PREFIX));

        fs::write(path.join("site.yml"), "- hosts: all\n").unwrap();
        snapshot.release().unwrap();
        assert!(!path.exists());
        assert!(!snapshot.is_held());

        snapshot.release().unwrap();
    }

    #[test]
    fn test_drop_removes_directory() {
        let root = tempfile::TempDir::new().unwrap();
        let path = {
            let snapshot = Snapshot::create(Some(&NormalizedPath::new(root.path()))).unwrap();
            snapshot.path().to_native()
        };
        assert!(!path.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
