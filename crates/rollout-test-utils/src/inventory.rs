//! [`TestInventory`] builder for inventory directory scenarios.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A temporary inventory root with helpers for writing the hosts file and
/// variable files.
///
/// # Example
///
/// ```rust,no_run
/// use rollout_test_utils::inventory::TestInventory;
///
/// let inventory = TestInventory::new();
/// inventory
///     .hosts("[web]\nweb01\n")
///     .group_vars("web", "port: 80\n")
///     .host_vars("web01", "role: primary\n");
/// ```
pub struct TestInventory {
    temp_dir: TempDir,
}

impl Default for TestInventory {
    fn default() -> Self {
        Self::new()
    }
}

impl TestInventory {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the root path of the inventory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `path` relative to the root, creating parents.
    pub fn write(&self, path: &str, content: &str) -> &Self {
        let full_path = self.root().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("TestInventory: failed to write {}: {e}", full_path.display()));
        self
    }

    /// Write the INI hosts file.
    pub fn hosts(&self, content: &str) -> &Self {
        self.write("hosts", content)
    }

    /// Write `group_vars/<group>.yml`.
    pub fn group_vars(&self, group: &str, content: &str) -> &Self {
        self.write(&format!("group_vars/{group}.yml"), content)
    }

    /// Write `host_vars/<host>.yml`.
    pub fn host_vars(&self, host: &str, content: &str) -> &Self {
        self.write(&format!("host_vars/{host}.yml"), content)
    }
}
