//! Playbook manifest loading

use rollout_fs::{ConfigStore, Format, NormalizedPath};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Ref that selects the repository's working tree as-is.
pub const DIRTY_REF: &str = "dirty";

/// A playbook to run, identified by repository, file and ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaybookEntry {
    /// Directory name of the repository under the playbook path
    pub repository: String,
    /// Playbook file relative to the repository root
    pub file: String,
    /// Remote branch, tag or commit to pin, or `dirty`
    pub git_ref: String,
}

impl PlaybookEntry {
    pub fn new(
        repository: impl Into<String>,
        file: impl Into<String>,
        git_ref: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            file: file.into(),
            git_ref: git_ref.into(),
        }
    }

    /// Whether this entry uses the working tree without pinning.
    pub fn is_dirty(&self) -> bool {
        self.git_ref == DIRTY_REF
    }

    /// `repository/file`, for display.
    pub fn label(&self) -> String {
        format!("{}/{}", self.repository, self.file)
    }

    fn validate(&self, index: usize) -> Result<()> {
        for (field, value) in [
            ("repository", &self.repository),
            ("file", &self.file),
            ("git_ref", &self.git_ref),
        ] {
            if value.trim().is_empty() {
                return Err(Error::config(format!(
                    "Playbook entry {index} has an empty '{field}'"
                )));
            }
        }
        if self.repository.contains('/') || self.repository == ".." {
            return Err(Error::config(format!(
                "Playbook entry {index}: repository '{}' must be a plain directory name",
                self.repository
            )));
        }
        Ok(())
    }
}

/// The playbook manifest of a deployment environment.
///
/// ```yaml
/// ansible_version: "2.9"
/// playbook_path: ~/src
/// playbook_auto_fetch: true
/// playbooks:
///   - repository: site-playbooks
///     file: site.yml
///     git_ref: release-1.4
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookManifest {
    #[serde(default)]
    pub ansible_version: Option<String>,

    /// Directory holding the playbook repositories; `~` is expanded
    pub playbook_path: String,

    #[serde(default)]
    pub playbook_auto_fetch: bool,

    #[serde(default)]
    pub playbooks: Vec<PlaybookEntry>,
}

/// Caller-supplied values that replace manifest fields after loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestOverrides {
    pub playbook_path: Option<String>,
    pub auto_fetch: Option<bool>,
}

impl PlaybookManifest {
    /// Load a manifest, reading it as YAML whatever its extension.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let manifest: Self = ConfigStore::new()
            .load_as(path, Format::Yaml)
            .map_err(Error::config_document)?;
        manifest.validate()?;
        tracing::debug!(%path, playbooks = manifest.playbooks.len(), "Loaded playbook manifest");
        Ok(manifest)
    }

    /// Apply overrides on top of the loaded values.
    pub fn with_overrides(mut self, overrides: ManifestOverrides) -> Self {
        if let Some(path) = overrides.playbook_path {
            self.playbook_path = path;
        }
        if let Some(auto_fetch) = overrides.auto_fetch {
            self.playbook_auto_fetch = auto_fetch;
        }
        self
    }

    /// The playbook path with a leading `~` expanded.
    pub fn playbook_path(&self) -> NormalizedPath {
        NormalizedPath::expand_home(&self.playbook_path)
    }

    fn validate(&self) -> Result<()> {
        if self.playbook_path.trim().is_empty() {
            return Err(Error::config("Manifest 'playbook_path' is empty"));
        }
        for (index, entry) in self.playbooks.iter().enumerate() {
            entry.validate(index)?;
        }
        Ok(())
    }
}
