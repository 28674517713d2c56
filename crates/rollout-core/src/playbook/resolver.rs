//! Playbook source resolution
//!
//! Each [`PlaybookEntry`] resolves to a directory holding its repository:
//! the working tree itself for `dirty`, otherwise a fresh single-branch
//! clone of the control branch pinned to the entry's ref.

use rollout_fs::NormalizedPath;
use rollout_git::SourceRepository;

use super::manifest::{PlaybookEntry, PlaybookManifest};
use super::snapshot::Snapshot;
use crate::{Error, Result};

/// A playbook entry and the directory it resolved to.
#[derive(Debug)]
pub struct ResolvedPlaybook {
    entry: PlaybookEntry,
    directory: NormalizedPath,
    commit: Option<String>,
    snapshot: Option<Snapshot>,
}

impl ResolvedPlaybook {
    pub fn entry(&self) -> &PlaybookEntry {
        &self.entry
    }

    /// The working tree (`dirty`) or the snapshot directory.
    pub fn directory(&self) -> &NormalizedPath {
        &self.directory
    }

    /// Full path to the playbook file.
    pub fn path(&self) -> NormalizedPath {
        self.directory.join(&self.entry.file)
    }

    /// Pinned commit id, `None` for `dirty` entries.
    pub fn commit(&self) -> Option<&str> {
        self.commit.as_deref()
    }

    /// Whether this entry still holds a snapshot directory.
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.as_ref().is_some_and(Snapshot::is_held)
    }

    /// Remove the snapshot directory, if any. Idempotent.
    pub fn release(&mut self) -> Result<()> {
        match &mut self.snapshot {
            Some(snapshot) => snapshot.release(),
            None => Ok(()),
        }
    }
}

/// Every entry of a manifest, resolved in order.
///
/// Owns the snapshots of all entries; [`ResolvedPlaybooks::release`] (or
/// drop) removes them.
#[derive(Debug, Default)]
pub struct ResolvedPlaybooks {
    playbooks: Vec<ResolvedPlaybook>,
}

impl ResolvedPlaybooks {
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedPlaybook> {
        self.playbooks.iter()
    }

    pub fn len(&self) -> usize {
        self.playbooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playbooks.is_empty()
    }

    /// Full playbook file paths, in manifest order.
    pub fn paths(&self) -> Vec<NormalizedPath> {
        self.playbooks.iter().map(ResolvedPlaybook::path).collect()
    }

    /// Release every snapshot, continuing past failures.
    ///
    /// Returns the first error encountered.
    pub fn release(&mut self) -> Result<()> {
        let mut first_error = None;
        for playbook in &mut self.playbooks {
            if let Err(e) = playbook.release() {
                tracing::warn!(playbook = %playbook.entry.label(), error = %e, "Failed to remove snapshot");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl<'a> IntoIterator for &'a ResolvedPlaybooks {
    type Item = &'a ResolvedPlaybook;
    type IntoIter = std::slice::Iter<'a, ResolvedPlaybook>;

    fn into_iter(self) -> Self::IntoIter {
        self.playbooks.iter()
    }
}

/// Resolves playbook entries against repositories under one directory.
///
/// Entries are resolved one at a time; each pin and clone touches refs of
/// the repository, so a resolver must not be shared across threads working
/// on the same repository.
#[derive(Debug)]
pub struct PlaybookResolver<R> {
    repository: R,
    playbook_path: NormalizedPath,
    auto_fetch: bool,
    snapshot_root: Option<NormalizedPath>,
}

impl<R: SourceRepository> PlaybookResolver<R> {
    pub fn new(repository: R, playbook_path: NormalizedPath) -> Self {
        Self {
            repository,
            playbook_path,
            auto_fetch: false,
            snapshot_root: None,
        }
    }

    /// Resolver configured from a manifest's playbook path and auto-fetch flag.
    pub fn from_manifest(repository: R, manifest: &PlaybookManifest) -> Self {
        Self::new(repository, manifest.playbook_path()).with_auto_fetch(manifest.playbook_auto_fetch)
    }

    /// Fetch all remotes before pinning each non-`dirty` entry.
    pub fn with_auto_fetch(mut self, auto_fetch: bool) -> Self {
        self.auto_fetch = auto_fetch;
        self
    }

    /// Create snapshot directories under `root` instead of the system
    /// temporary directory.
    pub fn with_snapshot_root(mut self, root: NormalizedPath) -> Self {
        self.snapshot_root = Some(root);
        self
    }

    pub fn playbook_path(&self) -> &NormalizedPath {
        &self.playbook_path
    }

    /// Resolve a single entry.
    ///
    /// On failure, any snapshot created for the entry has already been
    /// removed.
    pub fn resolve(&self, entry: &PlaybookEntry) -> Result<ResolvedPlaybook> {
        let repo_path = self.playbook_path.join(&entry.repository);
        if !self.repository.is_working_copy(&repo_path) {
            return Err(Error::RepositoryNotFound {
                repository: entry.repository.clone(),
                playbook_path: self.playbook_path.to_native(),
            });
        }

        let mut resolved = if entry.is_dirty() {
            tracing::info!(repository = %entry.repository, "Using working tree as-is");
            ResolvedPlaybook {
                entry: entry.clone(),
                directory: repo_path,
                commit: None,
                snapshot: None,
            }
        } else {
            self.pin(entry, &repo_path)?
        };

        let path = resolved.path();
        if !path.is_file() {
            if let Err(cleanup) = resolved.release() {
                tracing::warn!(playbook = %entry.label(), error = %cleanup, "Snapshot cleanup failed");
            }
            return Err(Error::PlaybookFileNotFound {
                repository: entry.repository.clone(),
                file: entry.file.clone(),
                path: path.to_native(),
            });
        }
        Ok(resolved)
    }

    /// Resolve entries in order.
    ///
    /// If any entry fails, the snapshots of the entries before it are
    /// released before the error is returned.
    pub fn resolve_all(&self, entries: &[PlaybookEntry]) -> Result<ResolvedPlaybooks> {
        let mut resolved = ResolvedPlaybooks::default();
        for entry in entries {
            match self.resolve(entry) {
                Ok(playbook) => resolved.playbooks.push(playbook),
                Err(e) => {
                    tracing::debug!(playbook = %entry.label(), error = %e, "Resolution failed, releasing batch");
                    if let Err(cleanup) = resolved.release() {
                        tracing::warn!(error = %cleanup, "Snapshot cleanup failed");
                    }
                    return Err(e);
                }
            }
        }
        Ok(resolved)
    }

    fn pin(&self, entry: &PlaybookEntry, repo_path: &NormalizedPath) -> Result<ResolvedPlaybook> {
        let vcs_error = |operation: &'static str| {
            let repository = entry.repository.clone();
            move |source: rollout_git::Error| Error::VersionControl {
                repository,
                operation,
                source,
            }
        };

        if self.auto_fetch {
            self.repository
                .fetch_all(repo_path)
                .map_err(vcs_error("fetch"))?;
        }
        let commit = self
            .repository
            .pin_control_branch(repo_path, &entry.git_ref)
            .map_err(vcs_error("pin"))?;

        let mut snapshot = Snapshot::create(self.snapshot_root.as_ref())?;
        if let Err(source) = self
            .repository
            .clone_control_branch(repo_path, snapshot.path())
        {
            snapshot.release()?;
            return Err(vcs_error("clone")(source));
        }

        tracing::info!(
            repository = %entry.repository,
            git_ref = %entry.git_ref,
            %commit,
            snapshot = %snapshot.path(),
            "Pinned playbook snapshot"
        );
        Ok(ResolvedPlaybook {
            entry: entry.clone(),
            directory: snapshot.path().clone(),
            commit: Some(commit),
            snapshot: Some(snapshot),
        })
    }
}
