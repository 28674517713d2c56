//! git2-backed source repository

use git2::Repository;
use rollout_fs::NormalizedPath;

use crate::provider::{CONTROL_BRANCH, DEFAULT_REMOTE, SourceRepository};
use crate::{Result, helpers};

/// Working copies on the local filesystem, accessed through `git2`.
///
/// Stateless: every call opens the repository it is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitRepository;

impl GitRepository {
    pub fn new() -> Self {
        Self
    }

    fn open(path: &NormalizedPath) -> Result<Repository> {
        Ok(Repository::open(path.to_native())?)
    }
}

impl SourceRepository for GitRepository {
    fn is_working_copy(&self, path: &NormalizedPath) -> bool {
        path.join(".git").is_dir()
    }

    fn fetch_all(&self, path: &NormalizedPath) -> Result<()> {
        tracing::info!(%path, "Fetching all remotes");
        let repo = Self::open(path)?;
        helpers::fetch_all_remotes(&repo)
    }

    fn pin_control_branch(&self, path: &NormalizedPath, git_ref: &str) -> Result<String> {
        let repo = Self::open(path)?;
        let commit = helpers::resolve_pin_target(&repo, DEFAULT_REMOTE, git_ref)?;
        helpers::force_branch(&repo, CONTROL_BRANCH, &commit)?;

        let id = commit.id().to_string();
        tracing::debug!(%path, git_ref, commit = %id, "Pinned {}", CONTROL_BRANCH);
        Ok(id)
    }

    fn clone_control_branch(&self, path: &NormalizedPath, dest: &NormalizedPath) -> Result<()> {
        tracing::debug!(source = %path, %dest, "Cloning {}", CONTROL_BRANCH);
        helpers::clone_single_branch(&path.to_native(), &dest.to_native(), CONTROL_BRANCH)?;
        Ok(())
    }
}
