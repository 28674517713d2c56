//! Source repository trait for playbook snapshots

use crate::Result;
use rollout_fs::NormalizedPath;

/// Local branch force-updated to the requested ref before every snapshot.
pub const CONTROL_BRANCH: &str = "ROLLOUT_RUN";

/// Remote whose tracking branches are used to resolve refs.
pub const DEFAULT_REMOTE: &str = "origin";

/// Operations the playbook resolver needs from a version-controlled
/// working copy.
///
/// All operations are synchronous and may touch the repository's refs, so
/// callers must not run two of them against the same repository at once.
pub trait SourceRepository {
    /// Whether `path` is the root of a working copy.
    fn is_working_copy(&self, path: &NormalizedPath) -> bool;

    /// Fetch every configured remote using its configured refspecs.
    fn fetch_all(&self, path: &NormalizedPath) -> Result<()>;

    /// Force-create or move [`CONTROL_BRANCH`] to `git_ref`.
    ///
    /// Returns the id of the commit the control branch now points at.
    fn pin_control_branch(&self, path: &NormalizedPath, git_ref: &str) -> Result<String>;

    /// Clone only [`CONTROL_BRANCH`] of the repository at `path` into the
    /// empty directory `dest`.
    fn clone_control_branch(&self, path: &NormalizedPath, dest: &NormalizedPath) -> Result<()>;
}

impl<T: SourceRepository + ?Sized> SourceRepository for &T {
    fn is_working_copy(&self, path: &NormalizedPath) -> bool {
        (**self).is_working_copy(path)
    }

    fn fetch_all(&self, path: &NormalizedPath) -> Result<()> {
        (**self).fetch_all(path)
    }

    fn pin_control_branch(&self, path: &NormalizedPath, git_ref: &str) -> Result<String> {
        (**self).pin_control_branch(path, git_ref)
    }

    fn clone_control_branch(&self, path: &NormalizedPath, dest: &NormalizedPath) -> Result<()> {
        (**self).clone_control_branch(path, dest)
    }
}
