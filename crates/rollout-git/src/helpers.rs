//! Shared git2 helper functions for pinning and snapshotting
//!
//! These functions encapsulate the git2 calls behind [`GitRepository`](crate::GitRepository).

use std::path::Path;

use git2::build::RepoBuilder;
use git2::{
    BranchType, Commit, Config, Cred, CredentialType, FetchOptions, RemoteCallbacks, Repository,
};

use crate::{Error, Result};

/// User name offered to ssh remotes whose URL names none.
const DEFAULT_SSH_USER: &str = "git";

/// Credentials offered to an authenticating remote.
///
/// The ssh agent and the configured credential helper are each tried once
/// per fetch, after which the remote's request fails instead of repeating.
pub(crate) struct CredentialChain {
    config: Config,
    tried_agent: bool,
    tried_helper: bool,
}

impl CredentialChain {
    pub(crate) fn new(config: Config) -> Self {
        Self {
            config,
            tried_agent: false,
            tried_helper: false,
        }
    }

    pub(crate) fn next(
        &mut self,
        url: &str,
        username: Option<&str>,
        allowed: CredentialType,
    ) -> std::result::Result<Cred, git2::Error> {
        let user = username.unwrap_or(DEFAULT_SSH_USER);
        if allowed.contains(CredentialType::USERNAME) {
            return Cred::username(user);
        }
        if allowed.contains(CredentialType::SSH_KEY) && !self.tried_agent {
            self.tried_agent = true;
            tracing::debug!(url, user, "Offering ssh agent credentials");
            return Cred::ssh_key_from_agent(user);
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) && !self.tried_helper {
            self.tried_helper = true;
            tracing::debug!(url, "Asking git credential helper");
            return Cred::credential_helper(&self.config, url, username);
        }
        Err(git2::Error::from_str(&format!("no accepted credentials for {url}")))
    }
}

fn fetch_options(repo: &Repository) -> Result<FetchOptions<'static>> {
    let mut chain = CredentialChain::new(repo.config()?);
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username, allowed| chain.next(url, username, allowed));

    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    Ok(options)
}

/// Fetch every configured remote with its configured refspecs.
///
/// Equivalent to `git fetch --all`, authenticating through the ssh agent or
/// the user's git credential helper.
pub fn fetch_all_remotes(repo: &Repository) -> Result<()> {
    let remotes = repo.remotes()?;
    for name in remotes.iter().flatten() {
        tracing::debug!(remote = %name, "Fetching remote");
        let mut remote = repo.find_remote(name)?;
        let mut options = fetch_options(repo)?;
        remote
            .fetch(&[] as &[&str], Some(&mut options), None)
            .map_err(|e| Error::FetchFailed {
                remote: name.to_string(),
                message: e.message().to_string(),
            })?;
    }
    Ok(())
}

/// Resolve the commit a ref should be pinned to.
///
/// Looks up the remote-tracking branch `<remote>/<git_ref>` first, then a
/// tag named `git_ref`, then (for hexadecimal refs) a commit id.
pub fn resolve_pin_target<'r>(
    repo: &'r Repository,
    remote: &str,
    git_ref: &str,
) -> Result<Commit<'r>> {
    let tracking = format!("{}/{}", remote, git_ref);
    if let Ok(branch) = repo.find_branch(&tracking, BranchType::Remote) {
        return Ok(branch.get().peel_to_commit()?);
    }

    if let Ok(tag) = repo.revparse_single(&format!("refs/tags/{}", git_ref)) {
        return Ok(tag.peel_to_commit()?);
    }

    let looks_like_sha = git_ref.len() >= 4 && git_ref.chars().all(|c| c.is_ascii_hexdigit());
    if looks_like_sha && let Ok(object) = repo.revparse_single(git_ref) {
        return Ok(object.peel_to_commit()?);
    }

    Err(Error::RefNotFound {
        git_ref: git_ref.to_string(),
        remote: remote.to_string(),
    })
}

/// Create `branch` at `commit`, moving it if it already exists.
///
/// Equivalent to `git branch -f <branch> <commit>`. Fails if `branch` is
/// the currently checked-out HEAD.
pub fn force_branch(repo: &Repository, branch: &str, commit: &Commit<'_>) -> Result<()> {
    repo.branch(branch, commit, true)?;
    Ok(())
}

/// Clone a single branch of `source` into `dest`.
///
/// Equivalent to `git clone -b <branch> --single-branch <source> <dest>`.
/// `dest` must be empty or absent.
pub fn clone_single_branch(source: &Path, dest: &Path, branch: &str) -> Result<Repository> {
    let url = source.to_str().ok_or_else(|| Error::InvalidPath {
        path: source.to_path_buf(),
    })?;

    let refspec_branch = branch.to_string();
    let mut builder = RepoBuilder::new();
    builder.branch(branch);
    builder.remote_create(move |repo, name, url| {
        let refspec = format!(
            "+refs/heads/{}:refs/remotes/{}/{}",
            refspec_branch, name, refspec_branch
        );
        repo.remote_with_fetch(name, url, &refspec)
    });

    builder.clone(url, dest).map_err(|e| Error::CloneFailed {
        branch: branch.to_string(),
        dest: dest.to_path_buf(),
        message: e.message().to_string(),
    })
}
