//! Real git repositories built with `git2`.
//!
//! Every fixture uses `main` as its initial branch and a fixed signature, so
//! tests do not depend on the machine's git configuration.

use std::fs;
use std::path::Path;

use git2::{BranchType, Commit, Oid, Repository, RepositoryInitOptions, Signature};

/// Initialise a repository at `path` on branch `main` and commit `files`
/// (relative path, content) as its first commit.
///
/// # Panics
/// Panics if any filesystem or git operation fails.
pub fn upstream_repo(path: &Path, files: &[(&str, &str)]) -> Repository {
    fs::create_dir_all(path)
        .unwrap_or_else(|e| panic!("upstream_repo: failed to create {}: {e}", path.display()));
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = Repository::init_opts(path, &opts)
        .unwrap_or_else(|e| panic!("upstream_repo: failed to init {}: {e}", path.display()));
    commit_files(&repo, files, "Initial commit");
    repo
}

/// Write `files` into the working directory and commit them on HEAD.
///
/// # Panics
/// Panics if any filesystem or git operation fails.
pub fn commit_files(repo: &Repository, files: &[(&str, &str)], message: &str) -> Oid {
    let workdir = repo
        .workdir()
        .expect("commit_files: repository has no working directory");
    for (name, content) in files {
        let file_path = workdir.join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&file_path, content)
            .unwrap_or_else(|e| panic!("commit_files: failed to write {name}: {e}"));
    }

    let mut index = repo.index().unwrap();
    for (name, _) in files {
        index.add_path(Path::new(name)).unwrap();
    }
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let sig = Signature::now("Test User", "test@test.com").unwrap();
    let parents: Vec<Commit<'_>> = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .unwrap_or_else(|e| panic!("commit_files: commit failed: {e}"))
}

/// Create a local branch named `name` at the current HEAD.
///
/// # Panics
/// Panics if HEAD cannot be resolved or the branch cannot be created.
pub fn create_branch(repo: &Repository, name: &str) {
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    repo.branch(name, &head, false)
        .unwrap_or_else(|e| panic!("create_branch: failed to create {name}: {e}"));
}

/// Clone `upstream` into `dest`, giving the clone an `origin` remote.
///
/// # Panics
/// Panics if the clone fails.
pub fn working_copy(upstream: &Path, dest: &Path) -> Repository {
    let url = upstream.to_str().expect("working_copy: upstream path is not UTF-8");
    Repository::clone(url, dest)
        .unwrap_or_else(|e| panic!("working_copy: failed to clone {url}: {e}"))
}

/// Whether `repo` has a local branch called `name`.
pub fn has_local_branch(repo: &Repository, name: &str) -> bool {
    repo.find_branch(name, BranchType::Local).is_ok()
}
