//! Snapshot cleanup on every exit path

use rollout_core::Error;
use rollout_core::playbook::{PlaybookEntry, PlaybookResolver, ResolvedPlaybooks};
use rollout_fs::NormalizedPath;
use rollout_git::GitRepository;
use rollout_test_utils::git::{upstream_repo, working_copy};
use std::fs;
use std::panic;
use std::path::PathBuf;
use tempfile::TempDir;

struct Workspace {
    _temp: TempDir,
    playbooks: PathBuf,
    snapshots: PathBuf,
}

impl Workspace {
    fn new(repositories: &[&str]) -> Self {
        let temp = TempDir::new().unwrap();
        let playbooks = temp.path().join("playbooks");
        let snapshots = temp.path().join("snapshots");
        fs::create_dir_all(&playbooks).unwrap();
        fs::create_dir_all(&snapshots).unwrap();

        for name in repositories {
            let upstream = upstream_repo(
                &temp.path().join("upstream").join(name),
                &[("site.yml", "- hosts: all\n")],
            );
            working_copy(upstream.workdir().unwrap(), &playbooks.join(name));
        }

        Self {
            _temp: temp,
            playbooks,
            snapshots,
        }
    }

    fn resolver(&self) -> PlaybookResolver<GitRepository> {
        PlaybookResolver::new(GitRepository::new(), NormalizedPath::new(&self.playbooks))
            .with_snapshot_root(NormalizedPath::new(&self.snapshots))
    }

    fn residual(&self) -> usize {
        fs::read_dir(&self.snapshots).unwrap().count()
    }
}

#[test]
fn test_panic_while_holding_snapshots_removes_them() {
    let workspace = Workspace::new(&["site", "tools"]);
    let entries = [
        PlaybookEntry::new("site", "site.yml", "main"),
        PlaybookEntry::new("tools", "site.yml", "main"),
    ];

    let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        let batch: ResolvedPlaybooks = workspace.resolver().resolve_all(&entries).unwrap();
        assert_eq!(batch.len(), 2);
        panic!("deployment aborted");
    }));

    assert!(result.is_err());
    assert_eq!(workspace.residual(), 0);
}

#[test]
fn test_early_return_drops_snapshots() {
    let workspace = Workspace::new(&["site"]);

    fn first_commit(resolver: &PlaybookResolver<GitRepository>) -> Result<String, Error> {
        let batch = resolver.resolve_all(&[PlaybookEntry::new("site", "site.yml", "main")])?;
        let playbook = batch.iter().next().ok_or_else(|| Error::config("empty batch"))?;
        Ok(playbook.commit().unwrap_or_default().to_string())
    }

    let commit = first_commit(&workspace.resolver()).unwrap();
    assert_eq!(commit.len(), 40);
    assert_eq!(workspace.residual(), 0);
}

#[test]
fn test_failure_midway_releases_earlier_entries() {
    let workspace = Workspace::new(&["site", "tools"]);

    let err = workspace
        .resolver()
        .resolve_all(&[
            PlaybookEntry::new("site", "site.yml", "main"),
            PlaybookEntry::new("tools", "site.yml", "main"),
            PlaybookEntry::new("tools", "site.yml", "missing-branch"),
            PlaybookEntry::new("site", "site.yml", "main"),
        ])
        .unwrap_err();

    assert!(matches!(err, Error::VersionControl { operation: "pin", .. }), "got: {err}");
    assert_eq!(workspace.residual(), 0);
}

#[test]
fn test_dirty_entries_never_touch_snapshot_root() {
    let workspace = Workspace::new(&["site"]);

    let mut batch = workspace
        .resolver()
        .resolve_all(&[PlaybookEntry::new("site", "site.yml", "dirty")])
        .unwrap();
    assert_eq!(workspace.residual(), 0);

    batch.release().unwrap();
    assert!(workspace.playbooks.join("site/site.yml").is_file());
}
