//! End-to-end test of one deployment environment
//!
//! An environment directory holds both the inventory and the playbook
//! manifest. The test resolves the inventory through `ROLLOUT_ENV`-style
//! root loading, then pins the manifest's playbooks from real git working
//! copies.

use pretty_assertions::assert_eq;
use rollout_core::inventory::InventoryRoot;
use rollout_core::playbook::{PlaybookManifest, PlaybookResolver};
use rollout_fs::NormalizedPath;
use rollout_git::GitRepository;
use rollout_test_utils::git::{commit_files, create_branch, upstream_repo, working_copy};
use rollout_test_utils::inventory::TestInventory;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

/// Environment `prod` with nested groups, vars directories and defaults.
fn prod_environment(playbook_path: &std::path::Path) -> TestInventory {
    let env = TestInventory::new();
    env.hosts(
        r#"
bastion

[web]
web01 port=8443
web02

[db]
db01

[prod:children]
web
db

[prod:vars]
datacenter=east
"#,
    )
    .group_vars("all", "ntp: [ntp1, ntp2]\nlogging: {level: info, remote: false}\n")
    .write("group_vars/web/10-base.yml", "port: 80\nlogging: {level: debug}\n")
    .write("group_vars/web/20-tls.yml", "tls: true\n")
    .host_vars("db01", "primary: true\n")
    .write("defaults.yml", "port: 8080\nenv: prod\nlogging: {remote: true}\n")
    .write("inventory.yml", "defaults_file: defaults.yml\n")
    .write(
        "manifest.yml",
        &format!(
            "ansible_version: \"2.9\"\nplaybook_path: {}\nplaybooks:\n  - repository: site\n    file: site.yml\n    git_ref: release\n  - repository: site\n    file: site.yml\n    git_ref: dirty\n",
            playbook_path.display()
        ),
    );
    env
}

#[test]
fn test_environment_inventory() {
    let playbooks = TempDir::new().unwrap();
    let env = prod_environment(playbooks.path());

    let root = InventoryRoot::from_value(Some(env.root().as_os_str().to_owned())).unwrap();
    let resolved = root.load(None).unwrap().resolve().unwrap();

    assert_eq!(
        resolved.group_vars("all").unwrap(),
        json!({
            "port": 8080,
            "env": "prod",
            "logging": {"remote": false, "level": "info"},
            "ntp": ["ntp1", "ntp2"]
        })
        .as_object()
        .unwrap()
    );
    assert_eq!(
        resolved.group_vars("web").unwrap(),
        json!({"port": 80, "env": "prod", "logging": {"remote": true, "level": "debug"}, "tls": true})
            .as_object()
            .unwrap()
    );
    assert_eq!(
        resolved.group_vars("prod").unwrap(),
        json!({"port": 8080, "env": "prod", "logging": {"remote": true}, "datacenter": "east"})
            .as_object()
            .unwrap()
    );

    assert_eq!(resolved.hosts_in("prod"), &["web01", "web02", "db01"]);
    assert_eq!(resolved.hosts_in("ungrouped"), &["bastion"]);
    assert_eq!(resolved.hosts_in("all").len(), 4);

    assert_eq!(
        resolved.host_vars("web01").unwrap(),
        json!({"port": 8443}).as_object().unwrap()
    );
    let effective = resolved.effective_host_vars("web01").unwrap();
    assert_eq!(effective["port"], json!(8443));
    assert_eq!(effective["datacenter"], json!("east"));
    assert_eq!(effective["logging"], json!({"remote": true, "level": "debug"}));
    assert_eq!(effective["ntp"], json!(["ntp1", "ntp2"]));

    let document = serde_json::to_value(&resolved).unwrap();
    let keys: Vec<&str> = document.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["all", "ungrouped", "web", "db", "prod", "_meta"]);
}

#[test]
fn test_environment_playbooks() {
    let workspace = TempDir::new().unwrap();
    let upstream = upstream_repo(&workspace.path().join("upstream/site"), &[("site.yml", "# v1\n")]);
    create_branch(&upstream, "release");
    commit_files(&upstream, &[("site.yml", "# v2\n")], "Unreleased work");

    let playbook_path = workspace.path().join("playbooks");
    let snapshots = workspace.path().join("snapshots");
    fs::create_dir_all(&playbook_path).unwrap();
    fs::create_dir_all(&snapshots).unwrap();
    working_copy(upstream.workdir().unwrap(), &playbook_path.join("site"));
    fs::write(playbook_path.join("site/site.yml"), "# local\n").unwrap();

    let env = prod_environment(&playbook_path);
    let manifest = PlaybookManifest::load(&NormalizedPath::new(env.root().join("manifest.yml"))).unwrap();
    assert_eq!(manifest.ansible_version.as_deref(), Some("2.9"));

    let mut batch = PlaybookResolver::from_manifest(GitRepository::new(), &manifest)
        .with_snapshot_root(NormalizedPath::new(&snapshots))
        .resolve_all(&manifest.playbooks)
        .unwrap();

    let contents: Vec<String> = batch
        .paths()
        .iter()
        .map(|path| fs::read_to_string(path.to_native()).unwrap())
        .collect();
    assert_eq!(contents, vec!["# v1\n", "# local\n"]);
    assert_eq!(fs::read_dir(&snapshots).unwrap().count(), 1);

    batch.release().unwrap();
    assert_eq!(fs::read_dir(&snapshots).unwrap().count(), 0);
    assert!(playbook_path.join("site/site.yml").is_file());
}
