//! Tests for inventory loading and resolution

use pretty_assertions::assert_eq;
use rollout_core::inventory::{
    ALL, FixedVars, InventoryResolver, InventoryRoot, Topology, UNGROUPED, VariableSource,
    parse_ini,
};
use rollout_core::vars::{VarMap, into_mapping};
use rollout_test_utils::inventory::TestInventory;
use serde_json::{Value, json};

fn vars(value: Value) -> VarMap {
    into_mapping(value).expect("test value should be an object")
}

mod resolution_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_web_scenario() {
        let mut topology = Topology::new();
        topology.add_host("web", "h1", &VarMap::new()).unwrap();

        let resolved = InventoryResolver::new()
            .with_source(VariableSource::Fixed(
                FixedVars::new("plugin")
                    .with_group("web", vars(json!({"port": 80})))
                    .with_host("h1", VarMap::new()),
            ))
            .with_defaults(Some(vars(json!({"port": 8080, "env": "prod"}))))
            .resolve(&topology)
            .unwrap();

        assert_eq!(
            resolved.group_vars("web").unwrap(),
            &vars(json!({"port": 80, "env": "prod"}))
        );

        let membership: Vec<(&str, Vec<&str>)> = resolved
            .membership()
            .into_iter()
            .map(|(group, hosts)| (group, hosts.iter().map(String::as_str).collect()))
            .collect();
        assert_eq!(membership, vec![("all", vec!["h1"]), ("web", vec!["h1"])]);
    }

    #[test]
    fn test_every_host_is_in_all() {
        let topology = parse_ini("bastion\n[web]\nweb01\nweb02\n[db]\ndb01\n", "hosts").unwrap();
        let resolved = InventoryResolver::new().resolve(&topology).unwrap();

        assert_eq!(resolved.hosts_in(ALL), &["bastion", "web01", "web02", "db01"]);
        assert_eq!(resolved.hosts_in(UNGROUPED), &["bastion"]);
        for host in ["web01", "web02", "db01"] {
            assert!(!resolved.hosts_in(UNGROUPED).iter().any(|h| h == host));
        }
    }

    #[test]
    fn test_defaults_apply_once_per_resolution() {
        let mut topology = Topology::new();
        topology.add_host(UNGROUPED, "h1", &VarMap::new()).unwrap();
        let resolver = InventoryResolver::new()
            .with_defaults(Some(vars(json!({"ntp": ["a", "b"]}))));

        let first = resolver.resolve(&topology).unwrap();
        let second = resolver.resolve(&topology).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.group_vars(UNGROUPED).unwrap(),
            &vars(json!({"ntp": ["a", "b"]}))
        );
    }

    #[test]
    fn test_group_and_host_trees_do_not_alias() {
        let shared = vars(json!({"tls": {"enabled": true}}));
        let mut topology = Topology::new();
        topology.add_group_vars("web", &shared).unwrap();
        topology.add_host("web", "h1", &shared).unwrap();

        let resolved = InventoryResolver::new()
            .with_source(VariableSource::Fixed(
                FixedVars::new("plugin").with_host("h1", vars(json!({"tls": {"enabled": false}}))),
            ))
            .resolve(&topology)
            .unwrap();

        assert_eq!(resolved.group_vars("web").unwrap(), &shared);
        assert_eq!(
            resolved.host_vars("h1").unwrap(),
            &vars(json!({"tls": {"enabled": false}}))
        );
    }
}

mod hosts_file_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ini_sections() {
        let topology = parse_ini(
            r#"
# edge hosts
bastion ansible_host=192.0.2.10

[web]
web01 port=8080 motd="hello world"
web02

[web:vars]
env=production
replicas=3

[prod:children]
web
"#,
            "hosts",
        )
        .unwrap();

        assert_eq!(
            topology.host("web01").unwrap().vars(),
            &vars(json!({"port": 8080, "motd": "hello world"}))
        );
        assert_eq!(
            topology.host("bastion").unwrap().vars(),
            &vars(json!({"ansible_host": "192.0.2.10"}))
        );
        assert_eq!(
            topology.group("web").unwrap().vars(),
            &vars(json!({"env": "production", "replicas": 3}))
        );
        assert_eq!(topology.group("prod").unwrap().children(), &["web".to_string()]);
        assert_eq!(topology.direct_groups("bastion"), vec![UNGROUPED]);
    }

    #[test]
    fn test_ini_errors_name_file_and_line() {
        let err = parse_ini("[web]\nweb01\n[web:bogus]\n", "envs/prod/hosts").unwrap_err();
        assert!(err.to_string().contains("envs/prod/hosts:3"), "got: {err}");

        let err = parse_ini("[web:vars]\nnot-an-assignment\n", "hosts").unwrap_err();
        assert!(err.to_string().contains("hosts:2"), "got: {err}");
    }

    #[test]
    fn test_ini_rejects_cycles_and_reserved_names() {
        assert!(parse_ini("[a:children]\nb\n[b:children]\na\n", "hosts").is_err());
        assert!(parse_ini("[_meta]\nh1\n", "hosts").is_err());
    }

    #[test]
    fn test_yaml_hosts_file() {
        let inventory = TestInventory::new();
        inventory.write(
            "hosts.yml",
            r#"
prod:
  vars:
    env: production
  children:
    web:
      hosts:
        web01: {port: 8080}
        web02:
"#,
        );

        let root = InventoryRoot::new(inventory.root()).unwrap();
        let loaded = root.load(None).unwrap();
        let resolved = loaded.resolve().unwrap();

        assert_eq!(resolved.hosts_in("prod"), &["web01", "web02"]);
        assert_eq!(resolved.host_vars("web01").unwrap(), &vars(json!({"port": 8080})));
        assert_eq!(
            resolved.group_vars("prod").unwrap(),
            &vars(json!({"env": "production"}))
        );
    }
}

mod root_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_inventory_document() {
        let inventory = TestInventory::new();
        inventory
            .hosts("[web]\nh1\n")
            .group_vars("web", "port: 80\n")
            .group_vars("all", "dns: [10.0.0.1]\n")
            .host_vars("h1", "role: primary\n")
            .write("defaults.yml", "port: 8080\nenv: prod\n")
            .write("inventory.yml", "defaults_file: defaults.yml\n");

        let root = InventoryRoot::new(inventory.root()).unwrap();
        let resolved = root.load(None).unwrap().resolve().unwrap();

        assert_eq!(
            serde_json::to_value(&resolved).unwrap(),
            json!({
                "all": {
                    "hosts": ["h1"],
                    "vars": {"port": 8080, "env": "prod", "dns": ["10.0.0.1"]}
                },
                "web": {
                    "hosts": ["h1"],
                    "vars": {"port": 80, "env": "prod"}
                },
                "_meta": {"hostvars": {"h1": {"role": "primary"}}}
            })
        );
        assert_eq!(
            resolved.effective_host_vars("h1").unwrap(),
            vars(json!({"port": 80, "env": "prod", "dns": ["10.0.0.1"], "role": "primary"}))
        );
    }

    #[test]
    fn test_defaults_override_file_wins() {
        let inventory = TestInventory::new();
        inventory
            .hosts("h1\n")
            .write("defaults.yml", "env: prod\n")
            .write("staging.yml", "env: staging\n")
            .write("inventory.yml", "defaults_file: defaults.yml\n");

        let root = InventoryRoot::new(inventory.root()).unwrap();
        let resolved = root.load(Some("staging.yml")).unwrap().resolve().unwrap();
        assert_eq!(resolved.group_vars(ALL).unwrap(), &vars(json!({"env": "staging"})));
    }

    #[test]
    fn test_missing_defaults_file_is_not_an_error() {
        let inventory = TestInventory::new();
        inventory
            .hosts("h1\n")
            .write("inventory.yml", "defaults_file: nowhere.yml\n");

        let root = InventoryRoot::new(inventory.root()).unwrap();
        let resolved = root.load(None).unwrap().resolve().unwrap();
        assert_eq!(resolved.group_vars(ALL).unwrap(), &VarMap::new());
    }

    #[test]
    fn test_broken_group_vars_abort_resolution() {
        let inventory = TestInventory::new();
        inventory.hosts("[web]\nh1\n").group_vars("web", "- not\n- a mapping\n");

        let root = InventoryRoot::new(inventory.root()).unwrap();
        let err = root.load(None).unwrap().resolve().unwrap_err();
        assert!(
            matches!(err, rollout_core::Error::VariableSource { ref name, .. } if name == "web"),
            "got: {err}"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_plugin_overrides_files() {
        use std::os::unix::fs::PermissionsExt;

        let inventory = TestInventory::new();
        inventory
            .hosts("[web]\nh1\n")
            .group_vars("web", "port: 80\nowner: files\n")
            .write(
                "bin/vars.sh",
                "#!/bin/sh\nif [ \"$1\" = \"--group\" ] && [ \"$2\" = \"web\" ]; then echo '{\"port\": 443}'; fi\n",
            )
            .write(
                "inventory.yml",
                "vars_plugins:\n  - name: ports\n    command: bin/vars.sh\n",
            );
        let script = inventory.root().join("bin/vars.sh");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let root = InventoryRoot::new(inventory.root()).unwrap();
        let resolved = root.load(None).unwrap().resolve().unwrap();
        assert_eq!(
            resolved.group_vars("web").unwrap(),
            &vars(json!({"port": 443, "owner": "files"}))
        );
    }
}
