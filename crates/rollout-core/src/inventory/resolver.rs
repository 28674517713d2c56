//! Inventory variable resolution
//!
//! [`InventoryResolver`] layers statically declared variables, variable
//! sources and the defaults document into one frozen mapping per group and
//! per host, and records which hosts belong to which groups.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::json;

use super::source::{VariableSource, VarsProvider};
use super::topology::{META_KEY, Topology, UNGROUPED};
use crate::Result;
use crate::vars::{VarMap, deep_merge, merge_layers};

/// Builds a [`ResolvedInventory`] from a [`Topology`].
///
/// Sources are consulted in the order they were added; a later source wins
/// over an earlier one on conflicting leaf keys.
#[derive(Debug, Clone, Default)]
pub struct InventoryResolver {
    sources: Vec<VariableSource>,
    defaults: Option<VarMap>,
}

impl InventoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source with higher precedence than every source so far.
    pub fn with_source(mut self, source: VariableSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Set the lowest-precedence layer applied to every group.
    pub fn with_defaults(mut self, defaults: Option<VarMap>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn sources(&self) -> &[VariableSource] {
        &self.sources
    }

    pub fn defaults(&self) -> Option<&VarMap> {
        self.defaults.as_ref()
    }

    /// Resolve every group and host of `topology`.
    ///
    /// Any source failure aborts the whole resolution; no partial inventory
    /// is returned.
    pub fn resolve(&self, topology: &Topology) -> Result<ResolvedInventory> {
        let mut group_vars = IndexMap::new();
        for group in topology.groups() {
            let mut vars = group.vars().clone();
            for source in &self.sources {
                vars = deep_merge(&vars, &source.fetch_group_vars(group.name())?);
            }
            if let Some(defaults) = &self.defaults {
                vars = deep_merge(defaults, &vars);
            }
            tracing::trace!(group = group.name(), keys = vars.len(), "Resolved group vars");
            group_vars.insert(group.name().to_string(), vars);
        }

        let mut host_vars = IndexMap::new();
        for host in topology.hosts() {
            let mut vars = host.vars().clone();
            for source in &self.sources {
                vars = deep_merge(&vars, &source.fetch_host_vars(host.name())?);
            }
            tracing::trace!(host = host.name(), keys = vars.len(), "Resolved host vars");
            host_vars.insert(host.name().to_string(), vars);
        }

        let mut membership: IndexMap<String, Vec<String>> = topology
            .groups()
            .map(|group| (group.name().to_string(), Vec::new()))
            .collect();
        let mut host_groups = IndexMap::new();
        for host in topology.hosts() {
            let mut groups = topology.host_groups(host.name());
            for group in &groups {
                if let Some(hosts) = membership.get_mut(group)
                    && !hosts.iter().any(|h| h == host.name())
                {
                    hosts.push(host.name().to_string());
                }
            }
            groups.sort_by_cached_key(|group| (topology.depth(group), group.clone()));
            host_groups.insert(host.name().to_string(), groups);
        }

        tracing::debug!(
            groups = group_vars.len(),
            hosts = host_vars.len(),
            sources = self.sources.len(),
            defaults = self.defaults.is_some(),
            "Resolved inventory"
        );

        Ok(ResolvedInventory {
            group_vars,
            host_vars,
            membership,
            host_groups,
        })
    }
}

/// The frozen result of [`InventoryResolver::resolve`].
///
/// Serializes to the dynamic inventory document: one
/// `{"hosts": [...], "vars": {...}}` entry per group in topology order
/// (`ungrouped` only when it has hosts), followed by
/// `"_meta": {"hostvars": {...}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInventory {
    group_vars: IndexMap<String, VarMap>,
    host_vars: IndexMap<String, VarMap>,
    membership: IndexMap<String, Vec<String>>,
    host_groups: IndexMap<String, Vec<String>>,
}

impl ResolvedInventory {
    pub fn group_vars(&self, group: &str) -> Option<&VarMap> {
        self.group_vars.get(group)
    }

    pub fn host_vars(&self, host: &str) -> Option<&VarMap> {
        self.host_vars.get(host)
    }

    /// Group names in topology order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.group_vars.keys().map(String::as_str)
    }

    /// Host names in topology order.
    pub fn host_names(&self) -> impl Iterator<Item = &str> {
        self.host_vars.keys().map(String::as_str)
    }

    /// Hosts belonging to `group` directly or through nesting, in the order
    /// they were first seen.
    pub fn hosts_in(&self, group: &str) -> &[String] {
        self.membership.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Group to host table, limited to groups that have at least one host.
    pub fn membership(&self) -> IndexMap<&str, &[String]> {
        self.membership
            .iter()
            .filter(|(_, hosts)| !hosts.is_empty())
            .map(|(group, hosts)| (group.as_str(), hosts.as_slice()))
            .collect()
    }

    /// Every group `host` belongs to, shallowest first (`all` leads).
    pub fn groups_of(&self, host: &str) -> &[String] {
        self.host_groups.get(host).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Variables a host effectively sees: its groups' mappings from `all`
    /// downwards, then the host's own mapping on top.
    ///
    /// Returns `None` for unknown hosts.
    pub fn effective_host_vars(&self, host: &str) -> Option<VarMap> {
        let own = self.host_vars.get(host)?;
        let groups = self
            .groups_of(host)
            .iter()
            .filter_map(|group| self.group_vars.get(group));
        Some(merge_layers(groups.chain(std::iter::once(own))))
    }

    fn is_reported(&self, group: &str) -> bool {
        group != UNGROUPED || !self.hosts_in(UNGROUPED).is_empty()
    }
}

impl Serialize for ResolvedInventory {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let reported: Vec<&String> = self
            .group_vars
            .keys()
            .filter(|group| self.is_reported(group))
            .collect();

        let mut map = serializer.serialize_map(Some(reported.len() + 1))?;
        for group in reported {
            let entry = json!({
                "hosts": self.hosts_in(group),
                "vars": self.group_vars.get(group.as_str()),
            });
            map.serialize_entry(group, &entry)?;
        }
        map.serialize_entry(META_KEY, &json!({ "hostvars": &self.host_vars }))?;
        map.end()
    }
}
