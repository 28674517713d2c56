//! Host and group membership graph
//!
//! A [`Topology`] always contains the built-in groups `all` and
//! `ungrouped`. Every other group is attached under `all` when created and
//! may additionally be nested under any number of parent groups. Hosts keep
//! their statically declared variables; group membership is stored on the
//! groups.

use indexmap::IndexMap;
use std::collections::HashSet;

use crate::vars::{VarMap, deep_merge};
use crate::{Error, Result};

/// Ancestor of every group.
pub const ALL: &str = "all";

/// Holds hosts that belong to no explicit group.
pub const UNGROUPED: &str = "ungrouped";

/// Reserved top-level key of the inventory document.
pub const META_KEY: &str = "_meta";

/// A named collection of hosts with statically declared variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    name: String,
    children: Vec<String>,
    hosts: Vec<String>,
    vars: VarMap,
}

impl Group {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: Vec::new(),
            hosts: Vec::new(),
            vars: VarMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Child group names, in declaration order.
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Hosts declared directly in this group, in declaration order.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Statically declared variables.
    pub fn vars(&self) -> &VarMap {
        &self.vars
    }
}

/// A target machine and its statically declared variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Host {
    name: String,
    vars: VarMap,
}

impl Host {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vars(&self) -> &VarMap {
        &self.vars
    }
}

/// Insertion-ordered host/group graph.
#[derive(Debug, Clone)]
pub struct Topology {
    groups: IndexMap<String, Group>,
    hosts: IndexMap<String, Host>,
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}

impl Topology {
    /// Create a topology holding only `all` and its child `ungrouped`.
    pub fn new() -> Self {
        let mut all = Group::new(ALL);
        all.children.push(UNGROUPED.to_string());

        let mut groups = IndexMap::new();
        groups.insert(ALL.to_string(), all);
        groups.insert(UNGROUPED.to_string(), Group::new(UNGROUPED));

        Self {
            groups,
            hosts: IndexMap::new(),
        }
    }

    /// Ensure `name` exists. New groups become children of `all`.
    pub fn add_group(&mut self, name: &str) -> Result<()> {
        validate_name("group", name)?;
        if name == META_KEY {
            return Err(Error::config(format!(
                "Group name '{META_KEY}' is reserved for inventory metadata"
            )));
        }
        if self.groups.contains_key(name) {
            return Ok(());
        }

        self.groups.insert(name.to_string(), Group::new(name));
        if let Some(all) = self.groups.get_mut(ALL) {
            push_unique(&mut all.children, name);
        }
        Ok(())
    }

    /// Nest `child` under `parent`, creating either group as needed.
    ///
    /// Rejects links that would make a group its own ancestor.
    pub fn add_child_group(&mut self, parent: &str, child: &str) -> Result<()> {
        if child == ALL {
            return Err(Error::config("Group 'all' cannot be a child group"));
        }
        self.add_group(parent)?;
        self.add_group(child)?;

        if parent == child || self.is_descendant(child, parent) {
            return Err(Error::config(format!(
                "Adding '{child}' under '{parent}' would create a group cycle"
            )));
        }

        if let Some(parent) = self.groups.get_mut(parent) {
            push_unique(&mut parent.children, child);
        }
        Ok(())
    }

    /// Register `host` in `group` and deep merge `vars` into its variables.
    ///
    /// Adding a host to `all` or `ungrouped` only registers it; such hosts
    /// are reported under `ungrouped` until they join an explicit group. A
    /// host may belong to any number of groups.
    pub fn add_host(&mut self, group: &str, host: &str, vars: &VarMap) -> Result<()> {
        validate_name("host", host)?;
        self.add_group(group)?;

        let entry = self.hosts.entry(host.to_string()).or_insert_with(|| Host {
            name: host.to_string(),
            vars: VarMap::new(),
        });
        if !vars.is_empty() {
            entry.vars = deep_merge(&entry.vars, vars);
        }

        if group != ALL
            && group != UNGROUPED
            && let Some(group) = self.groups.get_mut(group)
        {
            push_unique(&mut group.hosts, host);
        }
        Ok(())
    }

    /// Deep merge `vars` into the statically declared variables of `group`.
    pub fn add_group_vars(&mut self, group: &str, vars: &VarMap) -> Result<()> {
        self.add_group(group)?;
        if let Some(target) = self.groups.get_mut(group) {
            target.vars = deep_merge(&target.vars, vars);
        }
        Ok(())
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.get(name)
    }

    /// Groups that list `group` as a child, in topology order.
    pub fn parents(&self, group: &str) -> Vec<&str> {
        self.groups
            .values()
            .filter(|g| g.children.iter().any(|c| c == group))
            .map(|g| g.name.as_str())
            .collect()
    }

    /// Groups `host` is declared in, or `ungrouped` if there are none.
    pub fn direct_groups(&self, host: &str) -> Vec<&str> {
        let direct: Vec<&str> = self
            .groups
            .values()
            .filter(|g| g.hosts.iter().any(|h| h == host))
            .map(|g| g.name.as_str())
            .collect();

        if direct.is_empty() { vec![UNGROUPED] } else { direct }
    }

    /// Every group `host` belongs to, directly or through nesting.
    ///
    /// Direct groups come first, followed by their ancestors in
    /// breadth-first order. `all` is always included.
    pub fn host_groups(&self, host: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut ordered: Vec<&str> = Vec::new();
        let mut queue: Vec<&str> = self.direct_groups(host);

        while !queue.is_empty() {
            let mut next = Vec::new();
            for group in queue {
                if seen.insert(group) {
                    ordered.push(group);
                    next.extend(self.parents(group));
                }
            }
            queue = next;
        }

        if !seen.contains(ALL) {
            ordered.push(ALL);
        }
        ordered.into_iter().map(str::to_string).collect()
    }

    /// Length of the longest parent chain from `all` down to `group`.
    pub fn depth(&self, group: &str) -> usize {
        if group == ALL {
            return 0;
        }
        self.parents(group)
            .into_iter()
            .map(|parent| self.depth(parent) + 1)
            .max()
            .unwrap_or(1)
    }

    fn is_descendant(&self, start: &str, target: &str) -> bool {
        let mut stack = vec![start];
        let mut visited = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(group) = self.groups.get(current) {
                stack.extend(group.children.iter().map(String::as_str));
            }
        }
        false
    }
}

/// Whether `name` can name a group or host.
///
/// Names double as file names under `group_vars/` and `host_vars/`, so
/// path separators and `.`/`..` are rejected.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !matches!(name, "." | "..")
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c == '\\')
}

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if !is_valid_name(name) {
        return Err(Error::config(format!("Invalid {kind} name: '{name}'")));
    }
    Ok(())
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|existing| existing == name) {
        list.push(name.to_string());
    }
}
