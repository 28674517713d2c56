//! Variable sources
//!
//! A source supplies the raw variables for one group or host name. The set
//! of sources is closed ([`VariableSource`]); every variant implements the
//! same [`VarsProvider`] capability. Source order is precedence order: a
//! later source overrides an earlier one at leaf level.

use indexmap::IndexMap;
use rollout_fs::{ConfigStore, Format, NormalizedPath, io};
use serde_json::Value;
use std::path::PathBuf;
use std::process::Command;

use super::topology::is_valid_name;
use crate::vars::{VarMap, deep_merge, into_mapping, kind_of};
use crate::{Error, Result};

/// Whether variables are requested for a group or a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Group,
    Host,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Host => "host",
        }
    }

    fn vars_dir(&self) -> &'static str {
        match self {
            Self::Group => "group_vars",
            Self::Host => "host_vars",
        }
    }

    fn flag(&self) -> &'static str {
        match self {
            Self::Group => "--group",
            Self::Host => "--host",
        }
    }
}

/// Capability shared by every variable source.
pub trait VarsProvider {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Variables for `group`. Unknown groups yield an empty mapping.
    fn fetch_group_vars(&self, group: &str) -> Result<VarMap>;

    /// Variables for `host`. Unknown hosts yield an empty mapping.
    fn fetch_host_vars(&self, host: &str) -> Result<VarMap>;
}

/// The closed set of variable sources an inventory can be built from.
#[derive(Debug, Clone)]
pub enum VariableSource {
    /// `group_vars/` and `host_vars/` files under an inventory root
    Files(FileVars),
    /// An executable plugin printing a JSON object
    Command(CommandVars),
    /// In-memory mappings supplied by the caller
    Fixed(FixedVars),
}

impl VarsProvider for VariableSource {
    fn name(&self) -> &str {
        match self {
            Self::Files(source) => source.name(),
            Self::Command(source) => source.name(),
            Self::Fixed(source) => source.name(),
        }
    }

    fn fetch_group_vars(&self, group: &str) -> Result<VarMap> {
        match self {
            Self::Files(source) => source.fetch_group_vars(group),
            Self::Command(source) => source.fetch_group_vars(group),
            Self::Fixed(source) => source.fetch_group_vars(group),
        }
    }

    fn fetch_host_vars(&self, host: &str) -> Result<VarMap> {
        match self {
            Self::Files(source) => source.fetch_host_vars(host),
            Self::Command(source) => source.fetch_host_vars(host),
            Self::Fixed(source) => source.fetch_host_vars(host),
        }
    }
}

fn source_error(source: &str, scope: Scope, name: &str, message: impl Into<String>) -> Error {
    Error::VariableSource {
        source_name: source.to_string(),
        scope: scope.as_str(),
        name: name.to_string(),
        message: message.into(),
    }
}

/// Reads `group_vars/<name>` and `host_vars/<name>` under an inventory root.
///
/// For each name the first existing of `<name>`, `<name>.yml`,
/// `<name>.yaml` and `<name>.json` is loaded. If `<name>` is a directory,
/// its files are merged in lexical order instead. Files without a known
/// extension are read as YAML.
#[derive(Debug, Clone)]
pub struct FileVars {
    root: NormalizedPath,
}

impl FileVars {
    const NAME: &'static str = "files";
    const CANDIDATE_SUFFIXES: [&'static str; 4] = ["", ".yml", ".yaml", ".json"];

    pub fn new(root: NormalizedPath) -> Self {
        Self { root }
    }

    fn load(&self, scope: Scope, name: &str) -> Result<VarMap> {
        if !is_valid_name(name) {
            return Err(source_error(
                Self::NAME,
                scope,
                name,
                format!("'{name}' cannot name a file under {}", scope.vars_dir()),
            ));
        }
        let base = self.root.join(scope.vars_dir()).join(name);

        if base.is_dir() {
            let files = io::sorted_files(&base)
                .map_err(|e| source_error(Self::NAME, scope, name, e.to_string()))?;
            let mut merged = VarMap::new();
            for file in files {
                merged = deep_merge(&merged, &self.load_file(&file, scope, name)?);
            }
            return Ok(merged);
        }

        let found = Self::CANDIDATE_SUFFIXES
            .iter()
            .map(|suffix| self.root.join(&format!("{}/{}{}", scope.vars_dir(), name, suffix)))
            .find(NormalizedPath::is_file);

        match found {
            Some(path) => self.load_file(&path, scope, name),
            None => Ok(VarMap::new()),
        }
    }

    fn load_file(&self, path: &NormalizedPath, scope: Scope, name: &str) -> Result<VarMap> {
        let format = path
            .extension()
            .and_then(Format::from_extension)
            .unwrap_or(Format::Yaml);
        tracing::debug!(%path, scope = scope.as_str(), name, "Loading variable file");

        let document: Value = ConfigStore::new()
            .load_as(path, format)
            .map_err(|e| source_error(Self::NAME, scope, name, e.to_string()))?;

        into_mapping(document).map_err(|other| {
            source_error(
                Self::NAME,
                scope,
                name,
                format!("{path} must contain a mapping, found {}", kind_of(&other)),
            )
        })
    }
}

impl VarsProvider for FileVars {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fetch_group_vars(&self, group: &str) -> Result<VarMap> {
        self.load(Scope::Group, group)
    }

    fn fetch_host_vars(&self, host: &str) -> Result<VarMap> {
        self.load(Scope::Host, host)
    }
}

/// Runs an executable plugin as `<command> [args...] --group <name>` or
/// `--host <name>`.
///
/// The plugin must exit successfully and print a JSON object on stdout;
/// empty output counts as an empty mapping.
#[derive(Debug, Clone)]
pub struct CommandVars {
    name: String,
    command: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandVars {
    pub fn new(name: impl Into<String>, command: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Arguments placed before the `--group`/`--host` flag.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Directory the plugin runs in.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn run(&self, scope: Scope, target: &str) -> Result<VarMap> {
        let mut command = Command::new(&self.command);
        command.args(&self.args).arg(scope.flag()).arg(target);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        tracing::debug!(plugin = %self.name, command = ?self.command, scope = scope.as_str(), target, "Running vars plugin");
        let output = command.output().map_err(|e| {
            source_error(
                &self.name,
                scope,
                target,
                format!("failed to run {}: {e}", self.command.display()),
            )
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(source_error(
                &self.name,
                scope,
                target,
                format!("plugin exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        if output.stdout.trim_ascii().is_empty() {
            return Ok(VarMap::new());
        }

        let document: Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            source_error(&self.name, scope, target, format!("invalid JSON output: {e}"))
        })?;
        into_mapping(document).map_err(|other| {
            source_error(
                &self.name,
                scope,
                target,
                format!("plugin output must be a JSON object, found {}", kind_of(&other)),
            )
        })
    }
}

impl VarsProvider for CommandVars {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_group_vars(&self, group: &str) -> Result<VarMap> {
        self.run(Scope::Group, group)
    }

    fn fetch_host_vars(&self, host: &str) -> Result<VarMap> {
        self.run(Scope::Host, host)
    }
}

/// Fixed per-group and per-host mappings held in memory.
#[derive(Debug, Clone, Default)]
pub struct FixedVars {
    name: String,
    groups: IndexMap<String, VarMap>,
    hosts: IndexMap<String, VarMap>,
}

impl FixedVars {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_group(mut self, group: impl Into<String>, vars: VarMap) -> Self {
        self.groups.insert(group.into(), vars);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>, vars: VarMap) -> Self {
        self.hosts.insert(host.into(), vars);
        self
    }
}

impl VarsProvider for FixedVars {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_group_vars(&self, group: &str) -> Result<VarMap> {
        Ok(self.groups.get(group).cloned().unwrap_or_default())
    }

    fn fetch_host_vars(&self, host: &str) -> Result<VarMap> {
        Ok(self.hosts.get(host).cloned().unwrap_or_default())
    }
}
