//! Inventory root discovery and `inventory.yml` configuration

use rollout_fs::{ConfigStore, Format, NormalizedPath};
use serde::Deserialize;
use serde_json::Value;
use std::ffi::OsString;
use std::path::Path;

use super::hosts_file::load_hosts_file;
use super::resolver::{InventoryResolver, ResolvedInventory};
use super::source::{CommandVars, FileVars, VariableSource};
use super::topology::Topology;
use crate::vars::{VarMap, into_mapping, kind_of};
use crate::{Error, Result};

/// Environment variable naming the inventory root directory.
pub const ENV_VAR: &str = "ROLLOUT_ENV";

/// Environment variable overriding the configured defaults file.
pub const DEFAULTS_FILE_VAR: &str = "ROLLOUT_VAR_DEFAULTS_FILE";

/// Optional configuration file inside the inventory root.
pub const CONFIG_FILE: &str = "inventory.yml";

const HOSTS_CANDIDATES: [&str; 4] = ["hosts", "hosts.yml", "hosts.yaml", "hosts.json"];

/// Contents of `<root>/inventory.yml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventoryConfig {
    /// Hosts file relative to the root
    #[serde(default)]
    pub hosts_file: Option<String>,

    /// Defaults document relative to the root
    #[serde(default)]
    pub defaults_file: Option<String>,

    /// Executable variable sources, lowest precedence first
    #[serde(default)]
    pub vars_plugins: Vec<PluginConfig>,
}

/// One executable variable source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// A validated inventory root directory.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRoot {
    path: NormalizedPath,
}

impl InventoryRoot {
    /// Read the root from [`ENV_VAR`].
    pub fn from_env() -> Result<Self> {
        Self::from_value(std::env::var_os(ENV_VAR))
    }

    /// Validate a raw environment value: it must be set, non-empty and name
    /// an existing directory.
    pub fn from_value(value: Option<OsString>) -> Result<Self> {
        let value = value
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::config(format!("Environment not provided: set {ENV_VAR}")))?;
        Self::new(Path::new(&value))
    }

    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = NormalizedPath::expand_home(path);
        if !path.is_dir() {
            return Err(Error::config(format!("Environment '{path}' does not exist")));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// Load `inventory.yml`, or the default configuration when absent.
    pub fn config(&self) -> Result<InventoryConfig> {
        let config = ConfigStore::new()
            .load_optional(&self.path.join(CONFIG_FILE))
            .map_err(Error::config_document)?;
        Ok(config.unwrap_or_default())
    }

    /// Locate the hosts file named by `config`, or the first default
    /// candidate that exists.
    pub fn hosts_path(&self, config: &InventoryConfig) -> Result<NormalizedPath> {
        if let Some(name) = &config.hosts_file {
            let path = self.resolve_relative(name);
            if !path.is_file() {
                return Err(Error::config(format!("Hosts file '{path}' does not exist")));
            }
            return Ok(path);
        }

        HOSTS_CANDIDATES
            .iter()
            .map(|name| self.path.join(name))
            .find(NormalizedPath::is_file)
            .ok_or_else(|| {
                Error::config(format!(
                    "No hosts file in '{}' (looked for {})",
                    self.path,
                    HOSTS_CANDIDATES.join(", ")
                ))
            })
    }

    /// Load the defaults document.
    ///
    /// `override_file` takes precedence over `config.defaults_file`. A
    /// named file that does not exist means no defaults.
    pub fn load_defaults(
        &self,
        config: &InventoryConfig,
        override_file: Option<&str>,
    ) -> Result<Option<VarMap>> {
        let Some(name) = override_file
            .filter(|name| !name.is_empty())
            .or(config.defaults_file.as_deref())
        else {
            return Ok(None);
        };

        let path = self.resolve_relative(name);
        if !path.is_file() {
            tracing::debug!(%path, "Defaults file not found, continuing without defaults");
            return Ok(None);
        }

        let format = path
            .extension()
            .and_then(Format::from_extension)
            .unwrap_or(Format::Yaml);
        let document: Value = ConfigStore::new()
            .load_as(&path, format)
            .map_err(Error::config_document)?;
        let defaults = into_mapping(document).map_err(|other| {
            Error::config(format!(
                "Defaults file '{path}' must contain a mapping, found {}",
                kind_of(&other)
            ))
        })?;
        tracing::debug!(%path, keys = defaults.len(), "Loaded defaults");
        Ok(Some(defaults))
    }

    /// Build the topology and resolver for this root.
    pub fn load(&self, defaults_override: Option<&str>) -> Result<Inventory> {
        let config = self.config()?;
        let hosts_path = self.hosts_path(&config)?;
        let topology = load_hosts_file(&hosts_path)?;

        let mut resolver = InventoryResolver::new()
            .with_source(VariableSource::Files(FileVars::new(self.path.clone())))
            .with_defaults(self.load_defaults(&config, defaults_override)?);
        for plugin in &config.vars_plugins {
            resolver = resolver.with_source(VariableSource::Command(self.plugin_source(plugin)));
        }

        tracing::info!(
            root = %self.path,
            hosts_file = %hosts_path,
            plugins = config.vars_plugins.len(),
            "Loaded inventory"
        );
        Ok(Inventory { topology, resolver })
    }

    fn plugin_source(&self, plugin: &PluginConfig) -> CommandVars {
        // Bare names are looked up on PATH; anything with a separator is
        // relative to the root.
        let command = if plugin.command.contains('/') {
            self.resolve_relative(&plugin.command).to_native()
        } else {
            plugin.command.clone().into()
        };
        CommandVars::new(plugin.name.clone(), command)
            .with_args(plugin.args.clone())
            .with_working_dir(self.path.to_native())
    }

    fn resolve_relative(&self, name: &str) -> NormalizedPath {
        let expanded = NormalizedPath::expand_home(name);
        if expanded.to_native().is_absolute() {
            expanded
        } else {
            self.path.join(name)
        }
    }
}

/// A loaded but unresolved inventory.
#[derive(Debug, Clone)]
pub struct Inventory {
    pub topology: Topology,
    pub resolver: InventoryResolver,
}

impl Inventory {
    pub fn resolve(&self) -> Result<ResolvedInventory> {
        self.resolver.resolve(&self.topology)
    }
}
