//! CLI argument parsing using clap derive

use clap::{Args, Parser, Subcommand};
use rollout_core::inventory::{DEFAULTS_FILE_VAR, ENV_VAR};
use std::ffi::OsString;
use std::path::PathBuf;

/// rollout - dynamic inventory and pinned playbooks for deployments
#[derive(Parser, Debug)]
#[command(name = "rollout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose (debug) logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print the dynamic inventory of an environment
    ///
    /// Examples:
    ///   rollout inventory --list
    ///   rollout inventory --host web01
    ///   rollout inventory --host web01 --effective
    Inventory(InventoryArgs),

    /// Resolve the playbooks of a manifest to pinned snapshots
    ///
    /// Anything after `--` is run as a command with the resolved playbook
    /// paths appended; snapshots are removed once it exits.
    ///
    /// Examples:
    ///   rollout playbooks envs/prod/manifest.yml
    ///   rollout playbooks manifest.yml --auto-fetch -- ansible-playbook -i inventory
    Playbooks(PlaybooksArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct InventoryArgs {
    /// Print the whole inventory (the default)
    #[arg(long)]
    pub list: bool,

    /// Print the variables of a single host
    #[arg(long, conflicts_with = "list")]
    pub host: Option<String>,

    /// With --host, merge the host's group variables under its own
    #[arg(long, requires = "host")]
    pub effective: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Inventory root directory
    #[arg(long = "env", env = ENV_VAR, value_name = "DIR")]
    pub environment: Option<OsString>,

    /// Defaults document, overriding inventory.yml
    #[arg(long, env = DEFAULTS_FILE_VAR, value_name = "FILE")]
    pub defaults_file: Option<String>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PlaybooksArgs {
    /// Playbook manifest (YAML)
    pub manifest: PathBuf,

    /// Fetch all remotes before pinning
    #[arg(long)]
    pub auto_fetch: bool,

    /// Directory holding the playbook repositories, overriding the manifest
    #[arg(long, value_name = "DIR")]
    pub playbook_path: Option<String>,

    /// Create snapshots under this directory instead of the system temp dir
    #[arg(long, value_name = "DIR")]
    pub snapshot_dir: Option<PathBuf>,

    /// Command to run while the snapshots exist
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}
