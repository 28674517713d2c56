//! `rollout playbooks`: pin manifest playbooks and optionally run a command

use std::process::Command;
use std::thread;
use std::time::Duration;

use colored::Colorize;
use rollout_core::playbook::{
    ManifestOverrides, PlaybookManifest, PlaybookResolver, ResolvedPlaybooks,
};
use rollout_fs::NormalizedPath;
use rollout_git::GitRepository;

use crate::cli::PlaybooksArgs;
use crate::error::{CliError, Result};
use crate::interrupt::Interrupt;

/// How often a running command is checked for exit or interruption.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Resolve every playbook of the manifest.
///
/// Without a command, prints `repository/file -> path` lines and removes the
/// snapshots again. With a command, runs it with the playbook paths appended
/// and returns its exit code once the snapshots are removed.
///
/// SIGINT or SIGTERM stops the command, removes the snapshots and returns
/// `128 + signal`.
pub fn run_playbooks(args: &PlaybooksArgs) -> Result<i32> {
    let interrupt = Interrupt::install()?;
    let manifest = PlaybookManifest::load(&NormalizedPath::new(&args.manifest))?.with_overrides(
        ManifestOverrides {
            playbook_path: args.playbook_path.clone(),
            auto_fetch: args.auto_fetch.then_some(true),
        },
    );

    let mut resolver = PlaybookResolver::from_manifest(GitRepository::new(), &manifest);
    if let Some(dir) = &args.snapshot_dir {
        resolver = resolver.with_snapshot_root(NormalizedPath::new(dir));
    }

    let mut playbooks = resolver.resolve_all(&manifest.playbooks)?;
    if let Some(code) = interrupt.exit_code() {
        tracing::warn!("Interrupted during resolution, removing snapshots");
        playbooks.release()?;
        return Ok(code);
    }
    for line in describe(&playbooks) {
        println!("{line}");
    }

    let code = match args.command.split_first() {
        Some((program, program_args)) => {
            run_command(program, program_args, &playbooks, &interrupt)
        }
        None => Ok(0),
    };
    playbooks.release()?;
    code
}

fn describe(playbooks: &ResolvedPlaybooks) -> Vec<String> {
    playbooks
        .iter()
        .map(|playbook| {
            let pin = match playbook.commit() {
                Some(commit) => commit.chars().take(10).collect::<String>(),
                None => "dirty".yellow().to_string(),
            };
            format!("{} ({}) -> {}", playbook.entry().label().bold(), pin, playbook.path())
        })
        .collect()
}

fn run_command(
    program: &str,
    args: &[String],
    playbooks: &ResolvedPlaybooks,
    interrupt: &Interrupt,
) -> Result<i32> {
    let paths = playbooks.paths();
    tracing::info!(program, playbooks = paths.len(), "Running command");

    let mut child = Command::new(program)
        .args(args)
        .args(paths.iter().map(NormalizedPath::to_native))
        .spawn()
        .map_err(|e| CliError::user(format!("Failed to run '{program}': {e}")))?;

    loop {
        if let Some(status) = child.try_wait()? {
            if let Some(code) = interrupt.exit_code() {
                return Ok(code);
            }
            if !status.success() {
                tracing::warn!(program, %status, "Command failed");
            }
            return Ok(status.code().unwrap_or(1));
        }

        if let Some(code) = interrupt.exit_code() {
            tracing::warn!(program, "Interrupted, stopping command");
            if let Err(e) = child.kill() {
                tracing::debug!(program, error = %e, "Command already stopped");
            }
            child.wait()?;
            return Ok(code);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
