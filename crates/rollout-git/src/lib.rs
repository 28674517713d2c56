//! Git access for rollout
//!
//! Playbook repositories are pinned by force-updating a local control
//! branch to an upstream ref and cloning only that branch into an isolated
//! directory. [`SourceRepository`] is the seam the playbook resolver talks
//! to; [`GitRepository`] implements it with `git2`.

pub mod error;
pub mod helpers;
pub mod provider;
pub mod working_copy;

pub use error::{Error, Result};
pub use provider::{CONTROL_BRANCH, DEFAULT_REMOTE, SourceRepository};
pub use working_copy::GitRepository;
