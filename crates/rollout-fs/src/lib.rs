//! Filesystem helpers for rollout
//!
//! Provides normalized path handling and format-agnostic document loading
//! for inventory files, variable files and playbook manifests.

pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::{ConfigStore, Format};
pub use error::{Error, Result};
pub use path::NormalizedPath;
