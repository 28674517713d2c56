//! Command implementations for rollout-cli

pub mod inventory;
pub mod playbooks;

pub use inventory::run_inventory;
pub use playbooks::run_playbooks;
