//! Shared test utilities for the rollout workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`] — real git upstreams and working copies with an `origin` remote
//! - [`inventory`] — [`inventory::TestInventory`] builder for inventory directories

pub mod git;
pub mod inventory;
