//! Core of rollout: dynamic inventory resolution and playbook pinning
//!
//! Two independent pipelines share this crate:
//!
//! - [`inventory`]: builds a [`Topology`] from a hosts file, layers
//!   variables from the configured [`VariableSource`]s and the defaults
//!   document, and produces a [`ResolvedInventory`] that serializes to the
//!   dynamic inventory document.
//! - [`playbook`]: resolves each [`PlaybookEntry`] of a manifest to a
//!   directory, pinning non-`dirty` refs into isolated [`Snapshot`]s.
//!
//! Both pipelines are synchronous and return no partial results on error.

pub mod error;
pub mod inventory;
pub mod playbook;
pub mod vars;

pub use error::{Error, Result};
pub use inventory::{
    Inventory, InventoryResolver, InventoryRoot, ResolvedInventory, Topology, VariableSource,
    VarsProvider,
};
pub use playbook::{
    PlaybookEntry, PlaybookManifest, PlaybookResolver, ResolvedPlaybook, ResolvedPlaybooks,
    Snapshot,
};
pub use vars::{VarMap, deep_merge};
