//! Playbook manifests and pinned playbook snapshots

mod manifest;
mod resolver;
mod snapshot;

pub use manifest::{DIRTY_REF, ManifestOverrides, PlaybookEntry, PlaybookManifest};
pub use resolver::{PlaybookResolver, ResolvedPlaybook, ResolvedPlaybooks};
pub use snapshot::Snapshot;
