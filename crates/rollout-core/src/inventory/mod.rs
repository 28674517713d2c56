//! Dynamic inventory: topology, variable sources and resolution
//!
//! Loading goes root → `inventory.yml` → hosts file ([`Topology`]) →
//! [`InventoryResolver`] with the `group_vars`/`host_vars` files source
//! followed by any configured plugins → [`ResolvedInventory`].

mod config;
mod hosts_file;
mod resolver;
mod source;
mod topology;

pub use config::{
    CONFIG_FILE, DEFAULTS_FILE_VAR, ENV_VAR, Inventory, InventoryConfig, InventoryRoot,
    PluginConfig,
};
pub use hosts_file::{from_document, load_hosts_file, parse_ini};
pub use resolver::{InventoryResolver, ResolvedInventory};
pub use source::{CommandVars, FileVars, FixedVars, Scope, VariableSource, VarsProvider};
pub use topology::{ALL, Group, Host, META_KEY, Topology, UNGROUPED};
