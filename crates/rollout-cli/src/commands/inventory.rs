//! `rollout inventory`: the dynamic inventory protocol

use rollout_core::inventory::{InventoryRoot, ResolvedInventory};
use rollout_core::vars::VarMap;
use serde_json::Value;

use crate::cli::InventoryArgs;
use crate::error::Result;

/// Resolve the environment named by `args` and print it to stdout.
pub fn run_inventory(args: &InventoryArgs) -> Result<()> {
    let root = InventoryRoot::from_value(args.environment.clone())?;
    let inventory = root.load(args.defaults_file.as_deref())?;
    let resolved = inventory.resolve()?;

    let output = render(&resolved, args.host.as_deref(), args.effective, args.pretty)?;
    println!("{output}");
    Ok(())
}

/// Render the full document, or the variables of `host`.
///
/// Unknown hosts render as `{}`.
pub fn render(
    resolved: &ResolvedInventory,
    host: Option<&str>,
    effective: bool,
    pretty: bool,
) -> Result<String> {
    let value = match host {
        None => serde_json::to_value(resolved)?,
        Some(host) => {
            let vars = if effective {
                resolved.effective_host_vars(host)
            } else {
                resolved.host_vars(host).cloned()
            };
            if vars.is_none() {
                tracing::warn!(host, "Host not in inventory");
            }
            Value::Object(vars.unwrap_or_else(VarMap::new))
        }
    };

    let output = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rollout_core::inventory::{InventoryResolver, Topology};
    use serde_json::json;

    fn resolved() -> ResolvedInventory {
        let mut topology = Topology::new();
        let web_vars = json!({"port": 80}).as_object().cloned().unwrap();
        let host_vars = json!({"role": "primary"}).as_object().cloned().unwrap();
        topology.add_group_vars("web", &web_vars).unwrap();
        topology.add_host("web", "h1", &host_vars).unwrap();
        InventoryResolver::new().resolve(&topology).unwrap()
    }

    #[test]
    fn test_render_list() {
        let output = render(&resolved(), None, false, false).unwrap();
        assert_eq!(
            output,
            r#"{"all":{"hosts":["h1"],"vars":{}},"web":{"hosts":["h1"],"vars":{"port":80}},"_meta":{"hostvars":{"h1":{"role":"primary"}}}}"#
        );
    }

    #[test]
    fn test_render_host() {
        let inventory = resolved();
        assert_eq!(render(&inventory, Some("h1"), false, false).unwrap(), r#"{"role":"primary"}"#);
        assert_eq!(
            render(&inventory, Some("h1"), true, false).unwrap(),
            r#"{"port":80,"role":"primary"}"#
        );
        assert_eq!(render(&inventory, Some("nope"), false, false).unwrap(), "{}");
    }
}
