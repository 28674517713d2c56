use serde_json::Value;

use super::VarMap;

/// Deep merge `overlay` on top of `base`, returning a new mapping.
///
/// For every key in `overlay`: if both sides hold a mapping the two are
/// merged recursively; otherwise the overlay value replaces the base value
/// wholesale (sequences are never concatenated). Keys only in `base` are
/// kept unchanged. Neither input is modified.
pub fn deep_merge(base: &VarMap, overlay: &VarMap) -> VarMap {
    let mut merged = base.clone();
    for (key, overlay_value) in overlay {
        let value = match (merged.get(key), overlay_value) {
            (Some(Value::Object(base_map)), Value::Object(overlay_map)) => {
                Value::Object(deep_merge(base_map, overlay_map))
            }
            _ => overlay_value.clone(),
        };
        merged.insert(key.clone(), value);
    }
    merged
}

/// Merge a sequence of mappings left to right, later layers winning.
///
/// An empty sequence yields an empty mapping.
pub fn merge_layers<'a>(layers: impl IntoIterator<Item = &'a VarMap>) -> VarMap {
    layers
        .into_iter()
        .fold(VarMap::new(), |acc, layer| deep_merge(&acc, layer))
}
