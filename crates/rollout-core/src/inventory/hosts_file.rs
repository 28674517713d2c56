//! Hosts file parsing
//!
//! Two formats build a [`Topology`]:
//!
//! - INI (any file without a `.yml`/`.yaml`/`.json` extension):
//!
//!   ```text
//!   bastion                      # before any section: ungrouped
//!
//!   [web]
//!   web01 ansible_host=10.0.0.5 port=8080
//!
//!   [web:vars]
//!   env="production"
//!
//!   [prod:children]
//!   web
//!   ```
//!
//! - YAML/JSON: `{ <group>: { hosts: {<host>: <vars>}, vars: {...}, children: {...} } }`

use rollout_fs::{ConfigStore, Format, NormalizedPath, io};
use serde_json::Value;

use super::topology::{Topology, UNGROUPED};
use crate::vars::{VarMap, into_mapping, kind_of};
use crate::{Error, Result};

/// Load a hosts file, choosing the format from its extension.
pub fn load_hosts_file(path: &NormalizedPath) -> Result<Topology> {
    let origin = path.to_string();
    match path.extension().and_then(Format::from_extension) {
        Some(Format::Yaml) | Some(Format::Json) => {
            let document: Value = ConfigStore::new()
                .load(path)
                .map_err(Error::config_document)?;
            from_document(document, &origin)
        }
        _ => {
            let content = io::read_text(path)?;
            parse_ini(&content, &origin)
        }
    }
}

enum Section {
    Hosts(String),
    Vars(String),
    Children(String),
}

/// Parse an INI hosts file. `origin` names the file in error messages.
pub fn parse_ini(content: &str, origin: &str) -> Result<Topology> {
    let mut topology = Topology::new();
    let mut section = Section::Hosts(UNGROUPED.to_string());

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let located = |e: Error| locate(e, origin, line_no);

        if line.starts_with('[') {
            section = parse_header(line).map_err(|m| located(Error::config(m)))?;
            let group = match &section {
                Section::Hosts(g) | Section::Vars(g) | Section::Children(g) => g,
            };
            topology.add_group(group).map_err(located)?;
            continue;
        }

        match &section {
            Section::Hosts(group) => {
                let tokens = split_tokens(line).map_err(|m| located(Error::config(m)))?;
                let Some((host, assignments)) = tokens.split_first() else {
                    continue;
                };
                let vars = parse_assignments(assignments).map_err(|m| located(Error::config(m)))?;
                topology.add_host(group, host, &vars).map_err(located)?;
            }
            Section::Vars(group) => {
                let vars = parse_assignments(&[line.to_string()])
                    .map_err(|m| located(Error::config(m)))?;
                topology.add_group_vars(group, &vars).map_err(located)?;
            }
            Section::Children(group) => {
                topology.add_child_group(group, line).map_err(located)?;
            }
        }
    }

    tracing::debug!(
        origin,
        groups = topology.groups().count(),
        hosts = topology.hosts().count(),
        "Parsed INI hosts file"
    );
    Ok(topology)
}

/// Build a topology from a YAML/JSON inventory document.
pub fn from_document(document: Value, origin: &str) -> Result<Topology> {
    let root = into_mapping(document).map_err(|other| {
        Error::config(format!(
            "{origin}: hosts document must be a mapping, found {}",
            kind_of(&other)
        ))
    })?;

    let mut topology = Topology::new();
    for (group, body) in &root {
        load_group(&mut topology, None, group, body, origin)?;
    }
    Ok(topology)
}

fn load_group(
    topology: &mut Topology,
    parent: Option<&str>,
    name: &str,
    body: &Value,
    origin: &str,
) -> Result<()> {
    match parent {
        Some(parent) => topology.add_child_group(parent, name)?,
        None => topology.add_group(name)?,
    }

    let body = match body {
        Value::Null => return Ok(()),
        Value::Object(body) => body,
        other => {
            return Err(Error::config(format!(
                "{origin}: group '{name}' must be a mapping, found {}",
                kind_of(other)
            )));
        }
    };

    for (key, value) in body {
        match key.as_str() {
            "hosts" => {
                for (host, vars) in section_mapping(value, name, key, origin)? {
                    let vars = mapping_at(vars, origin, &format!("host '{host}'"))?;
                    topology.add_host(name, &host, &vars)?;
                }
            }
            "vars" => {
                let vars = mapping_at(value.clone(), origin, &format!("vars of group '{name}'"))?;
                topology.add_group_vars(name, &vars)?;
            }
            "children" => {
                for (child, child_body) in section_mapping(value, name, key, origin)? {
                    load_group(topology, Some(name), &child, &child_body, origin)?;
                }
            }
            other => {
                return Err(Error::config(format!(
                    "{origin}: unknown key '{other}' in group '{name}' (expected hosts, vars or children)"
                )));
            }
        }
    }
    Ok(())
}

fn section_mapping(value: &Value, group: &str, key: &str, origin: &str) -> Result<VarMap> {
    mapping_at(value.clone(), origin, &format!("{key} of group '{group}'"))
}

fn mapping_at(value: Value, origin: &str, what: &str) -> Result<VarMap> {
    into_mapping(value).map_err(|other| {
        Error::config(format!(
            "{origin}: {what} must be a mapping, found {}",
            kind_of(&other)
        ))
    })
}

fn locate(error: Error, origin: &str, line_no: usize) -> Error {
    match error {
        Error::Configuration { message } => Error::config(format!("{origin}:{line_no}: {message}")),
        other => other,
    }
}

fn parse_header(line: &str) -> std::result::Result<Section, String> {
    let header = line
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
        .ok_or_else(|| format!("malformed section header '{line}'"))?;

    match header.split_once(':') {
        None => Ok(Section::Hosts(header.to_string())),
        Some((group, "vars")) => Ok(Section::Vars(group.to_string())),
        Some((group, "children")) => Ok(Section::Children(group.to_string())),
        Some((_, kind)) => Err(format!(
            "unknown section kind ':{kind}' (expected :vars or :children)"
        )),
    }
}

/// Split a host line on whitespace, keeping quoted runs together.
///
/// Quotes are preserved in the tokens so values can tell quoted strings
/// from bare scalars. An unquoted `#` at the start of a token begins a
/// trailing comment.
fn split_tokens(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                current.push(c);
            }
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None if c == '#' && current.is_empty() => break,
            None => current.push(c),
        }
    }

    if quote.is_some() {
        return Err(format!("unterminated quote in '{line}'"));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_assignments(tokens: &[String]) -> std::result::Result<VarMap, String> {
    let mut vars = VarMap::new();
    for token in tokens {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, found '{token}'"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("missing variable name in '{token}'"));
        }
        vars.insert(key.to_string(), parse_value(value.trim()));
    }
    Ok(vars)
}

/// Interpret an INI value.
///
/// Quoted values are strings with the quotes removed. Bare values that
/// read as YAML numbers or booleans are typed; everything else is a string.
fn parse_value(raw: &str) -> Value {
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Value::String(raw[1..raw.len() - 1].to_string());
        }
    }

    match serde_yaml::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}
