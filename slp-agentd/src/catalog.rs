//! Convenience calls on top of any [`ScrAgent`], speaking only the generic
//! Read/Execute protocol.

use std::collections::BTreeMap;
use std::path::Path;
use anyhow::{Context, Result};
use regex::Regex;
use shared::path::ScrPath;
use shared::protocol::{
    CMD_DEREGISTER, CMD_FIND_ATTRIBUTES, CMD_FIND_SERVICES, CMD_FIND_SERVICE_TYPES, CMD_REGISTER,
    CMD_UNICAST_FIND_ATTRIBUTES, OPT_IP_ADDRESS, OPT_NAMING_AUTHORITY, OPT_SCOPE_LIST,
    OPT_SERVICE_TYPE, OPT_URL_OR_SERVICE_TYPE, REC_SRVURL,
};
use shared::value::Value;
use crate::agent::ScrAgent;
use crate::split::split_string;

/// Key under which [`match_type`] attaches the attribute map
pub const ATTR_KEY: &str = "attr";

fn slp_path(command: &str) -> ScrPath {
    ScrPath::new(["slp", command])
}

fn read<A: ScrAgent + ?Sized>(agent: &mut A, command: &str, options: &[(&str, &str)]) -> Vec<Value> {
    let arg: Value = options.iter().map(|(k, v)| (*k, *v)).collect();
    match agent.read(&slp_path(command), &arg) {
        Value::List(items) => items,
        _ => Vec::new(),
    }
}

fn strings(items: Vec<Value>) -> Vec<String> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect()
}

/// Services of a type, as generic records
pub fn find_srvs<A: ScrAgent + ?Sized>(agent: &mut A, service_type: &str, scopes: &str) -> Vec<Value> {
    let services = read(
        agent,
        CMD_FIND_SERVICES,
        &[(OPT_SERVICE_TYPE, service_type), (OPT_SCOPE_LIST, scopes)],
    );
    let shown = Value::List(services.clone());
    tracing::debug!("FindSrvs: {}", shown);
    services
}

/// Service types of a naming authority; "*" for all, "" for IANA
pub fn find_srv_types<A: ScrAgent + ?Sized>(
    agent: &mut A,
    naming_authority: &str,
    scopes: &str,
) -> Vec<String> {
    strings(read(
        agent,
        CMD_FIND_SERVICE_TYPES,
        &[(OPT_NAMING_AUTHORITY, naming_authority), (OPT_SCOPE_LIST, scopes)],
    ))
}

pub fn find_attrs<A: ScrAgent + ?Sized>(agent: &mut A, url_or_type: &str) -> Vec<String> {
    strings(read(agent, CMD_FIND_ATTRIBUTES, &[(OPT_URL_OR_SERVICE_TYPE, url_or_type)]))
}

/// Attributes asked directly from the agent at `ip`; multicast when `ip` is empty
pub fn unicast_find_attrs<A: ScrAgent + ?Sized>(agent: &mut A, url_or_type: &str, ip: &str) -> Vec<String> {
    if ip.is_empty() {
        return find_attrs(agent, url_or_type);
    }
    strings(read(
        agent,
        CMD_UNICAST_FIND_ATTRIBUTES,
        &[(OPT_URL_OR_SERVICE_TYPE, url_or_type), (OPT_IP_ADDRESS, ip)],
    ))
}

pub fn attr_map<A: ScrAgent + ?Sized>(agent: &mut A, url_or_type: &str) -> BTreeMap<String, String> {
    parse_attrs(&find_attrs(agent, url_or_type))
}

pub fn unicast_attr_map<A: ScrAgent + ?Sized>(
    agent: &mut A,
    url_or_type: &str,
    ip: &str,
) -> BTreeMap<String, String> {
    parse_attrs(&unicast_find_attrs(agent, url_or_type, ip))
}

/// Turn `(key=value)` entries into a map. The first and last character of
/// each entry are dropped; a missing key or value reads as "empty".
pub fn parse_attrs(attrs: &[String]) -> BTreeMap<String, String> {
    attrs
        .iter()
        .map(|attr| {
            let mut chars = attr.chars();
            chars.next();
            chars.next_back();
            let parts = split_string(Some(chars.as_str()), Some("=")).unwrap_or_default();
            let part = |i: usize| parts.get(i).cloned().unwrap_or_else(|| "empty".to_string());
            (part(0), part(1))
        })
        .collect()
}

pub fn reg<A: ScrAgent + ?Sized>(agent: &mut A, service: &str) -> bool {
    let result = agent.execute(&slp_path(CMD_REGISTER), &Value::from(service), &Value::Null);
    result.as_bool().unwrap_or(false)
}

pub fn dereg<A: ScrAgent + ?Sized>(agent: &mut A, service: &str) -> bool {
    let result = agent.execute(&slp_path(CMD_DEREGISTER), &Value::from(service), &Value::Null);
    result.as_bool().unwrap_or(false)
}

/// Write a static registration file `dir/regfile` for slpd: the service URL
/// followed by one `key=value` line per attribute, keys lowercased.
pub fn reg_file(
    dir: &Path,
    service: &str,
    attrs: &BTreeMap<String, String>,
    regfile: &str,
) -> Result<()> {
    let mut lines = vec![service.to_string()];
    lines.extend(attrs.iter().map(|(k, v)| format!("{}={}", k.to_lowercase(), v)));

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    let path = dir.join(regfile);
    std::fs::write(&path, lines.join("\n"))
        .with_context(|| format!("Failed to write registration file: {}", path.display()))?;

    tracing::info!("Wrote registration file {}", path.display());
    Ok(())
}

/// Remove a registration file written by [`reg_file`]
pub fn dereg_file(path: &Path) -> Result<()> {
    std::fs::remove_file(path)
        .with_context(|| format!("Failed to remove registration file: {}", path.display()))?;
    tracing::info!("Removed registration file {}", path.display());
    Ok(())
}

/// Every service of every type matching `pattern`, each with its attribute
/// map under [`ATTR_KEY`]. Duplicates are dropped.
pub fn match_type<A: ScrAgent + ?Sized>(agent: &mut A, pattern: &Regex) -> Vec<Value> {
    let mut matched = Vec::new();

    for service_type in find_srv_types(agent, "*", "") {
        if !pattern.is_match(&service_type) {
            continue;
        }
        for service in find_srvs(agent, &service_type, "") {
            let Value::Map(mut record) = service else {
                continue;
            };
            let url = record
                .get(&Value::from(REC_SRVURL))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let attrs: Value = attr_map(agent, &url).into_iter().collect();
            record.insert(Value::from(ATTR_KEY), attrs);

            let record = Value::Map(record);
            if !matched.contains(&record) {
                matched.push(record);
            }
        }
    }

    matched
}
