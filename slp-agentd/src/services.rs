//! Service lookup by name, protocol and attribute criteria.
//!
//! `find("ldap", ..)` queries `service:ldap`; with a protocol it queries
//! `service:install.suse:http`. When the service name equals its protocol
//! (ntp, ssh, ldap) the protocol is left out of the query.

use std::collections::BTreeMap;
use anyhow::{bail, Result};
use chrono::Utc;
use regex::RegexBuilder;
use serde::Deserialize;
use shared::protocol::{REC_HOST, REC_LIFETIME, REC_PORT, REC_SRVURL, REC_SRV_TYPE};
use shared::types::{ServiceEntry, ServiceType};
use shared::value::Value;
use crate::agent::ScrAgent;
use crate::catalog;

pub const SCHEME: &str = "service";
pub const DELIMITER: char = ':';

/// What a discovered service must look like to be returned.
///
/// Every entry of `matching` is a case-insensitive regex applied to the
/// service field of that name, or else to the attribute of that name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Criteria {
    pub scope: Option<String>,
    pub protocol: Option<String>,
    #[serde(flatten)]
    pub matching: BTreeMap<String, String>,
}

/// `service:name` or `service:name:protocol`
pub fn service_type(name: &str, protocol: Option<&str>) -> String {
    let mut parts = vec![SCHEME, name];
    parts.extend(protocol);
    parts.join(&DELIMITER.to_string())
}

pub fn parse_service_type(slp_type: &str) -> Result<ServiceType> {
    let parts: Vec<&str> = slp_type.split(DELIMITER).collect();
    let (name, protocol) = match parts.as_slice() {
        [_, name] => (*name, *name),
        [_, name, protocol] => (*name, *protocol),
        _ => bail!("Incorrect slp service type: {:?}", slp_type),
    };
    Ok(ServiceType {
        name: name.to_string(),
        protocol: protocol.to_string(),
    })
}

/// First discovered service matching the criteria
pub fn find<A: ScrAgent + ?Sized>(agent: &mut A, name: &str, criteria: &Criteria) -> Option<ServiceEntry> {
    for record in discover(agent, name, criteria) {
        let service = build(agent, name, criteria, &record);
        if verify(&service, criteria) {
            return Some(service);
        }
    }
    None
}

/// All discovered services matching the criteria
pub fn all<A: ScrAgent + ?Sized>(agent: &mut A, name: &str, criteria: &Criteria) -> Vec<ServiceEntry> {
    discover(agent, name, criteria)
        .iter()
        .map(|record| build(agent, name, criteria, record))
        .filter(|service| verify(service, criteria))
        .collect()
}

/// Every advertised service type
pub fn types<A: ScrAgent + ?Sized>(agent: &mut A) -> Vec<ServiceType> {
    catalog::find_srv_types(agent, "*", "")
        .iter()
        .filter_map(|slp_type| match parse_service_type(slp_type) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Skipping service type: {}", e);
                None
            }
        })
        .collect()
}

fn discover<A: ScrAgent + ?Sized>(agent: &mut A, name: &str, criteria: &Criteria) -> Vec<Value> {
    let slp_type = service_type(name, criteria.protocol.as_deref());
    catalog::find_srvs(agent, &slp_type, criteria.scope.as_deref().unwrap_or(""))
}

fn build<A: ScrAgent + ?Sized>(agent: &mut A, name: &str, criteria: &Criteria, record: &Value) -> ServiceEntry {
    let text = |key: &str| record.get_str(key).unwrap_or_default().to_string();
    let number = |key: &str| {
        record
            .get(key)
            .and_then(Value::as_i64)
            .and_then(|n| u16::try_from(n).ok())
            .unwrap_or(0)
    };

    let slp_type = text(REC_SRV_TYPE);
    let slp_url = text(REC_SRVURL);
    let protocol = criteria
        .protocol
        .clone()
        .unwrap_or_else(|| slp_type.rsplit(DELIMITER).next().unwrap_or_default().to_string());
    let attributes = catalog::attr_map(agent, &slp_url);

    ServiceEntry {
        name: name.to_string(),
        host: text(REC_HOST),
        port: number(REC_PORT),
        protocol,
        slp_type,
        slp_url,
        lifetime: number(REC_LIFETIME),
        attributes,
        discovered_at: Utc::now(),
    }
}

fn field(service: &ServiceEntry, key: &str) -> Option<String> {
    let value = match key {
        "name" => service.name.clone(),
        "host" => service.host.clone(),
        "port" => service.port.to_string(),
        "protocol" => service.protocol.clone(),
        "slp_type" => service.slp_type.clone(),
        "slp_url" => service.slp_url.clone(),
        "lifetime" => service.lifetime.to_string(),
        _ => return None,
    };
    Some(value)
}

fn verify(service: &ServiceEntry, criteria: &Criteria) -> bool {
    criteria.matching.iter().all(|(key, pattern)| {
        let Some(candidate) = field(service, key).or_else(|| service.attributes.get(key).cloned()) else {
            return false;
        };
        match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => re.is_match(&candidate),
            Err(e) => {
                tracing::warn!("Invalid pattern for {}: {}", key, e);
                false
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::SlpAgent;
    use crate::config::AgentConfig;
    use crate::openslp::fake::FakeSlp;

    const INSTALL_URL: &str =
        "service:install.suse:http://10.100.2.16/install/SLP/SLE-10-SP4-SDK-RC3/x86_64/DVD1";

    fn agent() -> SlpAgent<FakeSlp> {
        let lib = FakeSlp::new()
            .with_urls(&[(INSTALL_URL, 65535)])
            .with_attrs(&["(machine=x86_64),(description=SLE_10_SP4_SDK)"])
            .with_srv_types(&["service:smtp,service:install.suse:http,service:ntp,bogus"]);
        SlpAgent::new(lib, AgentConfig::default())
    }

    fn criteria(protocol: Option<&str>, matching: &[(&str, &str)]) -> Criteria {
        Criteria {
            scope: None,
            protocol: protocol.map(str::to_string),
            matching: matching.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    #[test]
    fn test_service_type_composition() {
        assert_eq!(service_type("ldap", None), "service:ldap");
        assert_eq!(service_type("install.suse", Some("ftp")), "service:install.suse:ftp");
    }

    #[test]
    fn test_parse_service_type() {
        let ntp = parse_service_type("service:ntp").unwrap();
        assert_eq!((ntp.name.as_str(), ntp.protocol.as_str()), ("ntp", "ntp"));
        let install = parse_service_type("service:install.suse:http").unwrap();
        assert_eq!(install.name, "install.suse");
        assert_eq!(install.protocol, "http");
        assert!(parse_service_type("bogus").is_err());
        assert!(parse_service_type("a:b:c:d").is_err());
    }

    #[test]
    fn test_find_matches_protocol_and_attributes() {
        let mut agent = agent();
        let service = find(
            &mut agent,
            "install.suse",
            &criteria(Some("http"), &[("machine", "X86_64")]),
        )
        .unwrap();

        assert_eq!(service.name, "install.suse");
        assert_eq!(service.host, "10.100.2.16");
        assert_eq!(service.protocol, "http");
        assert_eq!(service.port, 0);
        assert_eq!(service.lifetime, 65535);
        assert_eq!(service.slp_url, INSTALL_URL);
        assert_eq!(service.attributes["description"], "SLE_10_SP4_SDK");
        assert!(agent
            .library()
            .log()
            .calls
            .contains(&"findsrvs service:install.suse:http||".to_string()));
    }

    #[test]
    fn test_find_rejects_unknown_criteria() {
        let mut agent = agent();
        assert!(find(&mut agent, "install.suse", &criteria(None, &[("color", "red")])).is_none());
        assert!(find(&mut agent, "install.suse", &criteria(None, &[("machine", "ppc")])).is_none());
    }

    #[test]
    fn test_all_returns_collection() {
        let mut agent = agent();
        let services = all(&mut agent, "install.suse", &Criteria::default());
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].protocol, "http");
    }

    #[test]
    fn test_types_skip_malformed() {
        let mut agent = agent();
        let types = types(&mut agent);
        assert_eq!(types.len(), 3);
        let install = types.iter().find(|t| t.name == "install.suse").unwrap();
        assert_eq!(install.protocol, "http");
    }
}
