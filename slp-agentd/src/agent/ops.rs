use shared::protocol::{
    REC_FAMILY, REC_HOST, REC_LIFETIME, REC_PORT, REC_SRVURL, REC_SRV_PART, REC_SRV_TYPE,
};
use shared::value::Value;
use crate::openslp::url::{self, ServiceUrl};
use crate::openslp::{SlpError, SlpLibrary, SlpSession};
use crate::split::{split_attr_string, split_string};

/// One service reported by a service request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub srvurl: String,
    pub parsed: ServiceUrl,
    pub lifetime: u16,
}

impl ServiceRecord {
    /// "IP" for IP networks, "Other" otherwise
    pub fn family(&self) -> &'static str {
        if self.parsed.net_family.is_empty() {
            "IP"
        } else {
            "Other"
        }
    }
}

impl From<ServiceRecord> for Value {
    fn from(record: ServiceRecord) -> Self {
        let family = record.family();
        [
            (REC_SRVURL, Value::from(record.srvurl)),
            (REC_SRV_TYPE, Value::from(record.parsed.srv_type)),
            (REC_HOST, Value::from(record.parsed.host)),
            (REC_PORT, Value::from(record.parsed.port)),
            (REC_FAMILY, Value::from(family)),
            (REC_SRV_PART, Value::from(record.parsed.srv_part)),
            (REC_LIFETIME, Value::from(record.lifetime)),
        ]
        .into_iter()
        .collect()
    }
}

/// Find services of `service_type`, one record per reported URL.
/// URLs that do not parse are logged and left out.
pub fn find_services<L: SlpLibrary>(
    lib: &L,
    locale: &str,
    service_type: &str,
    scopes: &str,
    filter: &str,
) -> Result<Vec<ServiceRecord>, SlpError> {
    let mut session = lib.open(locale)?;
    let urls = session.find_srvs(service_type, scopes, filter)?;
    tracing::debug!("{} reported {} URLs", service_type, urls.len());

    Ok(urls
        .into_iter()
        .filter_map(|found| match url::parse(&found.url) {
            Ok(parsed) => Some(ServiceRecord {
                srvurl: found.url,
                parsed,
                lifetime: found.lifetime,
            }),
            Err(e) => {
                tracing::warn!("Skipping service: {}", e);
                None
            }
        })
        .collect())
}

/// Find service types of a naming authority ("*" for all, "" for IANA)
pub fn find_service_types<L: SlpLibrary>(
    lib: &L,
    locale: &str,
    naming_authority: &str,
    scopes: &str,
) -> Result<Vec<String>, SlpError> {
    let mut session = lib.open(locale)?;
    let lists = session.find_srv_types(naming_authority, scopes)?;
    Ok(last_list(&lists, split_string))
}

/// Find attributes of a service URL or of every service of a type
pub fn find_attributes<L: SlpLibrary>(
    lib: &L,
    locale: &str,
    url_or_type: &str,
    scopes: &str,
    attr_ids: &str,
) -> Result<Vec<String>, SlpError> {
    let mut session = lib.open(locale)?;
    let lists = session.find_attrs(url_or_type, scopes, attr_ids)?;
    Ok(last_list(&lists, split_attr_string))
}

/// Like [`find_attributes`], but asks the agent at `ip` directly
pub fn unicast_find_attributes<L: SlpLibrary>(
    lib: &L,
    locale: &str,
    url_or_type: &str,
    scopes: &str,
    attr_ids: &str,
    ip: &str,
) -> Result<Vec<String>, SlpError> {
    let mut session = lib.open(locale)?;
    session.associate_ip(ip)?;
    let lists = session.find_attrs(url_or_type, scopes, attr_ids)?;
    Ok(last_list(&lists, split_attr_string))
}

pub fn register<L: SlpLibrary>(
    lib: &L,
    locale: &str,
    srvurl: &str,
    lifetime: u16,
    attrs: &str,
) -> Result<(), SlpError> {
    let mut session = lib.open(locale)?;
    session.reg(srvurl, lifetime, attrs, true)
}

pub fn deregister<L: SlpLibrary>(lib: &L, locale: &str, srvurl: &str) -> Result<(), SlpError> {
    let mut session = lib.open(locale)?;
    session.dereg(srvurl)
}

/// Each callback replaces the previous list, so only the last one counts
fn last_list(
    lists: &[String],
    split: fn(Option<&str>, Option<&str>) -> Option<Vec<String>>,
) -> Vec<String> {
    lists
        .last()
        .and_then(|list| split(Some(list), Some(",")))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openslp::fake::FakeSlp;
    use crate::openslp::{SlpCall, SlpStatus};

    #[test]
    fn test_find_services_builds_full_records() {
        let lib = FakeSlp::new().with_urls(&[
            ("service:ldap://ldap.example.com:389", 65535),
            ("service:printer:lpr://printhost:515/queue1", 300),
        ]);

        let records = find_services(&lib, "en", "service:ldap", "", "").unwrap();
        assert_eq!(records.len(), 2);

        let value = Value::from(records[1].clone());
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 7);
        for key in [REC_SRVURL, REC_SRV_TYPE, REC_HOST, REC_PORT, REC_FAMILY, REC_SRV_PART, REC_LIFETIME] {
            let field = value.get(key).unwrap();
            assert!(!field.is_null(), "{} is null", key);
        }
        assert_eq!(value.get_str(REC_SRV_TYPE), Some("service:printer:lpr"));
        assert_eq!(value.get_str(REC_HOST), Some("printhost"));
        assert_eq!(value.get(REC_PORT), Some(&Value::Integer(515)));
        assert_eq!(value.get_str(REC_FAMILY), Some("IP"));
        assert_eq!(value.get_str(REC_SRV_PART), Some("/queue1"));
        assert_eq!(value.get(REC_LIFETIME), Some(&Value::Integer(300)));

        let log = lib.log();
        assert_eq!(log.opened, 1);
        assert_eq!(log.closed, 1);
        assert_eq!(log.calls[1], "findsrvs service:ldap||");
    }

    #[test]
    fn test_find_services_skips_unparsable_url() {
        let lib = FakeSlp::new().with_urls(&[
            ("service:ldap://good.example.com:389", 65535),
            ("garbage", 10),
        ]);
        let records = find_services(&lib, "en", "service:ldap", "", "").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].srvurl, "service:ldap://good.example.com:389");
        assert_eq!(records[0].parsed.host, "good.example.com");
        assert_eq!(lib.log().closed, 1);
    }

    #[test]
    fn test_find_service_types_uses_last_list() {
        let lib = FakeSlp::new().with_srv_types(&["service:old", "service:ntp,service:ldap"]);
        let types = find_service_types(&lib, "en", "*", "").unwrap();
        assert_eq!(types, vec!["service:ntp", "service:ldap"]);
    }

    #[test]
    fn test_find_service_types_nothing_reported() {
        let lib = FakeSlp::new();
        assert!(find_service_types(&lib, "en", "", "").unwrap().is_empty());
    }

    #[test]
    fn test_find_attributes_splits_groups() {
        let lib = FakeSlp::new().with_attrs(&["(machine=x86_64),(description=SLE_10_SP4_SDK)"]);
        let attrs = find_attributes(&lib, "en", "service:install.suse:http://h/p", "", "").unwrap();
        assert_eq!(attrs, vec!["(machine=x86_64)", "(description=SLE_10_SP4_SDK)"]);
    }

    #[test]
    fn test_unicast_find_attributes_associates_first() {
        let lib = FakeSlp::new().with_attrs(&["(a=1)"]);
        let attrs =
            unicast_find_attributes(&lib, "en", "service:ntp://t", "DEFAULT", "", "10.0.0.1").unwrap();
        assert_eq!(attrs, vec!["(a=1)"]);
        let log = lib.log();
        assert_eq!(log.calls[1], "associate 10.0.0.1");
        assert_eq!(log.calls[2], "findattrs service:ntp://t|DEFAULT|");
    }

    #[test]
    fn test_failed_call_still_closes_session() {
        let err = SlpError::Callback {
            call: SlpCall::Reg,
            status: SlpStatus::INVALID_REGISTRATION,
        };
        let lib = FakeSlp::new().failing(err.clone());
        assert_eq!(register(&lib, "en", "service:x://h", 65535, "").unwrap_err(), err);
        let log = lib.log();
        assert_eq!(log.opened, 1);
        assert_eq!(log.closed, 1);
    }

    #[test]
    fn test_open_failure_opens_nothing() {
        let lib = FakeSlp::new().open_failing(SlpStatus::NETWORK_INIT_FAILED);
        let err = deregister(&lib, "en", "service:x://h").unwrap_err();
        assert_eq!(err, SlpError::Open(SlpStatus::NETWORK_INIT_FAILED));
        assert_eq!(lib.log().closed, 0);
    }

    #[test]
    fn test_register_is_fresh() {
        let lib = FakeSlp::new();
        register(&lib, "en", "service:x://h", 120, "(k=v)").unwrap();
        assert_eq!(lib.log().calls[1], "reg service:x://h|120|(k=v)|true");
    }
}
