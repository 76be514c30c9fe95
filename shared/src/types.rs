use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

/// A discovered SLP service, enriched with its attributes.
/// This is the model returned by the service lookup API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Service name as requested, e.g. "install.suse"
    pub name: String,

    /// Host part of the service URL
    pub host: String,

    /// Service port, 0 when the URL carries none
    pub port: u16,

    /// Protocol, e.g. "http" for "service:install.suse:http"
    pub protocol: String,

    /// SLP service type, e.g. "service:install.suse:http"
    pub slp_type: String,

    /// Full SLP service URL
    pub slp_url: String,

    /// URL lifetime in seconds
    pub lifetime: u16,

    /// Attribute key-value pairs
    pub attributes: BTreeMap<String, String>,

    /// When this service was discovered
    pub discovered_at: DateTime<Utc>,
}

/// A service type split into its name and protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceType {
    pub name: String,
    pub protocol: String,
}
