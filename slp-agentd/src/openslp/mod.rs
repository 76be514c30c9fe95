pub mod ffi;
pub mod url;

#[cfg(test)]
pub mod fake;

use std::fmt;
use thiserror::Error;

/// Maximum URL lifetime accepted by SLP registrations, in seconds
pub const LIFETIME_MAXIMUM: u16 = 65535;

/// Status code reported by the OpenSLP library, either as a call's return
/// value or through a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlpStatus(pub i32);

impl SlpStatus {
    pub const LAST_CALL: SlpStatus = SlpStatus(1);
    pub const OK: SlpStatus = SlpStatus(0);
    pub const LANGUAGE_NOT_SUPPORTED: SlpStatus = SlpStatus(-1);
    pub const PARSE_ERROR: SlpStatus = SlpStatus(-2);
    pub const INVALID_REGISTRATION: SlpStatus = SlpStatus(-3);
    pub const SCOPE_NOT_SUPPORTED: SlpStatus = SlpStatus(-4);
    pub const AUTHENTICATION_ABSENT: SlpStatus = SlpStatus(-6);
    pub const AUTHENTICATION_FAILED: SlpStatus = SlpStatus(-7);
    pub const INVALID_UPDATE: SlpStatus = SlpStatus(-13);
    pub const REFRESH_REJECTED: SlpStatus = SlpStatus(-15);
    pub const NOT_IMPLEMENTED: SlpStatus = SlpStatus(-17);
    pub const BUFFER_OVERFLOW: SlpStatus = SlpStatus(-18);
    pub const NETWORK_TIMED_OUT: SlpStatus = SlpStatus(-19);
    pub const NETWORK_INIT_FAILED: SlpStatus = SlpStatus(-20);
    pub const MEMORY_ALLOC_FAILED: SlpStatus = SlpStatus(-21);
    pub const PARAMETER_BAD: SlpStatus = SlpStatus(-22);
    pub const NETWORK_ERROR: SlpStatus = SlpStatus(-23);
    pub const INTERNAL_SYSTEM_ERROR: SlpStatus = SlpStatus(-24);
    pub const HANDLE_IN_USE: SlpStatus = SlpStatus(-25);
    pub const TYPE_ERROR: SlpStatus = SlpStatus(-26);
    pub const RETRY_UNICAST: SlpStatus = SlpStatus(-27);

    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LAST_CALL => "SLP_LAST_CALL",
            Self::OK => "SLP_OK",
            Self::LANGUAGE_NOT_SUPPORTED => "SLP_LANGUAGE_NOT_SUPPORTED",
            Self::PARSE_ERROR => "SLP_PARSE_ERROR",
            Self::INVALID_REGISTRATION => "SLP_INVALID_REGISTRATION",
            Self::SCOPE_NOT_SUPPORTED => "SLP_SCOPE_NOT_SUPPORTED",
            Self::AUTHENTICATION_ABSENT => "SLP_AUTHENTICATION_ABSENT",
            Self::AUTHENTICATION_FAILED => "SLP_AUTHENTICATION_FAILED",
            Self::INVALID_UPDATE => "SLP_INVALID_UPDATE",
            Self::REFRESH_REJECTED => "SLP_REFRESH_REJECTED",
            Self::NOT_IMPLEMENTED => "SLP_NOT_IMPLEMENTED",
            Self::BUFFER_OVERFLOW => "SLP_BUFFER_OVERFLOW",
            Self::NETWORK_TIMED_OUT => "SLP_NETWORK_TIMED_OUT",
            Self::NETWORK_INIT_FAILED => "SLP_NETWORK_INIT_FAILED",
            Self::MEMORY_ALLOC_FAILED => "SLP_MEMORY_ALLOC_FAILED",
            Self::PARAMETER_BAD => "SLP_PARAMETER_BAD",
            Self::NETWORK_ERROR => "SLP_NETWORK_ERROR",
            Self::INTERNAL_SYSTEM_ERROR => "SLP_INTERNAL_SYSTEM_ERROR",
            Self::HANDLE_IN_USE => "SLP_HANDLE_IN_USE",
            Self::TYPE_ERROR => "SLP_TYPE_ERROR",
            Self::RETRY_UNICAST => "SLP_RETRY_UNICAST",
            _ => "SLP_UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for SlpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

/// The library entry point a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlpCall {
    FindSrvs,
    FindSrvTypes,
    FindAttrs,
    AssociateIp,
    Reg,
    Dereg,
}

impl fmt::Display for SlpCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlpCall::FindSrvs => "SLPFindSrvs",
            SlpCall::FindSrvTypes => "SLPFindSrvTypes",
            SlpCall::FindAttrs => "SLPFindAttrs",
            SlpCall::AssociateIp => "SLPAssociateIP",
            SlpCall::Reg => "SLPReg",
            SlpCall::Dereg => "SLPDereg",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SlpError {
    #[error("Error opening slp handle: {0}")]
    Open(SlpStatus),

    #[error("{call} failed: {status}")]
    Call { call: SlpCall, status: SlpStatus },

    #[error("{call} callback reported {status}")]
    Callback { call: SlpCall, status: SlpStatus },

    #[error("Error parsing SrvURL {0:?}")]
    ParseUrl(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("OpenSLP library error: {0}")]
    Library(String),
}

/// One URL reported by a service request, with its lifetime in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredUrl {
    pub url: String,
    pub lifetime: u16,
}

/// An open SLP handle. Closed when dropped.
///
/// Every method blocks until the library has delivered all callbacks of the
/// request; callback payloads are returned in the order they arrived.
pub trait SlpSession {
    fn find_srvs(
        &mut self,
        service_type: &str,
        scopes: &str,
        filter: &str,
    ) -> Result<Vec<DiscoveredUrl>, SlpError>;

    fn find_srv_types(
        &mut self,
        naming_authority: &str,
        scopes: &str,
    ) -> Result<Vec<String>, SlpError>;

    fn find_attrs(
        &mut self,
        url_or_type: &str,
        scopes: &str,
        attr_ids: &str,
    ) -> Result<Vec<String>, SlpError>;

    /// Direct subsequent requests of this session at a single agent
    fn associate_ip(&mut self, ip: &str) -> Result<(), SlpError>;

    fn reg(&mut self, url: &str, lifetime: u16, attrs: &str, fresh: bool) -> Result<(), SlpError>;

    fn dereg(&mut self, url: &str) -> Result<(), SlpError>;
}

/// Something that can open SLP sessions in synchronous mode.
pub trait SlpLibrary {
    type Session<'a>: SlpSession
    where
        Self: 'a;

    fn open(&self, locale: &str) -> Result<Self::Session<'_>, SlpError>;
}
