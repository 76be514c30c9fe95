/// Name the agent is registered under with the host
pub const COMPONENT_NAME: &str = "ag_slp";

/// Term accepted by `otherCommand` to initialize the agent
pub const INIT_TERM: &str = "SlpAgent";

/// Trailing path components selecting a Read operation
pub const CMD_FIND_SERVICES: &str = "findsrvs";
pub const CMD_FIND_ATTRIBUTES: &str = "findattrs";
pub const CMD_UNICAST_FIND_ATTRIBUTES: &str = "unicastfindattrs";
pub const CMD_FIND_SERVICE_TYPES: &str = "findsrvtypes";

/// Trailing path components selecting an Execute operation
pub const CMD_REGISTER: &str = "reg";
pub const CMD_DEREGISTER: &str = "dereg";

/// Option map keys understood by Read
pub const OPT_SEARCH_FILTER: &str = "pcSearchFilter";
pub const OPT_SERVICE_TYPE: &str = "pcServiceType";
pub const OPT_URL_OR_SERVICE_TYPE: &str = "pcURLOrServiceType";
pub const OPT_SCOPE_LIST: &str = "pcScopeList";
pub const OPT_ATTR_IDS: &str = "pcAttrIds";
pub const OPT_NAMING_AUTHORITY: &str = "pcNamingAuthority";
pub const OPT_IP_ADDRESS: &str = "ip-address";

/// Keys of a discovered service record
pub const REC_SRVURL: &str = "srvurl";
pub const REC_SRV_TYPE: &str = "pcSrvType";
pub const REC_HOST: &str = "pcHost";
pub const REC_PORT: &str = "pcPort";
pub const REC_FAMILY: &str = "pcFamily";
pub const REC_SRV_PART: &str = "pcSrvPart";
pub const REC_LIFETIME: &str = "lifetime";

/// API path prefix
pub const API_PREFIX: &str = "/v1";
