//! The SCR agent: generic Read/Write/Execute/Dir requests in, OpenSLP calls out.

pub mod ops;

use shared::path::ScrPath;
use shared::protocol::{
    CMD_DEREGISTER, CMD_FIND_ATTRIBUTES, CMD_FIND_SERVICES, CMD_FIND_SERVICE_TYPES, CMD_REGISTER,
    CMD_UNICAST_FIND_ATTRIBUTES, INIT_TERM, OPT_ATTR_IDS, OPT_IP_ADDRESS, OPT_NAMING_AUTHORITY,
    OPT_SCOPE_LIST, OPT_SEARCH_FILTER, OPT_SERVICE_TYPE, OPT_URL_OR_SERVICE_TYPE,
};
use shared::value::{Term, Value};
use crate::config::AgentConfig;
use crate::openslp::{SlpError, SlpLibrary};

/// The generic configuration-access protocol spoken by the host.
///
/// Failures never cross this boundary as errors: they are logged and turned
/// into `false`, an empty list or `nil`.
pub trait ScrAgent {
    fn read(&mut self, path: &ScrPath, arg: &Value) -> Value;
    fn write(&mut self, path: &ScrPath, value: &Value, arg: &Value) -> Value;
    fn execute(&mut self, path: &ScrPath, value: &Value, arg: &Value) -> Value;
    fn dir(&mut self, path: &ScrPath) -> Value;
    fn other_command(&mut self, term: &Term) -> Value;
}

/// Operation selected by the trailing path component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    FindServices,
    FindAttributes,
    UnicastFindAttributes,
    FindServiceTypes,
    Register,
    Deregister,
}

impl Command {
    pub fn from_path(path: &ScrPath) -> Option<Self> {
        match path.last()? {
            CMD_FIND_SERVICES => Some(Command::FindServices),
            CMD_FIND_ATTRIBUTES => Some(Command::FindAttributes),
            CMD_UNICAST_FIND_ATTRIBUTES => Some(Command::UnicastFindAttributes),
            CMD_FIND_SERVICE_TYPES => Some(Command::FindServiceTypes),
            CMD_REGISTER => Some(Command::Register),
            CMD_DEREGISTER => Some(Command::Deregister),
            _ => None,
        }
    }
}

/// String parameters of a Read request; absent keys read as ""
#[derive(Debug, Default, PartialEq, Eq)]
struct ReadOptions<'a> {
    search_filter: &'a str,
    service_type: &'a str,
    url_or_service_type: &'a str,
    scope_list: &'a str,
    attr_ids: &'a str,
    naming_authority: &'a str,
    ip_address: &'a str,
}

impl<'a> ReadOptions<'a> {
    fn from_value(arg: &'a Value) -> Self {
        let mut options = Self::default();
        let Some(map) = arg.as_map() else {
            if !arg.is_null() {
                tracing::warn!("Read options must be a map, got {}", arg);
            }
            return options;
        };

        for (key, value) in map {
            let Some(key) = key.as_str() else {
                tracing::error!("Invalid key {}, must be a string", key);
                continue;
            };
            let Some(value) = value.as_str() else {
                continue;
            };
            match key {
                OPT_SEARCH_FILTER => options.search_filter = value,
                OPT_SERVICE_TYPE => options.service_type = value,
                OPT_URL_OR_SERVICE_TYPE => options.url_or_service_type = value,
                OPT_SCOPE_LIST => options.scope_list = value,
                OPT_ATTR_IDS => options.attr_ids = value,
                OPT_NAMING_AUTHORITY => options.naming_authority = value,
                OPT_IP_ADDRESS => options.ip_address = value,
                _ => {}
            }
        }
        options
    }
}

pub struct SlpAgent<L> {
    lib: L,
    config: AgentConfig,
}

impl<L: SlpLibrary> SlpAgent<L> {
    pub fn new(lib: L, config: AgentConfig) -> Self {
        Self { lib, config }
    }

    #[cfg(test)]
    pub fn library(&self) -> &L {
        &self.lib
    }

    fn find_services(&self, opts: &ReadOptions<'_>) -> Result<Vec<Value>, SlpError> {
        tracing::debug!("pcServiceType: {}", opts.service_type);
        let records = ops::find_services(
            &self.lib,
            &self.config.locale,
            opts.service_type,
            opts.scope_list,
            opts.search_filter,
        )?;
        Ok(records.into_iter().map(Value::from).collect())
    }

    fn find_attributes(&self, opts: &ReadOptions<'_>) -> Result<Vec<Value>, SlpError> {
        tracing::debug!("pcURLOrServiceType: {}", opts.url_or_service_type);
        let attrs = ops::find_attributes(
            &self.lib,
            &self.config.locale,
            opts.url_or_service_type,
            opts.scope_list,
            opts.attr_ids,
        )?;
        Ok(attrs.into_iter().map(Value::from).collect())
    }

    fn unicast_find_attributes(&self, opts: &ReadOptions<'_>) -> Result<Vec<Value>, SlpError> {
        tracing::debug!(
            "pcURLOrServiceType: {} at {}",
            opts.url_or_service_type,
            opts.ip_address
        );
        let attrs = ops::unicast_find_attributes(
            &self.lib,
            &self.config.locale,
            opts.url_or_service_type,
            opts.scope_list,
            opts.attr_ids,
            opts.ip_address,
        )?;
        Ok(attrs.into_iter().map(Value::from).collect())
    }

    fn find_service_types(&self, opts: &ReadOptions<'_>) -> Result<Vec<Value>, SlpError> {
        tracing::debug!("pcNamingAuthority: {}", opts.naming_authority);
        let types = ops::find_service_types(
            &self.lib,
            &self.config.locale,
            opts.naming_authority,
            opts.scope_list,
        )?;
        Ok(types.into_iter().map(Value::from).collect())
    }
}

impl<L: SlpLibrary> ScrAgent for SlpAgent<L> {
    fn read(&mut self, path: &ScrPath, arg: &Value) -> Value {
        let query: fn(&Self, &ReadOptions<'_>) -> Result<Vec<Value>, SlpError> =
            match Command::from_path(path) {
                Some(Command::FindServices) => Self::find_services,
                Some(Command::FindAttributes) => Self::find_attributes,
                Some(Command::UnicastFindAttributes) => Self::unicast_find_attributes,
                Some(Command::FindServiceTypes) => Self::find_service_types,
                Some(Command::Register | Command::Deregister) | None => {
                    tracing::error!("Wrong path '{}' in Read().", path);
                    return Value::List(Vec::new());
                }
            };

        let opts = ReadOptions::from_value(arg);
        match query(self, &opts) {
            Ok(items) => Value::List(items),
            Err(e) => {
                tracing::error!("Read {} failed: {}", path, e);
                Value::List(Vec::new())
            }
        }
    }

    fn write(&mut self, path: &ScrPath, _value: &Value, _arg: &Value) -> Value {
        tracing::error!("Wrong path '{}' in Write().", path);
        Value::Boolean(false)
    }

    fn execute(&mut self, path: &ScrPath, value: &Value, _arg: &Value) -> Value {
        let command = match Command::from_path(path) {
            Some(command @ (Command::Register | Command::Deregister)) => command,
            _ => {
                tracing::error!("Wrong path '{}' in Execute().", path);
                return Value::Boolean(false);
            }
        };

        let Some(srvurl) = value.as_str() else {
            tracing::error!("{} expects a service URL string, got {}", path, value);
            return Value::Boolean(false);
        };

        let locale = &self.config.locale;
        let result = if command == Command::Register {
            tracing::info!("Registering     = {}", srvurl);
            ops::register(
                &self.lib,
                locale,
                srvurl,
                self.config.reg_lifetime,
                &self.config.reg_attributes,
            )
        } else {
            tracing::debug!("De-Registering     = {}", srvurl);
            ops::deregister(&self.lib, locale, srvurl)
                .inspect(|()| tracing::info!("Deregistered    = {}", srvurl))
        };

        match result {
            Ok(()) => Value::Boolean(true),
            Err(e) => {
                tracing::error!("Error {} service with slp: {}", verb(command), e);
                Value::Boolean(false)
            }
        }
    }

    fn dir(&mut self, path: &ScrPath) -> Value {
        tracing::error!("Wrong path '{}' in Dir().", path);
        Value::Null
    }

    fn other_command(&mut self, term: &Term) -> Value {
        if term.name == INIT_TERM {
            return Value::Void;
        }
        tracing::error!("Unrecognized operation {}", term.name);
        Value::Null
    }
}

fn verb(command: Command) -> &'static str {
    match command {
        Command::Register => "registering",
        _ => "deregistering",
    }
}
