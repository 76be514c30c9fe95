//! Scripted in-process stand-in for the OpenSLP library.

use std::sync::{Arc, Mutex};
use super::{DiscoveredUrl, SlpError, SlpLibrary, SlpSession, SlpStatus};

/// What the fake saw
#[derive(Debug, Clone, Default)]
pub struct Log {
    pub opened: usize,
    pub closed: usize,
    pub calls: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeSlp {
    open_error: Option<SlpStatus>,
    urls: Vec<DiscoveredUrl>,
    srv_types: Vec<String>,
    attrs: Vec<String>,
    failure: Option<SlpError>,
    log: Arc<Mutex<Log>>,
}

impl FakeSlp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_urls(mut self, urls: &[(&str, u16)]) -> Self {
        self.urls = urls
            .iter()
            .map(|(url, lifetime)| DiscoveredUrl {
                url: url.to_string(),
                lifetime: *lifetime,
            })
            .collect();
        self
    }

    /// Raw lists handed to the service-type callback, one per invocation
    pub fn with_srv_types(mut self, lists: &[&str]) -> Self {
        self.srv_types = lists.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Raw lists handed to the attribute callback, one per invocation
    pub fn with_attrs(mut self, lists: &[&str]) -> Self {
        self.attrs = lists.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Make every request on an open session fail
    pub fn failing(mut self, err: SlpError) -> Self {
        self.failure = Some(err);
        self
    }

    pub fn open_failing(mut self, status: SlpStatus) -> Self {
        self.open_error = Some(status);
        self
    }

    pub fn log(&self) -> Log {
        self.log.lock().unwrap().clone()
    }

    fn call(&self, entry: String) -> Result<(), SlpError> {
        self.log.lock().unwrap().calls.push(entry);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl SlpLibrary for FakeSlp {
    type Session<'a> = FakeSession<'a>;

    fn open(&self, locale: &str) -> Result<FakeSession<'_>, SlpError> {
        if let Some(status) = self.open_error {
            return Err(SlpError::Open(status));
        }
        let mut log = self.log.lock().unwrap();
        log.opened += 1;
        log.calls.push(format!("open {}", locale));
        Ok(FakeSession { slp: self })
    }
}

pub struct FakeSession<'a> {
    slp: &'a FakeSlp,
}

impl SlpSession for FakeSession<'_> {
    fn find_srvs(
        &mut self,
        service_type: &str,
        scopes: &str,
        filter: &str,
    ) -> Result<Vec<DiscoveredUrl>, SlpError> {
        self.slp.call(format!("findsrvs {}|{}|{}", service_type, scopes, filter))?;
        Ok(self.slp.urls.clone())
    }

    fn find_srv_types(
        &mut self,
        naming_authority: &str,
        scopes: &str,
    ) -> Result<Vec<String>, SlpError> {
        self.slp.call(format!("findsrvtypes {}|{}", naming_authority, scopes))?;
        Ok(self.slp.srv_types.clone())
    }

    fn find_attrs(
        &mut self,
        url_or_type: &str,
        scopes: &str,
        attr_ids: &str,
    ) -> Result<Vec<String>, SlpError> {
        self.slp.call(format!("findattrs {}|{}|{}", url_or_type, scopes, attr_ids))?;
        Ok(self.slp.attrs.clone())
    }

    fn associate_ip(&mut self, ip: &str) -> Result<(), SlpError> {
        self.slp.log.lock().unwrap().calls.push(format!("associate {}", ip));
        Ok(())
    }

    fn reg(&mut self, url: &str, lifetime: u16, attrs: &str, fresh: bool) -> Result<(), SlpError> {
        self.slp.call(format!("reg {}|{}|{}|{}", url, lifetime, attrs, fresh))
    }

    fn dereg(&mut self, url: &str) -> Result<(), SlpError> {
        self.slp.call(format!("dereg {}", url))
    }
}

impl Drop for FakeSession<'_> {
    fn drop(&mut self) {
        self.slp.log.lock().unwrap().closed += 1;
    }
}
