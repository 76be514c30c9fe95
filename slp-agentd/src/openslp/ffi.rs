//! OpenSLP client library bound at runtime.
//!
//! The library is opened with `libloading` and its entry points are resolved
//! once. Each request passes a [`Collector`] as the callback cookie; the
//! callbacks below append to it while the library blocks inside the request.

use std::ffi::{c_char, c_int, c_uint, c_ushort, c_void, CStr, CString};
use std::path::Path;
use std::ptr;
use libloading::Library;
use super::{DiscoveredUrl, SlpCall, SlpError, SlpLibrary, SlpSession, SlpStatus};

type SlpHandle = *mut c_void;
type SlpBoolean = c_uint;
type SlpErrorCode = c_int;

const SLP_FALSE: SlpBoolean = 0;
const SLP_TRUE: SlpBoolean = 1;

type SrvUrlCallback = unsafe extern "C" fn(
    SlpHandle,
    *const c_char,
    c_ushort,
    SlpErrorCode,
    *mut c_void,
) -> SlpBoolean;
type SrvTypeCallback =
    unsafe extern "C" fn(SlpHandle, *const c_char, SlpErrorCode, *mut c_void) -> SlpBoolean;
type AttrCallback =
    unsafe extern "C" fn(SlpHandle, *const c_char, SlpErrorCode, *mut c_void) -> SlpBoolean;
type RegReport = unsafe extern "C" fn(SlpHandle, SlpErrorCode, *mut c_void);

type OpenFn = unsafe extern "C" fn(*const c_char, SlpBoolean, *mut SlpHandle) -> SlpErrorCode;
type CloseFn = unsafe extern "C" fn(SlpHandle);
type FindSrvsFn = unsafe extern "C" fn(
    SlpHandle,
    *const c_char,
    *const c_char,
    *const c_char,
    SrvUrlCallback,
    *mut c_void,
) -> SlpErrorCode;
type FindSrvTypesFn = unsafe extern "C" fn(
    SlpHandle,
    *const c_char,
    *const c_char,
    SrvTypeCallback,
    *mut c_void,
) -> SlpErrorCode;
type FindAttrsFn = unsafe extern "C" fn(
    SlpHandle,
    *const c_char,
    *const c_char,
    *const c_char,
    AttrCallback,
    *mut c_void,
) -> SlpErrorCode;
type RegFn = unsafe extern "C" fn(
    SlpHandle,
    *const c_char,
    c_ushort,
    *const c_char,
    *const c_char,
    SlpBoolean,
    RegReport,
    *mut c_void,
) -> SlpErrorCode;
type DeregFn =
    unsafe extern "C" fn(SlpHandle, *const c_char, RegReport, *mut c_void) -> SlpErrorCode;
type AssociateIpFn = unsafe extern "C" fn(SlpHandle, *const c_char) -> SlpErrorCode;

/// Callback results of one request
struct Collector<T> {
    items: Vec<T>,
    error: Option<SlpStatus>,
}

impl<T> Default for Collector<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            error: None,
        }
    }
}

impl<T> Collector<T> {
    fn record(&mut self, code: SlpErrorCode, item: impl FnOnce() -> T) {
        match SlpStatus(code) {
            SlpStatus::OK => {
                self.items.push(item());
                self.error = None;
            }
            SlpStatus::LAST_CALL => {}
            status => self.error = Some(status),
        }
    }

    fn finish(self, call: SlpCall, code: SlpErrorCode) -> Result<Vec<T>, SlpError> {
        check(call, code)?;
        match self.error {
            Some(status) => Err(SlpError::Callback { call, status }),
            None => Ok(self.items),
        }
    }
}

/// Owned copy of a C string handed to a callback
unsafe fn lossy(s: *const c_char) -> String {
    if s.is_null() {
        return String::new();
    }
    CStr::from_ptr(s).to_string_lossy().into_owned()
}

unsafe extern "C" fn srv_url_callback(
    _hslp: SlpHandle,
    srvurl: *const c_char,
    lifetime: c_ushort,
    errcode: SlpErrorCode,
    cookie: *mut c_void,
) -> SlpBoolean {
    let collector = &mut *(cookie as *mut Collector<DiscoveredUrl>);
    collector.record(errcode, || DiscoveredUrl {
        url: lossy(srvurl),
        lifetime,
    });
    SLP_TRUE
}

unsafe extern "C" fn list_callback(
    _hslp: SlpHandle,
    list: *const c_char,
    errcode: SlpErrorCode,
    cookie: *mut c_void,
) -> SlpBoolean {
    let collector = &mut *(cookie as *mut Collector<String>);
    collector.record(errcode, || lossy(list));
    SLP_TRUE
}

unsafe extern "C" fn reg_report(_hslp: SlpHandle, errcode: SlpErrorCode, cookie: *mut c_void) {
    *(cookie as *mut SlpErrorCode) = errcode;
}

fn check(call: SlpCall, code: SlpErrorCode) -> Result<(), SlpError> {
    let status = SlpStatus(code);
    if status.is_ok() {
        return Ok(());
    }
    Err(SlpError::Call { call, status })
}

fn cstring(s: &str) -> Result<CString, SlpError> {
    CString::new(s).map_err(|_| SlpError::InvalidArgument(format!("{:?} contains a NUL byte", s)))
}

/// `libslp` entry points. Holding the `Library` keeps the pointers valid.
pub struct OpenSlp {
    open: OpenFn,
    close: CloseFn,
    find_srvs: FindSrvsFn,
    find_srv_types: FindSrvTypesFn,
    find_attrs: FindAttrsFn,
    reg: RegFn,
    dereg: DeregFn,
    associate_ip: Option<AssociateIpFn>,
    _lib: Library,
}

impl OpenSlp {
    /// Load the OpenSLP client library, e.g. `libslp.so.1`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SlpError> {
        let path = path.as_ref();
        let lib_err = |e: libloading::Error| SlpError::Library(format!("{}: {}", path.display(), e));

        unsafe {
            let lib = Library::new(path).map_err(lib_err)?;
            let open = *lib.get::<OpenFn>(b"SLPOpen\0").map_err(lib_err)?;
            let close = *lib.get::<CloseFn>(b"SLPClose\0").map_err(lib_err)?;
            let find_srvs = *lib.get::<FindSrvsFn>(b"SLPFindSrvs\0").map_err(lib_err)?;
            let find_srv_types = *lib.get::<FindSrvTypesFn>(b"SLPFindSrvTypes\0").map_err(lib_err)?;
            let find_attrs = *lib.get::<FindAttrsFn>(b"SLPFindAttrs\0").map_err(lib_err)?;
            let reg = *lib.get::<RegFn>(b"SLPReg\0").map_err(lib_err)?;
            let dereg = *lib.get::<DeregFn>(b"SLPDereg\0").map_err(lib_err)?;
            // Older libslp releases lack unicast support
            let associate_ip = lib.get::<AssociateIpFn>(b"SLPAssociateIP\0").ok().map(|f| *f);

            tracing::debug!("Loaded OpenSLP from {}", path.display());

            Ok(Self {
                open,
                close,
                find_srvs,
                find_srv_types,
                find_attrs,
                reg,
                dereg,
                associate_ip,
                _lib: lib,
            })
        }
    }
}

impl SlpLibrary for OpenSlp {
    type Session<'a> = OpenSlpSession<'a>;

    fn open(&self, locale: &str) -> Result<OpenSlpSession<'_>, SlpError> {
        let lang = cstring(locale)?;
        let mut handle: SlpHandle = ptr::null_mut();
        let code = unsafe { (self.open)(lang.as_ptr(), SLP_FALSE, &mut handle) };
        match SlpStatus(code) {
            SlpStatus::OK => Ok(OpenSlpSession { lib: self, handle }),
            status => Err(SlpError::Open(status)),
        }
    }
}

pub struct OpenSlpSession<'a> {
    lib: &'a OpenSlp,
    handle: SlpHandle,
}

impl SlpSession for OpenSlpSession<'_> {
    fn find_srvs(
        &mut self,
        service_type: &str,
        scopes: &str,
        filter: &str,
    ) -> Result<Vec<DiscoveredUrl>, SlpError> {
        let (service_type, scopes, filter) = (cstring(service_type)?, cstring(scopes)?, cstring(filter)?);
        let mut collector = Collector::<DiscoveredUrl>::default();
        let code = unsafe {
            (self.lib.find_srvs)(
                self.handle,
                service_type.as_ptr(),
                scopes.as_ptr(),
                filter.as_ptr(),
                srv_url_callback,
                &mut collector as *mut _ as *mut c_void,
            )
        };
        collector.finish(SlpCall::FindSrvs, code)
    }

    fn find_srv_types(
        &mut self,
        naming_authority: &str,
        scopes: &str,
    ) -> Result<Vec<String>, SlpError> {
        let (authority, scopes) = (cstring(naming_authority)?, cstring(scopes)?);
        let mut collector = Collector::<String>::default();
        let code = unsafe {
            (self.lib.find_srv_types)(
                self.handle,
                authority.as_ptr(),
                scopes.as_ptr(),
                list_callback,
                &mut collector as *mut _ as *mut c_void,
            )
        };
        collector.finish(SlpCall::FindSrvTypes, code)
    }

    fn find_attrs(
        &mut self,
        url_or_type: &str,
        scopes: &str,
        attr_ids: &str,
    ) -> Result<Vec<String>, SlpError> {
        let (url_or_type, scopes, attr_ids) = (cstring(url_or_type)?, cstring(scopes)?, cstring(attr_ids)?);
        let mut collector = Collector::<String>::default();
        let code = unsafe {
            (self.lib.find_attrs)(
                self.handle,
                url_or_type.as_ptr(),
                scopes.as_ptr(),
                attr_ids.as_ptr(),
                list_callback,
                &mut collector as *mut _ as *mut c_void,
            )
        };
        collector.finish(SlpCall::FindAttrs, code)
    }

    fn associate_ip(&mut self, ip: &str) -> Result<(), SlpError> {
        let associate = self.lib.associate_ip.ok_or_else(|| SlpError::Call {
            call: SlpCall::AssociateIp,
            status: SlpStatus::NOT_IMPLEMENTED,
        })?;
        let ip = cstring(ip)?;
        let code = unsafe { associate(self.handle, ip.as_ptr()) };
        check(SlpCall::AssociateIp, code)
    }

    fn reg(&mut self, url: &str, lifetime: u16, attrs: &str, fresh: bool) -> Result<(), SlpError> {
        let (url, attrs, srv_type) = (cstring(url)?, cstring(attrs)?, cstring("")?);
        let mut callback_code: SlpErrorCode = SlpStatus::OK.0;
        let code = unsafe {
            (self.lib.reg)(
                self.handle,
                url.as_ptr(),
                lifetime,
                srv_type.as_ptr(),
                attrs.as_ptr(),
                if fresh { SLP_TRUE } else { SLP_FALSE },
                reg_report,
                &mut callback_code as *mut _ as *mut c_void,
            )
        };
        check(SlpCall::Reg, code)?;
        report(SlpCall::Reg, callback_code)
    }

    fn dereg(&mut self, url: &str) -> Result<(), SlpError> {
        let url = cstring(url)?;
        let mut callback_code: SlpErrorCode = SlpStatus::OK.0;
        let code = unsafe {
            (self.lib.dereg)(
                self.handle,
                url.as_ptr(),
                reg_report,
                &mut callback_code as *mut _ as *mut c_void,
            )
        };
        check(SlpCall::Dereg, code)?;
        report(SlpCall::Dereg, callback_code)
    }
}

fn report(call: SlpCall, code: SlpErrorCode) -> Result<(), SlpError> {
    let status = SlpStatus(code);
    if status.is_ok() {
        return Ok(());
    }
    Err(SlpError::Callback { call, status })
}

impl Drop for OpenSlpSession<'_> {
    fn drop(&mut self) {
        unsafe { (self.lib.close)(self.handle) };
    }
}
