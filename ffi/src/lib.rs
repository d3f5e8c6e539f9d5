//! C-ABI wrapper around `ofp-core` for the simulator plugin shim.
//!
//! # Overview
//! The simulator loads a small C plugin that owns menus, widgets and the
//! flight loop. It calls into this library for everything else: the HTTP
//! fetch, OFP parsing, the fetch/download/notify cycle, preferences and the
//! cockpit uplink trigger.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Stateful pieces are opaque handles (`FfiSession`, `FfiUplinkTrigger`)
//!   created by `*_new` and released by the matching `*_free`.
//! - Results the C side keeps are written into caller-owned fixed-width
//!   structs; heap values handed out (buffers, strings) have a matching
//!   `ofp_free_*` function.

pub mod types;

use std::ffi::{CStr, CString};
use std::io::Write;
use std::os::raw::c_char;
use std::panic::catch_unwind;
use std::path::{Path, PathBuf};

use ofp_core::http::download_to_file;
use ofp_core::{Config, Fetch, HttpTransport, OfpInfo, Prefs, Session};
use tracing::warn;

use types::*;

/// Borrow a C string as `&str`. Null or non-UTF-8 yields `None`.
fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Text handed to C, with any interior NUL bytes dropped.
fn c_string_lossy(text: &[u8]) -> CString {
    let bytes: Vec<u8> = text.iter().copied().filter(|&b| b != 0).collect();
    CString::new(bytes).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Host log sink, e.g. a wrapper around the simulator's debug string call.
pub type OfpLogCallback = extern "C" fn(line: *const c_char);

/// Forwards each formatted tracing event to the host callback.
struct HostLog {
    callback: OfpLogCallback,
}

impl Write for HostLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let line = c_string_lossy(buf);
        (self.callback)(line.as_ptr());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route log output to `callback`. Returns false if `callback` is null or
/// logging was already initialised.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_log_init(callback: Option<OfpLogCallback>) -> bool {
    catch_unwind(|| {
        let Some(callback) = callback else {
            return false;
        };
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .with_writer(move || HostLog { callback })
            .try_init()
            .is_ok()
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// GET `url` with a timeout in seconds (0 = default).
///
/// With `file_path` set, the body is written to that file (created or
/// truncated; removed again on failure) and `out_buf`/`out_len` are ignored.
/// Otherwise the body is returned in `*out_buf` as a NUL-terminated buffer of
/// `*out_len` bytes (not counting the NUL), to be released with
/// `ofp_free_buffer`. On failure `*out_buf` is set to null.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_http_get(
    url: *const c_char,
    file_path: *const c_char,
    timeout_secs: u32,
    out_buf: *mut *mut c_char,
    out_len: *mut usize,
) -> bool {
    catch_unwind(|| {
        if !out_buf.is_null() {
            unsafe { *out_buf = std::ptr::null_mut() };
        }
        let Some(url) = c_str(url) else {
            return false;
        };
        let transport = HttpTransport::new();

        if let Some(path) = c_str(file_path) {
            return match download_to_file(&transport, url, Path::new(path), u64::from(timeout_secs)) {
                Ok(_) => true,
                Err(e) => {
                    warn!(url, error = %e, "download failed");
                    false
                }
            };
        }

        if out_buf.is_null() {
            return false;
        }
        match transport.fetch_to_vec(url, u64::from(timeout_secs)) {
            Ok(mut body) => {
                let len = body.len();
                body.push(0);
                let raw = Box::into_raw(body.into_boxed_slice()) as *mut c_char;
                unsafe {
                    *out_buf = raw;
                    if !out_len.is_null() {
                        *out_len = len;
                    }
                }
                true
            }
            Err(e) => {
                warn!(url, error = %e, "fetch failed");
                false
            }
        }
    })
    .unwrap_or(false)
}

/// Free a buffer returned by `ofp_http_get`. `len` is the length reported
/// in `out_len`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_free_buffer(buf: *mut c_char, len: usize) {
    if buf.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let slice = std::ptr::slice_from_raw_parts_mut(buf as *mut u8, len + 1);
        drop(unsafe { Box::from_raw(slice) });
    });
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Parse `len` bytes of a dispatch document into `out`. Every field of
/// `out` is overwritten; `valid` is always false.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_extract(
    document: *const c_char,
    len: usize,
    out: *mut FfiOfpInfo,
) -> FfiStatus {
    catch_unwind(|| {
        if out.is_null() || (document.is_null() && len > 0) {
            return FfiStatus::NullArg;
        }
        let bytes: &[u8] = if len == 0 {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(document as *const u8, len) }
        };
        let info = OfpInfo::from_document(bytes);
        unsafe { &mut *out }.fill(&info);
        FfiStatus::Ok
    })
    .unwrap_or(FfiStatus::Panic)
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// Create a session. `config_path` (JSON) and `fms_dir` are optional; a
/// null `config_path` uses the built-in endpoints.
///
/// Returns null if the config file cannot be loaded.
/// The caller must free the returned pointer with `ofp_session_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_session_new(
    config_path: *const c_char,
    fms_dir: *const c_char,
) -> *mut FfiSession {
    catch_unwind(|| {
        let mut config = match c_str(config_path) {
            Some(path) => match Config::load(Path::new(path)) {
                Ok(config) => config,
                Err(e) => {
                    warn!(error = %e, "cannot load config");
                    return std::ptr::null_mut();
                }
            },
            None => Config::default(),
        };
        if let Some(dir) = c_str(fms_dir) {
            config.fms_dir = PathBuf::from(dir);
        }
        let session = Session::new(config, Prefs::default());
        Box::into_raw(Box::new(FfiSession { inner: session }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a session created by `ofp_session_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_session_free(session: *mut FfiSession) {
    if !session.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(session) });
        });
    }
}

/// Replace the session preferences.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_session_set_prefs(
    session: *mut FfiSession,
    prefs: *const FfiPrefs,
) -> FfiStatus {
    catch_unwind(|| {
        if session.is_null() || prefs.is_null() {
            return FfiStatus::NullArg;
        }
        let session = unsafe { &mut *session };
        let prefs = unsafe { &*prefs };
        session.inner.set_prefs(prefs.to_core());
        FfiStatus::Ok
    })
    .unwrap_or(FfiStatus::Panic)
}

/// Run one fetch cycle (OFP, then FMS download and ActiveSky notification
/// as the preferences say). `out` is optional and receives the record,
/// with `valid` set only on `Ok`.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_session_fetch(session: *mut FfiSession, out: *mut FfiOfpInfo) -> FfiStatus {
    catch_unwind(|| {
        if session.is_null() {
            return FfiStatus::NullArg;
        }
        let session = unsafe { &mut *session };
        let status = match session.inner.fetch_ofp() {
            Ok(_) => FfiStatus::Ok,
            Err(e) => FfiStatus::from(&e),
        };
        if !out.is_null() {
            unsafe { &mut *out }.fill(session.inner.ofp());
        }
        status
    })
    .unwrap_or(FfiStatus::Panic)
}

/// User-facing status line `idx` (0 = summary, 1 = FMS, 2 = ActiveSky) of
/// the last cycle. Returns null for other indices.
/// The caller must free the returned string with `ofp_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_session_status_line(session: *const FfiSession, idx: u32) -> *mut c_char {
    catch_unwind(|| {
        if session.is_null() {
            return std::ptr::null_mut();
        }
        let session = unsafe { &*session };
        match session.inner.status().get(idx as usize) {
            Some(line) => c_string_lossy(line.as_bytes()).into_raw(),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// Load preferences from `path` into `out`. A missing file yields defaults.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_prefs_load(path: *const c_char, out: *mut FfiPrefs) -> FfiStatus {
    catch_unwind(|| {
        let Some(path) = c_str(path) else {
            return FfiStatus::NullArg;
        };
        if out.is_null() {
            return FfiStatus::NullArg;
        }
        match Prefs::load(Path::new(path)) {
            Ok(prefs) => {
                unsafe { &mut *out }.fill(&prefs);
                FfiStatus::Ok
            }
            Err(e) => {
                warn!(error = %e, "cannot load preferences");
                FfiStatus::from(&e)
            }
        }
    })
    .unwrap_or(FfiStatus::Panic)
}

/// Write `prefs` to `path`.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_prefs_save(path: *const c_char, prefs: *const FfiPrefs) -> FfiStatus {
    catch_unwind(|| {
        let Some(path) = c_str(path) else {
            return FfiStatus::NullArg;
        };
        if prefs.is_null() {
            return FfiStatus::NullArg;
        }
        let prefs = unsafe { &*prefs }.to_core();
        match prefs.save(Path::new(path)) {
            Ok(()) => FfiStatus::Ok,
            Err(e) => {
                warn!(error = %e, "cannot save preferences");
                FfiStatus::from(&e)
            }
        }
    })
    .unwrap_or(FfiStatus::Panic)
}

// ---------------------------------------------------------------------------
// Aircraft and uplink trigger
// ---------------------------------------------------------------------------

/// True for a ToLiss A319/A321/A340 file name under a simulator root that
/// has the ToLiss data directory.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_is_toliss(acf_file: *const c_char, system_dir: *const c_char) -> bool {
    catch_unwind(|| {
        let (Some(acf_file), Some(system_dir)) = (c_str(acf_file), c_str(system_dir)) else {
            return false;
        };
        ofp_core::aircraft::ToLissModel::detect(acf_file).is_some()
            && ofp_core::aircraft::is_toliss_install(Path::new(system_dir))
    })
    .unwrap_or(false)
}

/// Create an uplink trigger. Free with `ofp_uplink_trigger_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_uplink_trigger_new() -> *mut FfiUplinkTrigger {
    Box::into_raw(Box::new(FfiUplinkTrigger {
        inner: ofp_core::UplinkTrigger::new(),
    }))
}

/// Free a trigger created by `ofp_uplink_trigger_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_uplink_trigger_free(trigger: *mut FfiUplinkTrigger) {
    if !trigger.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(trigger) });
        });
    }
}

/// Feed the current scratchpad bytes of both MCDUs. Pass null for a
/// scratchpad whose data is not available yet.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_uplink_trigger_poll(
    trigger: *mut FfiUplinkTrigger,
    mcdu1: *const c_char,
    mcdu1_len: usize,
    mcdu2: *const c_char,
    mcdu2_len: usize,
) -> FfiTriggerPoll {
    let done = FfiTriggerPoll {
        action: FfiTriggerAction::Done,
        delay_secs: 0.0,
    };
    catch_unwind(|| {
        if trigger.is_null() {
            return done;
        }
        let trigger = unsafe { &mut *trigger };
        let pad = |ptr: *const c_char, len: usize| {
            (!ptr.is_null()).then(|| unsafe { std::slice::from_raw_parts(ptr as *const u8, len) })
        };
        trigger.inner.poll(pad(mcdu1, mcdu1_len), pad(mcdu2, mcdu2_len)).into()
    })
    .unwrap_or(done)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a string returned by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ofp_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}
