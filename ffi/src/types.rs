//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! The plugin shim is C and keeps the OFP record in fixed-size char arrays,
//! so `FfiOfpInfo` mirrors `OfpInfo` with the same field widths. Copies into
//! these arrays are bounded to `width - 1` bytes and always NUL-terminated.
//! Conversion helpers live here to keep `lib.rs` focused on the
//! `extern "C"` surface.

use std::os::raw::c_char;

use ofp_core::error::{PrefsError, SessionError};
use ofp_core::{OfpInfo, Prefs, TriggerPoll};

pub const OFP_STATUS_LEN: usize = 100;
pub const OFP_TIME_GENERATED_LEN: usize = 20;
pub const OFP_AIRPORT_LEN: usize = 10;
pub const OFP_PATH_LEN: usize = 200;
pub const OFP_LINK_LEN: usize = 200;
pub const OFP_PILOT_ID_LEN: usize = 20;

// cbindgen cannot follow the core constants, so the widths are repeated here.
const _: () = assert!(OFP_STATUS_LEN == ofp_core::types::STATUS_LEN);
const _: () = assert!(OFP_TIME_GENERATED_LEN == ofp_core::types::TIME_GENERATED_LEN);
const _: () = assert!(OFP_AIRPORT_LEN == ofp_core::types::AIRPORT_LEN);
const _: () = assert!(OFP_PATH_LEN == ofp_core::types::PATH_LEN);
const _: () = assert!(OFP_LINK_LEN == ofp_core::types::LINK_LEN);
const _: () = assert!(OFP_PILOT_ID_LEN == ofp_core::prefs::PILOT_ID_MAX + 1);

/// Opaque handle to a `Session`. C callers receive a pointer to this and
/// pass it back into every `ofp_session_*` function.
pub struct FfiSession {
    pub(crate) inner: ofp_core::Session,
}

/// Opaque handle to an `UplinkTrigger`.
pub struct FfiUplinkTrigger {
    pub(crate) inner: ofp_core::UplinkTrigger,
}

/// Outcome code shared by every fallible entry point.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiStatus {
    Ok = 0,
    /// Dispatch service unreachable, timed out or answered non-2xx.
    Unreachable = 1,
    /// Service answered with a status other than the success token.
    Rejected = 2,
    NoPilotId = 3,
    NullArg = 4,
    Io = 5,
    Panic = 6,
}

impl From<&SessionError> for FfiStatus {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::NoPilotId => FfiStatus::NoPilotId,
            SessionError::Unreachable(_) => FfiStatus::Unreachable,
            SessionError::Rejected { .. } => FfiStatus::Rejected,
        }
    }
}

impl From<&PrefsError> for FfiStatus {
    fn from(_: &PrefsError) -> Self {
        FfiStatus::Io
    }
}

/// Parsed OFP record with C string fields.
#[repr(C)]
pub struct FfiOfpInfo {
    pub status: [c_char; OFP_STATUS_LEN],
    pub time_generated: [c_char; OFP_TIME_GENERATED_LEN],
    pub origin: [c_char; OFP_AIRPORT_LEN],
    pub destination: [c_char; OFP_AIRPORT_LEN],
    pub sb_path: [c_char; OFP_PATH_LEN],
    pub sb_fms_link: [c_char; OFP_LINK_LEN],
    pub valid: bool,
}

impl FfiOfpInfo {
    /// Overwrite every field from `info`.
    pub(crate) fn fill(&mut self, info: &OfpInfo) {
        write_fixed(&mut self.status, &info.status);
        write_fixed(&mut self.time_generated, &info.time_generated);
        write_fixed(&mut self.origin, &info.origin);
        write_fixed(&mut self.destination, &info.destination);
        write_fixed(&mut self.sb_path, &info.sb_path);
        write_fixed(&mut self.sb_fms_link, &info.sb_fms_link);
        self.valid = info.valid;
    }
}

/// User preferences with a fixed-width pilot id.
#[repr(C)]
pub struct FfiPrefs {
    pub pilot_id: [c_char; OFP_PILOT_ID_LEN],
    pub download_fms: bool,
    pub notify_asxp: bool,
}

impl FfiPrefs {
    pub(crate) fn fill(&mut self, prefs: &Prefs) {
        write_fixed(&mut self.pilot_id, &prefs.pilot_id);
        self.download_fms = prefs.download_fms;
        self.notify_asxp = prefs.notify_asxp;
    }

    pub(crate) fn to_core(&self) -> Prefs {
        Prefs::new(&read_fixed(&self.pilot_id), self.download_fms, self.notify_asxp)
    }
}

/// What the host's flight loop should do next.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiTriggerAction {
    /// Poll again after `delay_secs`.
    Again = 0,
    /// Fetch the OFP now; do not poll again.
    Fire = 1,
    /// Already fired; unschedule the loop.
    Done = 2,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiTriggerPoll {
    pub action: FfiTriggerAction,
    pub delay_secs: f32,
}

impl From<TriggerPoll> for FfiTriggerPoll {
    fn from(poll: TriggerPoll) -> Self {
        match poll {
            TriggerPoll::Again(delay) => FfiTriggerPoll {
                action: FfiTriggerAction::Again,
                delay_secs: delay.as_secs_f32(),
            },
            TriggerPoll::Fire => FfiTriggerPoll {
                action: FfiTriggerAction::Fire,
                delay_secs: 0.0,
            },
            TriggerPoll::Done => FfiTriggerPoll {
                action: FfiTriggerAction::Done,
                delay_secs: 0.0,
            },
        }
    }
}

/// Copy `src` into `dst`, keeping at most `N - 1` bytes and zero-filling
/// the rest so the array is always NUL-terminated.
pub(crate) fn write_fixed<const N: usize>(dst: &mut [c_char; N], src: &str) {
    dst.fill(0);
    let bytes = src.as_bytes();
    let n = bytes.len().min(N.saturating_sub(1));
    for (d, s) in dst.iter_mut().zip(&bytes[..n]) {
        *d = *s as c_char;
    }
}

/// Read a fixed-width C string up to its first NUL (or the array end).
pub(crate) fn read_fixed(src: &[c_char]) -> String {
    let bytes: Vec<u8> = src
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}
