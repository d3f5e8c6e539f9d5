//! User preferences persisted between simulator sessions.
//!
//! The file is three lines: pilot id, download flag, notify flag, the
//! flags written as `1` or `0`. A missing or short file falls back to
//! defaults for whatever is absent.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::PrefsError;

/// Longest pilot id kept, in bytes.
pub const PILOT_ID_MAX: usize = 19;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefs {
    pub pilot_id: String,
    /// Save the linked FMS plan after a successful fetch.
    pub download_fms: bool,
    /// Tell ActiveSky about the saved plan. Only honoured with `download_fms`.
    pub notify_asxp: bool,
}

impl Prefs {
    pub fn new(pilot_id: &str, download_fms: bool, notify_asxp: bool) -> Self {
        Self {
            pilot_id: truncate_pilot_id(pilot_id),
            download_fms,
            notify_asxp: notify_asxp && download_fms,
        }
    }

    /// Load from `path`. A file that does not exist yields the defaults.
    pub fn load(path: &Path) -> Result<Self, PrefsError> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(Self::parse(&raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no preferences file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(PrefsError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn parse(raw: &str) -> Self {
        let mut lines = raw.lines();
        let pilot_id = lines.next().unwrap_or_default().trim_end_matches('\r');
        let download_fms = lines.next().map(parse_flag).unwrap_or(false);
        let notify_asxp = lines.next().map(parse_flag).unwrap_or(false);
        Self::new(pilot_id, download_fms, notify_asxp)
    }

    pub fn save(&self, path: &Path) -> Result<(), PrefsError> {
        fs::write(path, self.serialize()).map_err(|source| PrefsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn serialize(&self) -> String {
        format!(
            "{}\n{}\n{}\n",
            self.pilot_id,
            flag(self.download_fms),
            flag(self.notify_asxp && self.download_fms)
        )
    }
}

fn parse_flag(line: &str) -> bool {
    line.starts_with('1')
}

fn flag(on: bool) -> char {
    if on {
        '1'
    } else {
        '0'
    }
}

/// Cut to `PILOT_ID_MAX` bytes on a character boundary.
pub fn truncate_pilot_id(raw: &str) -> String {
    let mut cut = raw.len().min(PILOT_ID_MAX);
    while !raw.is_char_boundary(cut) {
        cut -= 1;
    }
    raw[..cut].to_string()
}
