//! The parsed OFP record.
//!
//! # Design
//! `OfpInfo` is a flat set of bounded text fields filled by the tag scanner
//! in `extract`. It is rebuilt from scratch for every fetch; nothing is
//! merged across fetches, so a failed fetch can never show stale data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::extract::{extract_fields, FieldSpec};

pub const STATUS_LEN: usize = 100;
pub const TIME_GENERATED_LEN: usize = 20;
pub const AIRPORT_LEN: usize = 10;
pub const PATH_LEN: usize = 200;
pub const LINK_LEN: usize = 200;

/// Fields of interest in a SimBrief XML fetcher response.
pub const OFP_FIELDS: [FieldSpec<OfpInfo>; 6] = [
    FieldSpec::<OfpInfo>::leaf("status", STATUS_LEN, |r| &mut r.status),
    FieldSpec::<OfpInfo>::leaf("time_generated", TIME_GENERATED_LEN, |r| &mut r.time_generated),
    FieldSpec::<OfpInfo>::nested("origin", "icao_code", AIRPORT_LEN, |r| &mut r.origin),
    FieldSpec::<OfpInfo>::nested("destination", "icao_code", AIRPORT_LEN, |r| &mut r.destination),
    FieldSpec::<OfpInfo>::nested("fms_downloads", "directory", PATH_LEN, |r| &mut r.sb_path),
    FieldSpec::<OfpInfo>::nested("xpe", "link", LINK_LEN, |r| &mut r.sb_fms_link),
];

/// Parsed OFP summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfpInfo {
    /// Status text from the service, `"Success"` when the OFP exists.
    pub status: String,
    /// Generation time as decimal epoch seconds, kept textual.
    pub time_generated: String,
    pub origin: String,
    pub destination: String,
    /// Base URL of the flight plan download directory.
    pub sb_path: String,
    /// Flight plan file name, relative to `sb_path`.
    pub sb_fms_link: String,
    /// Set by the session once `status` matched the success token.
    pub valid: bool,
}

impl OfpInfo {
    /// Parse a fetcher response. `valid` is always false here.
    pub fn from_document(document: &[u8]) -> Self {
        let mut info = OfpInfo::default();
        extract_fields(document, &OFP_FIELDS, &mut info);
        info
    }

    /// True when the service status equals `token`.
    pub fn status_is(&self, token: &str) -> bool {
        !self.status.is_empty() && self.status == token
    }

    /// Absolute flight plan URL: the base path followed by the link.
    pub fn download_url(&self) -> String {
        format!("{}{}", self.sb_path, self.sb_fms_link)
    }

    /// Stem used for the saved plan, e.g. `KJFKKBOS19`. `None` unless both
    /// airports are plain 3 or 4 character alphanumeric codes.
    pub fn fms_stem(&self) -> Option<String> {
        (is_airport_code(&self.origin) && is_airport_code(&self.destination))
            .then(|| format!("{}{}19", self.origin, self.destination))
    }

    /// `fms_stem` with the `.fms` extension.
    pub fn fms_file_name(&self) -> Option<String> {
        self.fms_stem().map(|stem| format!("{stem}.fms"))
    }

    /// `time_generated` as a UTC timestamp, if it parses.
    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        let secs: f64 = self.time_generated.trim().parse().ok()?;
        if !secs.is_finite() {
            return None;
        }
        DateTime::from_timestamp(secs.trunc() as i64, 0)
    }

    /// `OFP generated at 2023-07-21 14:05:00 UTC`.
    pub fn generated_line(&self) -> Option<String> {
        self.generated_at()
            .map(|t| format!("OFP generated at {} UTC", t.format("%Y-%m-%d %H:%M:%S")))
    }

    /// Log every field at info level.
    pub fn dump(&self) {
        info!(
            status = %self.status,
            time_generated = %self.time_generated,
            origin = %self.origin,
            destination = %self.destination,
            sb_path = %self.sb_path,
            sb_fms_link = %self.sb_fms_link,
            valid = self.valid,
            "ofp info"
        );
    }
}

fn is_airport_code(code: &str) -> bool {
    (3..=4).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_alphanumeric())
}
