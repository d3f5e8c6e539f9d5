//! One fetch-and-parse cycle and what follows it.
//!
//! # Design
//! `Session` owns everything the host used to keep in globals: config,
//! preferences, the last `OfpInfo` and the status lines shown to the user.
//! The transport and the extractor stay stateless; the session is the only
//! place state lives, and the host owns the session.
//!
//! A cycle is: GET the OFP document, parse it, check the status token, then
//! optionally save the FMS plan and optionally notify ActiveSky. The two
//! follow-up steps only add status lines; they never change the outcome of
//! the OFP fetch itself.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::SessionError;
use crate::http::{download_to_file, Fetch, HttpTransport};
use crate::prefs::Prefs;
use crate::types::OfpInfo;

/// Shown when the dispatch service cannot be reached.
pub const UNREACHABLE_TEXT: &str = "could not reach service";

const FMS_FAILED_TEXT: &str = "Could not download FMS plan";

/// What happened after a successful OFP fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Where the FMS plan was saved, if it was.
    pub fms_path: Option<PathBuf>,
    /// `Some(ok)` if ActiveSky was notified, `None` if not attempted.
    pub notified: Option<bool>,
}

/// Up to three user-facing lines describing the last cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLines {
    pub summary: String,
    pub fms: String,
    pub notify: String,
}

impl StatusLines {
    pub fn get(&self, idx: usize) -> Option<&str> {
        match idx {
            0 => Some(&self.summary),
            1 => Some(&self.fms),
            2 => Some(&self.notify),
            _ => None,
        }
    }
}

pub struct Session<F: Fetch = HttpTransport> {
    config: Config,
    prefs: Prefs,
    transport: F,
    ofp: OfpInfo,
    status: StatusLines,
}

impl Session<HttpTransport> {
    pub fn new(config: Config, prefs: Prefs) -> Self {
        Self::with_transport(config, prefs, HttpTransport::new())
    }
}

impl<F: Fetch> Session<F> {
    pub fn with_transport(config: Config, prefs: Prefs, transport: F) -> Self {
        Self {
            config,
            prefs,
            transport,
            ofp: OfpInfo::default(),
            status: StatusLines::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn prefs(&self) -> &Prefs {
        &self.prefs
    }

    pub fn set_prefs(&mut self, prefs: Prefs) {
        self.prefs = prefs;
    }

    /// Result of the last cycle. `valid` is false unless it succeeded.
    pub fn ofp(&self) -> &OfpInfo {
        &self.ofp
    }

    pub fn status(&self) -> &StatusLines {
        &self.status
    }

    /// Run one cycle. On `Err` the status summary holds the user-facing text
    /// and `ofp().valid` is false.
    pub fn fetch_ofp(&mut self) -> Result<FetchReport, SessionError> {
        self.ofp = OfpInfo::default();
        self.status = StatusLines::default();

        if let Err(err) = self.fetch_and_check() {
            self.status.summary = match &err {
                SessionError::Unreachable(_) => UNREACHABLE_TEXT.to_string(),
                other => other.to_string(),
            };
            warn!(error = %err, "OFP fetch failed");
            return Err(err);
        }

        self.status.summary = self
            .ofp
            .generated_line()
            .unwrap_or_else(|| format!("OFP {} - {}", self.ofp.origin, self.ofp.destination));

        let mut report = FetchReport::default();
        if self.prefs.download_fms {
            if let Some(stem) = self.ofp.fms_stem() {
                report.fms_path = self.download_fms(&stem);
                if report.fms_path.is_some() && self.prefs.notify_asxp {
                    report.notified = Some(self.notify_asxp(&format!("{stem}.fms")));
                }
            } else {
                warn!(
                    origin = %self.ofp.origin,
                    destination = %self.ofp.destination,
                    "airport codes do not form a plan file name"
                );
                self.status.fms = FMS_FAILED_TEXT.to_string();
            }
        }
        Ok(report)
    }

    fn fetch_and_check(&mut self) -> Result<(), SessionError> {
        if self.prefs.pilot_id.is_empty() {
            return Err(SessionError::NoPilotId);
        }
        let url = self.config.ofp_url(&self.prefs.pilot_id);
        let document = self
            .transport
            .fetch_to_vec(&url, self.config.ofp_timeout_secs)
            .map_err(SessionError::Unreachable)?;

        let mut ofp = OfpInfo::from_document(&document);
        ofp.dump();
        if !ofp.status_is(&self.config.success_status) {
            let status = ofp.status.clone();
            // Keep the status so the host can show it; nothing else is trusted.
            self.ofp = OfpInfo {
                status: status.clone(),
                ..OfpInfo::default()
            };
            return Err(SessionError::Rejected { status });
        }
        ofp.valid = true;
        self.ofp = ofp;
        Ok(())
    }

    /// Save the plan as `{fms_dir}/{stem}.fms`. `stem` comes from
    /// `OfpInfo::fms_stem`, so it is a single plain path component.
    fn download_fms(&mut self, stem: &str) -> Option<PathBuf> {
        let url = self.ofp.download_url();
        let path = self.config.fms_dir.join(format!("{stem}.fms"));
        info!(url = %url, path = %path.display(), "downloading FMS plan");

        match download_to_file(&self.transport, &url, &path, self.config.fms_timeout_secs) {
            Ok(bytes) => {
                info!(bytes, "FMS plan saved");
                self.status.fms = format!("FMS plan: '{stem}'");
                Some(path)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "cannot download FMS plan");
                self.status.fms = FMS_FAILED_TEXT.to_string();
                None
            }
        }
    }

    fn notify_asxp(&mut self, file_name: &str) -> bool {
        let url = self.config.notify_url(file_name);
        match self
            .transport
            .fetch_to_vec(&url, self.config.notify_timeout_secs)
        {
            Ok(_) => {
                info!(url = %url, "flight plan uploaded to ASXP");
                self.status.notify = "Flightplan uploaded to ASXP".to_string();
                true
            }
            Err(e) => {
                warn!(url = %url, error = %e, "cannot upload to ASXP");
                self.status.notify = "Could not upload flightplan to ASXP".to_string();
                false
            }
        }
    }
}
