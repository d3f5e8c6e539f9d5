//! Endpoints, paths and timeouts.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes. The ActiveSky endpoint in particular is a local, unversioned
//! API and is kept here rather than baked into the session.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const PILOT_ID_PLACEHOLDER: &str = "{pilot_id}";
pub const FILE_PLACEHOLDER: &str = "{file}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// OFP fetcher URL; `{pilot_id}` is replaced by the pilot id.
    pub ofp_url_template: String,
    /// ActiveSky load-plan URL; `{file}` is replaced by the FMS file name.
    pub notify_url_template: String,
    /// Directory the FMS plan is written to.
    pub fms_dir: PathBuf,
    /// Status text that marks a usable OFP.
    pub success_status: String,
    pub ofp_timeout_secs: u64,
    pub fms_timeout_secs: u64,
    pub notify_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ofp_url_template: "https://www.simbrief.com/api/xml.fetcher.php?userid={pilot_id}"
                .to_string(),
            notify_url_template:
                "http://localhost:19285/ActiveSky/API/LoadFlightPlan?FileName={file}".to_string(),
            fms_dir: PathBuf::from("Output").join("FMS plans"),
            success_status: "Success".to_string(),
            ofp_timeout_secs: 10,
            fms_timeout_secs: 10,
            notify_timeout_secs: 2,
        }
    }
}

impl Config {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Point every endpoint at `base_url` (scheme + host + port), keeping
    /// paths and queries. Used to run against a local dispatch mock.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.ofp_url_template = format!("{base}/api/xml.fetcher.php?userid={PILOT_ID_PLACEHOLDER}");
        self.notify_url_template =
            format!("{base}/ActiveSky/API/LoadFlightPlan?FileName={FILE_PLACEHOLDER}");
        self
    }

    /// OFP URL for `pilot_id`, percent-encoded into the template.
    pub fn ofp_url(&self, pilot_id: &str) -> String {
        self.ofp_url_template
            .replace(PILOT_ID_PLACEHOLDER, &urlencoding::encode(pilot_id))
    }

    pub fn notify_url(&self, file_name: &str) -> String {
        self.notify_url_template
            .replace(FILE_PLACEHOLDER, &urlencoding::encode(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_addon_constants() {
        let config = Config::default();
        assert_eq!(
            config.ofp_url("123456"),
            "https://www.simbrief.com/api/xml.fetcher.php?userid=123456"
        );
        assert_eq!(
            config.notify_url("KJFKKBOS19.fms"),
            "http://localhost:19285/ActiveSky/API/LoadFlightPlan?FileName=KJFKKBOS19.fms"
        );
        assert_eq!(config.notify_timeout_secs, 2);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"notifyUrlTemplate":"http://localhost:9999/load?f={file}"}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.notify_url("a.fms"), "http://localhost:9999/load?f=a.fms");
        assert_eq!(config.success_status, "Success");
        assert_eq!(config.fms_timeout_secs, 10);
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::load(Path::new("/nonexistent/ofp.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn base_url_rewrites_endpoints() {
        let config = Config::default().with_base_url("http://127.0.0.1:4000/");
        assert_eq!(config.ofp_url("7"), "http://127.0.0.1:4000/api/xml.fetcher.php?userid=7");
        assert_eq!(
            config.notify_url("X.fms"),
            "http://127.0.0.1:4000/ActiveSky/API/LoadFlightPlan?FileName=X.fms"
        );
    }

    #[test]
    fn placeholders_are_percent_encoded() {
        let config = Config::default().with_base_url("http://dispatch");
        assert_eq!(
            config.ofp_url("1&userid=2"),
            "http://dispatch/api/xml.fetcher.php?userid=1%26userid%3D2"
        );
        assert_eq!(
            config.ofp_url("pilot one"),
            "http://dispatch/api/xml.fetcher.php?userid=pilot%20one"
        );
        assert_eq!(
            config.notify_url("A B.fms"),
            "http://dispatch/ActiveSky/API/LoadFlightPlan?FileName=A%20B.fms"
        );
    }
}
