//! Core of the SimBrief OFP connector for the ToLiss Airbus family.
//!
//! # Overview
//! Fetches an Operational Flight Plan for a pilot id, pulls a handful of
//! fields out of the XML answer, saves the linked FMS plan and optionally
//! tells ActiveSky about it. Simulator UI lives outside this crate; the host
//! drives a [`Session`] and shows its status lines.
//!
//! # Design
//! - `http` is a blocking GET with a hard timeout, into a buffer or a stream.
//! - `extract` is a bounded tag scanner, deliberately not an XML parser.
//! - Both are stateless. All state sits in `Session`, owned by the caller.
//! - `Fetch` is the seam between the session and the network, so the cycle
//!   is testable without sockets.

pub mod aircraft;
pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod prefs;
pub mod session;
pub mod trigger;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, FetchError, PrefsError, SessionError};
pub use extract::{extract_field, extract_fields, FieldSpec};
pub use http::{download_to_file, Destination, Fetch, Fetched, HttpTransport};
pub use prefs::Prefs;
pub use session::{FetchReport, Session, StatusLines};
pub use trigger::{TriggerPoll, UplinkTrigger};
pub use types::OfpInfo;
