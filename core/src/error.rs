//! Error types for the OFP connector core.
//!
//! # Design
//! Transport failures keep their subkind (`Timeout`, `Status`, ...) so the
//! log line says what happened, but every caller in this crate reacts to
//! them the same way: "could not reach service". A missing or truncated XML
//! field is never an error; it surfaces as an empty string in `OfpInfo`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by a single `Fetch::fetch` attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL was empty. Malformed URLs are reported as `Transport`.
    #[error("empty URL")]
    EmptyUrl,

    /// The whole call did not finish within the timeout.
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The server answered with a non-2xx status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// Resolve, connect, TLS or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Writing the body to the destination stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors reading or writing the preferences file.
#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("cannot access preferences {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors loading a `Config` file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Outcome classes of one `Session::fetch_ofp` cycle.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No pilot id configured; nothing was requested.
    #[error("no pilot id configured")]
    NoPilotId,

    /// The dispatch service could not be reached or answered with an error.
    #[error("could not reach service: {0}")]
    Unreachable(#[source] FetchError),

    /// The service answered but its status is not the success token.
    /// `status` is the service text, shown verbatim to the user.
    #[error("{status}")]
    Rejected { status: String },
}
