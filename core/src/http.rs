//! Blocking HTTP GET with a bounded wait.
//!
//! # Design
//! One call is one attempt: there is no retry state and no cancellation
//! beyond the timeout. The body goes to exactly one destination, either an
//! owned buffer returned to the caller or a caller-owned `Write` that this
//! module fills but never closes.
//!
//! `Fetch` is the seam the session is written against, so tests can swap
//! the network for canned documents. `HttpTransport` is the real
//! implementation on top of `ureq`.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::FetchError;

/// Timeout applied when a caller passes `0`.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the response body goes.
pub enum Destination<'a> {
    /// Collect the whole body into an owned buffer.
    Buffer,
    /// Copy the body incrementally into an already-open writer.
    Stream(&'a mut dyn Write),
}

/// Successful result of a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// Buffer mode: the full body. May be empty.
    Buffer(Vec<u8>),
    /// Stream mode: number of bytes written to the destination.
    Streamed(u64),
}

/// A single blocking HTTP GET.
pub trait Fetch {
    /// Fetch `url` into `destination`, giving up after `timeout_secs`
    /// (`0` means `DEFAULT_TIMEOUT_SECS`).
    fn fetch(
        &self,
        url: &str,
        destination: Destination<'_>,
        timeout_secs: u64,
    ) -> Result<Fetched, FetchError>;

    /// Buffer-mode shorthand.
    fn fetch_to_vec(&self, url: &str, timeout_secs: u64) -> Result<Vec<u8>, FetchError> {
        match self.fetch(url, Destination::Buffer, timeout_secs)? {
            Fetched::Buffer(body) => Ok(body),
            Fetched::Streamed(_) => Err(FetchError::Transport(
                "stream result returned for a buffer fetch".to_string(),
            )),
        }
    }

    /// Stream-mode shorthand. Returns the number of bytes written.
    fn fetch_to_writer(
        &self,
        url: &str,
        writer: &mut dyn Write,
        timeout_secs: u64,
    ) -> Result<u64, FetchError> {
        match self.fetch(url, Destination::Stream(writer), timeout_secs)? {
            Fetched::Streamed(n) => Ok(n),
            Fetched::Buffer(_) => Err(FetchError::Transport(
                "buffer result returned for a stream fetch".to_string(),
            )),
        }
    }
}

/// Download `url` into a new file at `path`.
///
/// The file is created (truncating any previous one) and closed before
/// returning. If the transfer fails the partial file is removed, so a
/// timed-out download never leaves a corrupt flight plan behind.
pub fn download_to_file<F: Fetch + ?Sized>(
    transport: &F,
    url: &str,
    path: &Path,
    timeout_secs: u64,
) -> Result<u64, FetchError> {
    let mut file = File::create(path)?;
    let result = transport
        .fetch_to_writer(url, &mut file, timeout_secs)
        .and_then(|n| {
            file.flush()?;
            Ok(n)
        });
    drop(file);

    if result.is_err() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "cannot remove partial download");
        }
    }
    result
}

/// `ureq`-backed transport. Stateless: a fresh agent is built per call so
/// each call carries its own timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl HttpTransport {
    pub fn new() -> Self {
        Self
    }

    fn agent(secs: u64) -> ureq::Agent {
        ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(secs)))
            .http_status_as_error(true)
            .build()
            .new_agent()
    }
}

impl Fetch for HttpTransport {
    fn fetch(
        &self,
        url: &str,
        destination: Destination<'_>,
        timeout_secs: u64,
    ) -> Result<Fetched, FetchError> {
        if url.is_empty() {
            return Err(FetchError::EmptyUrl);
        }
        let secs = effective_timeout(timeout_secs);
        debug!(url, timeout_secs = secs, "GET");

        let mut response = Self::agent(secs)
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(e, secs))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FetchError::Status(status));
        }

        let fetched = match destination {
            Destination::Buffer => {
                let body = response
                    .body_mut()
                    .with_config()
                    .limit(u64::MAX)
                    .read_to_vec()
                    .map_err(|e| map_ureq_error(e, secs))?;
                debug!(url, bytes = body.len(), "body received");
                Fetched::Buffer(body)
            }
            Destination::Stream(writer) => {
                let mut reader = response.into_body().into_reader();
                let n = io::copy(&mut reader, writer).map_err(|e| map_io_error(e, secs))?;
                debug!(url, bytes = n, "body streamed");
                Fetched::Streamed(n)
            }
        };
        Ok(fetched)
    }
}

fn effective_timeout(timeout_secs: u64) -> u64 {
    if timeout_secs == 0 {
        DEFAULT_TIMEOUT_SECS
    } else {
        timeout_secs
    }
}

fn map_ureq_error(err: ureq::Error, secs: u64) -> FetchError {
    match err {
        ureq::Error::StatusCode(code) => FetchError::Status(code),
        ureq::Error::Timeout(_) => FetchError::Timeout { secs },
        ureq::Error::Io(e) => map_io_error(e, secs),
        other => FetchError::Transport(other.to_string()),
    }
}

// Body reads surface errors as io::Error. ureq wraps its own errors,
// timeouts included, inside one of kind `Other`.
fn map_io_error(err: io::Error, secs: u64) -> FetchError {
    if err.kind() == io::ErrorKind::TimedOut {
        return FetchError::Timeout { secs };
    }
    if !err.get_ref().is_some_and(|inner| inner.is::<ureq::Error>()) {
        return FetchError::Io(err);
    }
    match err.into_inner().map(|inner| inner.downcast::<ureq::Error>()) {
        Some(Ok(inner)) => map_ureq_error(*inner, secs),
        Some(Err(other)) => FetchError::Transport(other.to_string()),
        None => FetchError::Transport("body read failed".to_string()),
    }
}
