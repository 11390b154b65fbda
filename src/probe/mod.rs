//! Probe module for keep-alive checks.
//!
//! A probe never fails outward: every failure mode is folded into a [`ProbeResult`].

mod http;

pub use http::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Timeout applied to every probe request.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Probe error types.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed with status code {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl ProbeError {
    /// Status code of the response that caused this error, if one arrived.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProbeError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

/// Classification of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// Marker text written into the log for this outcome.
    pub fn marker(self) -> &'static str {
        match self {
            Outcome::Success => "SUCCESS",
            Outcome::Failure => "FAILED",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Outcome of one probe against one URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub url: String,
    pub outcome: Outcome,
    pub status_code: Option<u16>,
    /// Wall-clock milliseconds from dispatch to response; only set on success.
    pub response_time_ms: Option<u64>,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProbeResult {
    pub fn success(url: &str, status_code: u16, elapsed: Duration, timestamp: DateTime<Utc>) -> Self {
        Self {
            url: url.to_string(),
            outcome: Outcome::Success,
            status_code: Some(status_code),
            response_time_ms: Some(elapsed.as_millis() as u64),
            error_message: None,
            timestamp,
        }
    }

    pub fn failure(url: &str, error: &ProbeError, timestamp: DateTime<Utc>) -> Self {
        Self {
            url: url.to_string(),
            outcome: Outcome::Failure,
            status_code: error.status_code(),
            response_time_ms: None,
            error_message: Some(error.to_string()),
            timestamp,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// Something that can check a URL and classify the result.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeResult;
}
