//! HTTP probe implementation.

use async_trait::async_trait;
use chrono::Utc;
use std::time::{Duration, Instant};

use super::{Probe, ProbeError, ProbeResult};

/// HEAD-request prober sharing one HTTP client across all targets.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    /// Build a prober whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Send a HEAD request and return the status code and elapsed time.
    ///
    /// Any non-2xx status is an error, mirroring clients that reject
    /// unsuccessful responses by default.
    async fn head(&self, address: &str) -> Result<(u16, Duration), ProbeError> {
        let url = if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        };

        let start = Instant::now();

        let response = self.client.head(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout(self.timeout)
            } else {
                ProbeError::Network(e.to_string())
            }
        })?;

        let elapsed = start.elapsed();
        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        Ok((status.as_u16(), elapsed))
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn probe(&self, url: &str) -> ProbeResult {
        let timestamp = Utc::now();

        match self.head(url).await {
            Ok((status, elapsed)) => ProbeResult::success(url, status, elapsed, timestamp),
            Err(e) => {
                tracing::debug!("Probe for {} failed: {}", url, e);
                ProbeResult::failure(url, &e, timestamp)
            }
        }
    }
}
