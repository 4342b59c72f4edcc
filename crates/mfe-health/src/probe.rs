//! Liveness probes.

use std::time::Duration;

use async_trait::async_trait;

/// Trait for probing a participant's well-known manifest endpoint.
#[async_trait]
pub trait EndpointProbe: Send + Sync {
    /// `true` when the endpoint answered successfully within the
    /// probe's deadline.
    async fn probe(&self, endpoint: &str) -> bool;
}

/// HEAD request against the manifest path with a bounded timeout.
/// Timeout or a non-success status both read as "inactive".
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    /// Build a probe whose requests abort after `timeout`.
    ///
    /// # Errors
    /// Returns the underlying client construction error.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl EndpointProbe for HttpProbe {
    async fn probe(&self, endpoint: &str) -> bool {
        match self.client.head(endpoint).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(endpoint, "Probe failed: {e}");
                false
            }
        }
    }
}
