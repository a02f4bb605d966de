//! Client side of the facilitator's `/verify` endpoint.
//!
//! The gate only needs a yes/no answer about a proof's authenticity, so the
//! facilitator is modelled as the [`FacilitatorClient`] trait. The HTTP
//! implementation posts the decoded envelope verbatim.

use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::constants::VERIFY_TIMEOUT_SECS;
use crate::error::X402Error;

/// External authority that authenticates payment proofs.
pub trait FacilitatorClient: Send + Sync {
    /// Returns `Ok(true)` only if the facilitator accepted the envelope.
    /// `Err` means the facilitator could not be asked.
    fn verify(&self, envelope: &Value) -> impl Future<Output = Result<bool, X402Error>> + Send;
}

/// Facilitator reached over HTTP at `{facilitator_url}/verify`.
#[derive(Debug, Clone)]
pub struct HttpFacilitatorClient {
    http: reqwest::Client,
    verify_url: String,
    timeout: Duration,
}

impl HttpFacilitatorClient {
    pub fn new(http: reqwest::Client, facilitator_url: &str) -> Self {
        Self {
            http,
            verify_url: format!("{}/verify", facilitator_url.trim_end_matches('/')),
            timeout: Duration::from_secs(VERIFY_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn verify_url(&self) -> &str {
        &self.verify_url
    }
}

impl FacilitatorClient for HttpFacilitatorClient {
    async fn verify(&self, envelope: &Value) -> Result<bool, X402Error> {
        let resp = self
            .http
            .post(&self.verify_url)
            .timeout(self.timeout)
            .json(envelope)
            .send()
            .await
            .map_err(|e| X402Error::HttpError(format!("facilitator request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "facilitator rejected payment");
        }
        Ok(status.is_success())
    }
}
