//! Per-request payment gate.
//!
//! [`PaymentGate::authorize`] runs a fixed sequence of checks against the
//! `X-PAYMENT` header; the first failing check decides the outcome. Only the
//! final facilitator call leaves the process, and it is bounded by the
//! configured timeout. The gate keeps no state between requests.

use chrono::Utc;
use thiserror::Error;

use crate::config::GateConfig;
use crate::constants::X402_VERSION;
use crate::facilitator_client::{FacilitatorClient, HttpFacilitatorClient};
use crate::payment::{PaymentChallenge, PaymentProof};

/// Why a presented proof was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum DenyReason {
    #[error("payment header could not be decoded")]
    MalformedProof,
    #[error("unsupported x402 version")]
    UnsupportedVersion,
    #[error("payment is addressed to another recipient")]
    WrongRecipient,
    #[error("payment amount is missing or below the price")]
    InsufficientAmount,
    #[error("payment authorization has expired")]
    ExpiredProof,
    #[error("facilitator did not verify the payment")]
    Unverified,
}

impl DenyReason {
    /// Stable code for logs and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::MalformedProof => "malformed_proof",
            DenyReason::UnsupportedVersion => "unsupported_version",
            DenyReason::WrongRecipient => "wrong_recipient",
            DenyReason::InsufficientAmount => "insufficient_amount",
            DenyReason::ExpiredProof => "expired_proof",
            DenyReason::Unverified => "unverified",
        }
    }
}

/// Outcome of [`PaymentGate::authorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Payment verified; run the protected handler.
    Allow,
    /// A proof was presented and refused.
    Deny(DenyReason),
    /// No proof was presented; tell the caller how to pay.
    Challenge(PaymentChallenge),
}

/// Gate protecting a single operation.
#[derive(Debug, Clone)]
pub struct PaymentGate<F> {
    config: GateConfig,
    facilitator: F,
}

impl PaymentGate<HttpFacilitatorClient> {
    /// Gate that verifies proofs against `config.facilitator_url` over HTTP.
    pub fn http(config: GateConfig, http: reqwest::Client) -> Self {
        let facilitator = HttpFacilitatorClient::new(http, &config.facilitator_url)
            .with_timeout(config.verify_timeout);
        Self::new(config, facilitator)
    }
}

impl<F: FacilitatorClient> PaymentGate<F> {
    pub fn new(config: GateConfig, facilitator: F) -> Self {
        Self {
            config,
            facilitator,
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decide whether the request carrying `payment_header` may proceed.
    pub async fn authorize(&self, payment_header: Option<&str>) -> GateDecision {
        let header = match payment_header.map(str::trim) {
            Some(h) if !h.is_empty() => h,
            _ => return GateDecision::Challenge(self.config.challenge()),
        };

        let proof = match PaymentProof::decode(header) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "invalid payment header");
                return GateDecision::Deny(DenyReason::MalformedProof);
            }
        };

        if let Err(reason) = self.check_terms(&proof, unix_now()) {
            tracing::warn!(
                reason = reason.code(),
                to = %proof.to,
                amount = %proof.amount,
                "payment refused"
            );
            return GateDecision::Deny(reason);
        }

        if !self.verify(&proof).await {
            return GateDecision::Deny(DenyReason::Unverified);
        }

        tracing::info!(to = %proof.to, amount = %proof.amount, "payment verified");
        GateDecision::Allow
    }

    /// The local checks, in order: version, recipient, amount, expiry.
    pub fn check_terms(&self, proof: &PaymentProof, now: u64) -> Result<(), DenyReason> {
        if proof.protocol_version != Some(i64::from(X402_VERSION)) {
            return Err(DenyReason::UnsupportedVersion);
        }

        if !proof.to.eq_ignore_ascii_case(&self.config.recipient) {
            return Err(DenyReason::WrongRecipient);
        }

        match proof.amount.trim().parse::<u128>() {
            Ok(amount) if amount >= self.config.price => {}
            _ => return Err(DenyReason::InsufficientAmount),
        }

        if now > proof.valid_before {
            return Err(DenyReason::ExpiredProof);
        }

        Ok(())
    }

    async fn verify(&self, proof: &PaymentProof) -> bool {
        let call = self.facilitator.verify(proof.envelope());
        match tokio::time::timeout(self.config.verify_timeout, call).await {
            Ok(Ok(verified)) => verified,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "facilitator communication error");
                false
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.verify_timeout.as_millis() as u64,
                    "facilitator verification timed out"
                );
                false
            }
        }
    }
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}
