//! Gate configuration, resolved once at startup.
//!
//! Every field resolves in the same order: the value given to the builder,
//! then the process-level default ([`GateDefaults`]), then the built-in
//! per-network default.

use std::time::Duration;
use url::Url;

use crate::constants::{
    default_asset, DEFAULT_DESCRIPTION, DEFAULT_FACILITATOR_URL, DEFAULT_NETWORK,
    VERIFY_TIMEOUT_SECS, X402_VERSION,
};
use crate::error::X402Error;
use crate::payment::PaymentChallenge;

/// Process-level defaults shared by every gated route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDefaults {
    pub network: String,
    pub recipient: String,
    pub facilitator_url: String,
}

impl Default for GateDefaults {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK.to_string(),
            recipient: String::new(),
            facilitator_url: DEFAULT_FACILITATOR_URL.to_string(),
        }
    }
}

impl GateDefaults {
    /// Read `X402_NETWORK`, `X402_RECIPIENT` and `X402_FACILITATOR_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let fallback = Self::default();

        Self {
            network: get("X402_NETWORK").unwrap_or(fallback.network),
            recipient: get("X402_RECIPIENT").unwrap_or(fallback.recipient),
            facilitator_url: get("X402_FACILITATOR_URL").unwrap_or(fallback.facilitator_url),
        }
    }
}

/// Fully resolved configuration of one payment gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Minimum accepted amount in the asset's smallest unit.
    pub price: u128,
    pub asset: String,
    pub recipient: String,
    pub network: String,
    pub facilitator_url: String,
    pub description: String,
    pub verify_timeout: Duration,
}

impl GateConfig {
    /// Challenge advertised to callers that arrive without a proof.
    pub fn challenge(&self) -> PaymentChallenge {
        PaymentChallenge {
            version: X402_VERSION,
            amount: self.price.to_string(),
            asset: self.asset.clone(),
            recipient: self.recipient.clone(),
            network: self.network.clone(),
            facilitator: self.facilitator_url.clone(),
            description: self.description.clone(),
        }
    }
}

/// Builder for a [`GateConfig`]; unset fields fall back to [`GateDefaults`].
#[derive(Debug, Clone)]
pub struct GateConfigBuilder {
    price: u128,
    asset: Option<String>,
    recipient: Option<String>,
    network: Option<String>,
    facilitator_url: Option<String>,
    description: Option<String>,
    verify_timeout: Option<Duration>,
}

impl GateConfigBuilder {
    pub fn new(price: u128) -> Self {
        Self {
            price,
            asset: None,
            recipient: None,
            network: None,
            facilitator_url: None,
            description: None,
            verify_timeout: None,
        }
    }

    pub fn asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn facilitator_url(mut self, url: impl Into<String>) -> Self {
        self.facilitator_url = Some(url.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn verify_timeout(mut self, timeout: Duration) -> Self {
        self.verify_timeout = Some(timeout);
        self
    }

    /// Resolve every field against `defaults`.
    ///
    /// Fails if no recipient is configured anywhere or the facilitator URL is
    /// not an absolute http(s) URL.
    pub fn build(self, defaults: &GateDefaults) -> Result<GateConfig, X402Error> {
        let network = self.network.unwrap_or_else(|| defaults.network.clone());
        let asset = self
            .asset
            .unwrap_or_else(|| default_asset(&network).to_string());
        let recipient = self
            .recipient
            .unwrap_or_else(|| defaults.recipient.clone());
        let facilitator_url = self
            .facilitator_url
            .unwrap_or_else(|| defaults.facilitator_url.clone());

        if recipient.trim().is_empty() {
            return Err(X402Error::ConfigError(
                "payment recipient is required (set X402_RECIPIENT)".to_string(),
            ));
        }

        let parsed = Url::parse(&facilitator_url)
            .map_err(|e| X402Error::ConfigError(format!("invalid facilitator URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(X402Error::ConfigError(format!(
                "facilitator URL must be http or https: {facilitator_url}"
            )));
        }

        Ok(GateConfig {
            price: self.price,
            asset,
            recipient,
            network,
            facilitator_url,
            description: self
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            verify_timeout: self
                .verify_timeout
                .unwrap_or(Duration::from_secs(VERIFY_TIMEOUT_SECS)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const RECIPIENT: &str = "0x2222222222222222222222222222222222222222";

    fn defaults_from(vars: &[(&str, &str)]) -> GateDefaults {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GateDefaults::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let defaults = defaults_from(&[]);
        assert_eq!(defaults.network, "avalanche");
        assert_eq!(defaults.recipient, "");
        assert_eq!(defaults.facilitator_url, DEFAULT_FACILITATOR_URL);
    }

    #[test]
    fn test_defaults_from_environment() {
        let defaults = defaults_from(&[
            ("X402_NETWORK", "base"),
            ("X402_RECIPIENT", RECIPIENT),
            ("X402_FACILITATOR_URL", "https://fac.example"),
        ]);
        assert_eq!(defaults.network, "base");
        assert_eq!(defaults.recipient, RECIPIENT);
        assert_eq!(defaults.facilitator_url, "https://fac.example");
    }

    #[test]
    fn test_blank_environment_values_are_ignored() {
        let defaults = defaults_from(&[("X402_NETWORK", "  ")]);
        assert_eq!(defaults.network, "avalanche");
    }

    #[test]
    fn test_asset_follows_resolved_network() {
        let defaults = defaults_from(&[("X402_NETWORK", "base"), ("X402_RECIPIENT", RECIPIENT)]);
        let config = GateConfigBuilder::new(10_000).build(&defaults).unwrap();
        assert_eq!(config.network, "base");
        assert_eq!(config.asset, default_asset("base"));
        assert_eq!(config.description, DEFAULT_DESCRIPTION);
        assert_eq!(config.verify_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_explicit_values_win() {
        let defaults = defaults_from(&[("X402_NETWORK", "base"), ("X402_RECIPIENT", RECIPIENT)]);
        let config = GateConfigBuilder::new(5)
            .network("polygon")
            .asset("0xcustom")
            .recipient("0x3333333333333333333333333333333333333333")
            .facilitator_url("http://localhost:4022")
            .description("Deep research")
            .build(&defaults)
            .unwrap();
        assert_eq!(config.network, "polygon");
        assert_eq!(config.asset, "0xcustom");
        assert_eq!(config.recipient, "0x3333333333333333333333333333333333333333");
        assert_eq!(config.facilitator_url, "http://localhost:4022");
        assert_eq!(config.description, "Deep research");
    }

    #[test]
    fn test_missing_recipient_is_rejected() {
        let result = GateConfigBuilder::new(1).build(&defaults_from(&[]));
        assert!(matches!(result, Err(X402Error::ConfigError(_))));
    }

    #[test]
    fn test_invalid_facilitator_url_is_rejected() {
        let defaults = defaults_from(&[("X402_RECIPIENT", RECIPIENT)]);
        assert!(GateConfigBuilder::new(1)
            .facilitator_url("not a url")
            .build(&defaults)
            .is_err());
        assert!(GateConfigBuilder::new(1)
            .facilitator_url("ftp://fac.example")
            .build(&defaults)
            .is_err());
    }

    #[test]
    fn test_challenge_carries_configured_terms() {
        let defaults = defaults_from(&[("X402_RECIPIENT", RECIPIENT)]);
        let challenge = GateConfigBuilder::new(10_000)
            .build(&defaults)
            .unwrap()
            .challenge();
        assert_eq!(challenge.version, 1);
        assert_eq!(challenge.amount, "10000");
        assert_eq!(challenge.recipient, RECIPIENT);
        assert_eq!(challenge.network, "avalanche");
        assert_eq!(challenge.facilitator, DEFAULT_FACILITATOR_URL);
    }
}
