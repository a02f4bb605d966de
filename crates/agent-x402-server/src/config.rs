use std::num::NonZeroUsize;
use x402::{GateConfig, GateConfigBuilder, GateDefaults, X402Error, DEFAULT_LOG_CAPACITY};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_PRICE: u128 = 10_000;
const DEFAULT_RATE_LIMIT_RPM: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("payment gate: {0}")]
    Gate(#[from] X402Error),

    #[error("http client: {0}")]
    HttpClient(String),
}

/// Process configuration for the agent server.
#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Price of `POST /api/premium` in the asset's smallest unit.
    pub price: u128,
    pub log_capacity: NonZeroUsize,
    pub rate_limit_rpm: u64,
    /// CORS allowed origins (empty = localhost only)
    pub allowed_origins: Vec<String>,
    /// Bearer token required for /metrics
    pub metrics_token: Option<String>,
    /// Serve /metrics without a token when no token is set
    pub public_metrics: bool,
    pub gate_defaults: GateDefaults,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("price", &self.price)
            .field("log_capacity", &self.log_capacity)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field("allowed_origins", &self.allowed_origins)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("public_metrics", &self.public_metrics)
            .field("gate_defaults", &self.gate_defaults)
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;
        let price = parse_or(get("X402_PRICE"), "X402_PRICE", DEFAULT_PRICE)?;
        let rate_limit_rpm = parse_or(
            get("RATE_LIMIT_RPM"),
            "RATE_LIMIT_RPM",
            DEFAULT_RATE_LIMIT_RPM,
        )?;

        let capacity = parse_or(
            get("INTERACTION_LOG_CAPACITY"),
            "INTERACTION_LOG_CAPACITY",
            DEFAULT_LOG_CAPACITY,
        )?;
        let log_capacity =
            NonZeroUsize::new(capacity).ok_or_else(|| ConfigError::InvalidValue {
                var: "INTERACTION_LOG_CAPACITY",
                value: capacity.to_string(),
            })?;

        let allowed_origins: Vec<String> = get("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let metrics_token = get("METRICS_TOKEN");
        let public_metrics = get("X402_PUBLIC_METRICS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            port,
            price,
            log_capacity,
            rate_limit_rpm,
            allowed_origins,
            metrics_token,
            public_metrics,
            gate_defaults: GateDefaults::from_lookup(&lookup),
        })
    }

    /// Resolve the gate protecting `POST /api/premium`.
    pub fn premium_gate(&self) -> Result<GateConfig, ConfigError> {
        Ok(GateConfigBuilder::new(self.price)
            .description("Premium endpoint access")
            .build(&self.gate_defaults)?)
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value: v }),
        None => Ok(default),
    }
}
