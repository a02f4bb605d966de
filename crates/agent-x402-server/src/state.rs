use x402::{HttpFacilitatorClient, InteractionLog, PaymentGate};

use crate::config::{ConfigError, ServerConfig};

/// Shared application state, one instance per process.
pub struct AppState<F = HttpFacilitatorClient> {
    /// Gate protecting `POST /api/premium`.
    pub premium_gate: PaymentGate<F>,
    pub log: InteractionLog,
    /// Bearer token for /metrics.
    pub metrics_token: Option<String>,
    pub public_metrics: bool,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let premium_gate = PaymentGate::http(config.premium_gate()?, http_client);
        Ok(Self::new(premium_gate, InteractionLog::new(config.log_capacity))
            .with_metrics_access(config.metrics_token.clone(), config.public_metrics))
    }
}

impl<F> AppState<F> {
    pub fn new(premium_gate: PaymentGate<F>, log: InteractionLog) -> Self {
        Self {
            premium_gate,
            log,
            metrics_token: None,
            public_metrics: false,
        }
    }

    pub fn with_metrics_access(mut self, token: Option<String>, public: bool) -> Self {
        self.metrics_token = token;
        self.public_metrics = public;
        self
    }
}
