//! Agent server — actix-web host for the x402 payment gate and interaction log.
//!
//! # Modules
//!
//! - [`config`] — Environment configuration ([`ServerConfig`](config::ServerConfig))
//! - [`state`] — Shared application state ([`AppState`](state::AppState))
//! - [`middleware`] — Payment gate adapter ([`require_payment`](middleware::require_payment))
//! - [`routes`] — Health, interaction log, paid endpoint and metrics routes
//! - [`metrics`] — Prometheus metrics for request and payment tracking

pub mod config;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use middleware::{payment_denied_response, payment_required_response, require_payment};
pub use state::AppState;
