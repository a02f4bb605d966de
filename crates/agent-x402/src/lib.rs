//! x402 payment gate and bounded interaction log for ERC-8004 agent servers.
//!
//! Two pieces live here, both framework-agnostic:
//!
//! - [`InteractionLog`] — a fixed-capacity ring of structured events that an
//!   agent exposes for monitoring (recent entries, per-type counts).
//! - [`PaymentGate`] — the challenge/response micropayment handshake for a
//!   protected endpoint. A request without an `X-PAYMENT` header gets a
//!   [`PaymentChallenge`]; a request with one is decoded, checked locally and
//!   then verified by an external facilitator ([`FacilitatorClient`]).
//!
//! # Quick example
//!
//! ```no_run
//! use x402::{GateConfigBuilder, GateDecision, GateDefaults, PaymentGate};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), x402::X402Error> {
//! let config = GateConfigBuilder::new(10_000)
//!     .description("Premium analysis")
//!     .build(&GateDefaults::from_env())?;
//! let gate = PaymentGate::http(config, reqwest::Client::new());
//!
//! match gate.authorize(None).await {
//!     GateDecision::Challenge(challenge) => println!("pay {} to {}", challenge.amount, challenge.recipient),
//!     GateDecision::Deny(reason) => println!("refused: {reason}"),
//!     GateDecision::Allow => println!("paid"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod facilitator_client;
pub mod gate;
pub mod interaction_log;
pub mod payment;
pub mod security;

pub use config::{GateConfig, GateConfigBuilder, GateDefaults};
pub use constants::*;
pub use error::X402Error;
pub use facilitator_client::{FacilitatorClient, HttpFacilitatorClient};
pub use gate::{DenyReason, GateDecision, PaymentGate};
pub use interaction_log::{Interaction, InteractionLog, LogEntry, LogStats};
pub use payment::{encode_payment, PaymentChallenge, PaymentProof, PaymentRequiredBody};
