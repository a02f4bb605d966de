use actix_web::{HttpRequest, HttpResponse};
use std::time::Instant;
use x402::{
    FacilitatorClient, GateDecision, Interaction, InteractionLog, PaymentChallenge, PaymentGate,
    PaymentRequiredBody, PAYMENT_HEADER,
};

use crate::metrics::{AUTHORIZE_LATENCY, PAYMENT_ATTEMPTS, REQUESTS};

/// Body returned for every refused proof. The specific reason is only logged.
pub const DENIED_MESSAGE: &str = "Invalid or expired payment";

/// Raw `X-PAYMENT` header value, if present and valid UTF-8.
pub fn payment_header(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(PAYMENT_HEADER)
        .and_then(|v| v.to_str().ok())
}

/// Build the 402 Payment Required response.
pub fn payment_required_response(challenge: PaymentChallenge) -> HttpResponse {
    HttpResponse::PaymentRequired().json(PaymentRequiredBody::new(challenge))
}

/// Build the 403 response for a refused proof.
pub fn payment_denied_response() -> HttpResponse {
    HttpResponse::Forbidden().json(serde_json::json!({ "error": DENIED_MESSAGE }))
}

/// Run the gate for `req` and record the outcome.
/// Returns `Ok(())` if the handler may proceed, or `Err(HttpResponse)` to return directly.
pub async fn require_payment<F: FacilitatorClient>(
    req: &HttpRequest,
    gate: &PaymentGate<F>,
    log: &InteractionLog,
) -> Result<(), HttpResponse> {
    let started = Instant::now();
    let decision = gate.authorize(payment_header(req)).await;

    // Use the matched route pattern (not raw path) to prevent cardinality bombs
    let endpoint = req.match_pattern().unwrap_or_else(|| "unknown".to_string());

    let (result, status, outcome) = match decision {
        GateDecision::Allow => ("allowed", "200", Ok(())),
        GateDecision::Challenge(challenge) => {
            ("challenge", "402", Err(payment_required_response(challenge)))
        }
        GateDecision::Deny(reason) => (reason.code(), "403", Err(payment_denied_response())),
    };

    AUTHORIZE_LATENCY
        .with_label_values(&[result])
        .observe(started.elapsed().as_secs_f64());
    PAYMENT_ATTEMPTS.with_label_values(&[result]).inc();
    REQUESTS.with_label_values(&[endpoint.as_str(), status]).inc();

    log.add(
        Interaction::new("payment")
            .attr("endpoint", endpoint)
            .attr("result", result)
            .attr("price", gate.config().price.to_string()),
    );

    outcome
}
