use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use x402::security::bearer_matches;
use x402::{FacilitatorClient, Interaction};

use crate::metrics::{metrics_output, INTERACTION_LOG_SIZE};
use crate::middleware::require_payment;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "agent-x402-server";

const DEFAULT_RECENT: i64 = 10;

/// Register every route. Generic over the facilitator so tests can swap it out.
pub fn configure<F: FacilitatorClient + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health))
        .route("/api/interactions", web::get().to(interactions::<F>))
        .route(
            "/api/interactions/stats",
            web::get().to(interaction_stats::<F>),
        )
        .route("/api/premium", web::post().to(premium::<F>))
        .route("/metrics", web::get().to(metrics_endpoint::<F>));
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub n: Option<i64>,
}

pub async fn interactions<F: FacilitatorClient + 'static>(
    state: web::Data<AppState<F>>,
    query: web::Query<RecentQuery>,
) -> HttpResponse {
    // n <= 0 asks for nothing
    let n = usize::try_from(query.n.unwrap_or(DEFAULT_RECENT)).unwrap_or(0);
    HttpResponse::Ok().json(state.log.recent(n))
}

pub async fn interaction_stats<F: FacilitatorClient + 'static>(
    state: web::Data<AppState<F>>,
) -> HttpResponse {
    HttpResponse::Ok().json(state.log.stats())
}

/// Example paid endpoint: 402 without a proof, 403 for a refused proof.
pub async fn premium<F: FacilitatorClient + 'static>(
    req: HttpRequest,
    state: web::Data<AppState<F>>,
) -> HttpResponse {
    if let Err(resp) = require_payment(&req, &state.premium_gate, &state.log).await {
        return resp;
    }

    state.log.add(Interaction::new("premium").attr("path", req.path()));

    HttpResponse::Ok().json(serde_json::json!({
        "data": "premium content",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn metrics_endpoint<F: FacilitatorClient + 'static>(
    req: HttpRequest,
    state: web::Data<AppState<F>>,
) -> HttpResponse {
    match &state.metrics_token {
        Some(expected) => {
            let authorization = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok());

            if !bearer_matches(authorization, expected) {
                return HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "unauthorized",
                    "message": "Valid Bearer token required for /metrics"
                }));
            }
        }
        None => {
            if !state.public_metrics {
                return HttpResponse::Forbidden().json(serde_json::json!({
                    "error": "forbidden",
                    "message": "Set METRICS_TOKEN or X402_PUBLIC_METRICS=true to access /metrics"
                }));
            }
        }
    }

    INTERACTION_LOG_SIZE.set(state.log.len() as i64);

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics_output())
}
