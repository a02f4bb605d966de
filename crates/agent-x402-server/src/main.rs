use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use x402::HttpFacilitatorClient;
use x402_server::{routes, AppState, ServerConfig};

fn build_cors(origins: &[String]) -> Cors {
    if origins.is_empty() {
        Cors::default()
            .allowed_origin_fn(|origin, _| {
                origin
                    .to_str()
                    .map(|o| o == "http://localhost" || o.starts_with("http://localhost:"))
                    .unwrap_or(false)
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allow_any_header()
            .max_age(3600)
    } else {
        let mut cors = Cors::default();
        for origin in origins {
            cors = cors.allowed_origin(origin);
        }
        cors.allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allow_any_header()
            .max_age(3600)
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        std::io::Error::other(e.to_string())
    })?;

    let state = AppState::from_config(&config).map_err(|e| {
        tracing::error!(error = %e, "failed to initialize payment gate");
        std::io::Error::other(e.to_string())
    })?;

    let gate = state.premium_gate.config();
    tracing::info!("{} listening at http://localhost:{}", routes::SERVICE_NAME, config.port);
    tracing::info!(
        network = %gate.network,
        recipient = %gate.recipient,
        price = %gate.price,
        facilitator = %gate.facilitator_url,
        "POST /api/premium is payment-gated"
    );
    tracing::info!("Endpoints: GET /api/health, GET /api/interactions, GET /api/interactions/stats, GET /metrics");
    tracing::info!("Rate limit: {} req/min per IP", config.rate_limit_rpm);
    if config.metrics_token.is_none() && !config.public_metrics {
        tracing::warn!("METRICS_TOKEN not set — /metrics is disabled");
    }

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(config.rate_limit_rpm)
        .finish()
        .ok_or_else(|| std::io::Error::other("invalid rate limit configuration"))?;

    let cors_origins = config.allowed_origins.clone();
    let state = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&cors_origins))
            .wrap(Governor::new(&governor_conf))
            .app_data(web::JsonConfig::default().limit(65_536))
            .app_data(state.clone())
            .configure(routes::configure::<HttpFacilitatorClient>)
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await
}
