use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};
use std::sync::LazyLock;

pub static REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "agent_x402_requests_total",
        "Total requests to payment-gated endpoints",
        &["endpoint", "status"]
    )
    .unwrap()
});

pub static PAYMENT_ATTEMPTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "agent_x402_payment_attempts_total",
        "Payment gate outcomes (challenge, allowed, or deny reason)",
        &["result"]
    )
    .unwrap()
});

pub static AUTHORIZE_LATENCY: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "agent_x402_authorize_latency_seconds",
        "Time spent deciding a payment-gated request, including facilitator verification",
        &["result"],
        vec![0.001, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap()
});

pub static INTERACTION_LOG_SIZE: LazyLock<IntGauge> = LazyLock::new(|| {
    register_int_gauge!(
        "agent_x402_interaction_log_size",
        "Entries currently retained in the interaction log"
    )
    .unwrap()
});

pub fn metrics_output() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
