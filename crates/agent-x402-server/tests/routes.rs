use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::num::NonZeroUsize;
use std::time::Duration;

use x402::{
    encode_payment, FacilitatorClient, GateConfigBuilder, GateDefaults, InteractionLog,
    PaymentGate, X402Error,
};
use x402_server::{routes, AppState};

const RECIPIENT: &str = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Facilitator double: answers `approve`, or never answers when `hang` is set.
struct StubFacilitator {
    approve: bool,
    hang: bool,
}

impl FacilitatorClient for StubFacilitator {
    async fn verify(&self, envelope: &Value) -> Result<bool, X402Error> {
        assert_eq!(envelope["payload"]["signature"], "0xsig");
        if self.hang {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        Ok(self.approve)
    }
}

fn build_state(approve: bool, hang: bool) -> AppState<StubFacilitator> {
    let config = GateConfigBuilder::new(10_000)
        .recipient(RECIPIENT)
        .network("base")
        .verify_timeout(Duration::from_millis(100))
        .build(&GateDefaults::default())
        .unwrap();
    let gate = PaymentGate::new(config, StubFacilitator { approve, hang });
    let log = InteractionLog::new(NonZeroUsize::new(16).unwrap());
    AppState::new(gate, log)
}

fn make_state(approve: bool, hang: bool) -> web::Data<AppState<StubFacilitator>> {
    web::Data::new(build_state(approve, hang))
}

fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn payment_header(to: &str, amount: &str, valid_before: u64) -> String {
    encode_payment(&json!({
        "x402Version": 1,
        "scheme": "exact",
        "network": "base",
        "payload": {
            "signature": "0xsig",
            "payload": {
                "from": "0x1111111111111111111111111111111111111111",
                "to": to,
                "amount": amount,
                "validAfter": 0,
                "validBefore": valid_before,
                "nonce": "0x01"
            }
        }
    }))
    .unwrap()
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .configure(routes::configure::<StubFacilitator>),
        )
        .await
    };
}

#[actix_rt::test]
async fn test_health() {
    let state = make_state(true, false);
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "agent-x402-server");
}

#[actix_rt::test]
async fn test_premium_without_payment_returns_challenge() {
    let state = make_state(true, false);
    let app = app!(state);

    let req = test::TestRequest::post().uri("/api/premium").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 402);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Payment Required");
    assert_eq!(body["x402"]["version"], 1);
    assert_eq!(body["x402"]["amount"], "10000");
    assert_eq!(body["x402"]["recipient"], RECIPIENT);
    assert_eq!(body["x402"]["network"], "base");
    assert_eq!(
        body["x402"]["asset"],
        "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"
    );
}

#[actix_rt::test]
async fn test_premium_with_valid_payment() {
    let state = make_state(true, false);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/premium")
        .insert_header(("X-PAYMENT", payment_header(RECIPIENT, "15000", now() + 3600)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"], "premium content");

    let stats = state.log.stats();
    assert_eq!(stats.by_type["payment"], 1);
    assert_eq!(stats.by_type["premium"], 1);
}

#[actix_rt::test]
async fn test_denials_share_one_body() {
    let state = make_state(true, false);
    let app = app!(state);

    let headers = [
        "!!!".to_string(),
        payment_header("0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB", "15000", now() + 3600),
        payment_header(RECIPIENT, "9999", now() + 3600),
        payment_header(RECIPIENT, "15000", now() - 10),
    ];

    for header in headers {
        let req = test::TestRequest::post()
            .uri("/api/premium")
            .insert_header(("X-PAYMENT", header))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 403);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Invalid or expired payment" }));
    }

    let results: Vec<Value> = state
        .log
        .recent(4)
        .into_iter()
        .map(|e| e.attributes["result"].clone())
        .collect();
    assert_eq!(
        results,
        vec![
            json!("malformed_proof"),
            json!("wrong_recipient"),
            json!("insufficient_amount"),
            json!("expired_proof"),
        ]
    );
}

#[actix_rt::test]
async fn test_facilitator_rejection_is_forbidden() {
    let state = make_state(false, false);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/premium")
        .insert_header(("X-PAYMENT", payment_header(RECIPIENT, "15000", now() + 3600)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_rt::test]
async fn test_facilitator_timeout_is_forbidden() {
    let state = make_state(true, true);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/premium")
        .insert_header(("X-PAYMENT", payment_header(RECIPIENT, "15000", now() + 3600)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
    assert_eq!(state.log.recent(1)[0].attributes["result"], "unverified");
}

#[actix_rt::test]
async fn test_interactions_and_stats() {
    let state = make_state(true, false);
    let app = app!(state);

    for _ in 0..3 {
        let req = test::TestRequest::post().uri("/api/premium").to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::get()
        .uri("/api/interactions?n=2")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["type"], "payment");
    assert_eq!(entries[0]["result"], "challenge");
    assert!(entries[0]["timestamp"].is_string());

    let req = test::TestRequest::get()
        .uri("/api/interactions/stats")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["by_type"]["payment"], 3);
}

#[actix_rt::test]
async fn test_interactions_non_positive_n_is_empty() {
    let state = make_state(true, false);
    let app = app!(state);

    let req = test::TestRequest::post().uri("/api/premium").to_request();
    test::call_service(&app, req).await;
    assert_eq!(state.log.len(), 1);

    for uri in ["/api/interactions?n=-1", "/api/interactions?n=0"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!([]));
    }
}

#[actix_rt::test]
async fn test_metrics_forbidden_by_default() {
    let state = make_state(true, false);
    let app = app!(state);

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_rt::test]
async fn test_metrics_requires_bearer_token() {
    let state = web::Data::new(
        build_state(true, false).with_metrics_access(Some("token123".to_string()), false),
    );
    let app = app!(state);

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::get()
        .uri("/metrics")
        .insert_header(("Authorization", "Bearer token123"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}
