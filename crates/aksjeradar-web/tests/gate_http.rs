// crates/aksjeradar-web/tests/gate_http.rs
// ============================================================================
// Module: Gate HTTP Tests
// Description: Drive gated routers through the middleware stack.
// Purpose: Verify redirects, JSON denials, fail-open, and downstream access.
// Dependencies: aksjeradar-core, aksjeradar-web, axum, tower
// ============================================================================

//! HTTP-level access gate tests for aksjeradar-web.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions and helpers."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use aksjeradar_core::AccessGate;
use aksjeradar_core::Decision;
use aksjeradar_core::DecisionBasis;
use aksjeradar_core::ExemptionPolicy;
use aksjeradar_core::NoopAuditSink;
use aksjeradar_core::PremiumCheckError;
use aksjeradar_core::Principal;
use aksjeradar_core::Subscription;
use aksjeradar_web::GateMetricEvent;
use aksjeradar_web::GateMetrics;
use aksjeradar_web::GateState;
use aksjeradar_web::PrincipalResolver;
use aksjeradar_web::RedirectTargets;
use aksjeradar_web::RouteTable;
use aksjeradar_web::SessionPrincipalResolver;
use aksjeradar_web::protect;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::HeaderMap;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::response::Response;
use axum::routing::get;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const STAFF_EMAIL: &str = "staff@aksjeradar.trade";

fn session_resolver() -> SessionPrincipalResolver {
    SessionPrincipalResolver::default()
        .with_session("free-token", "free@example.com", Subscription::none())
        .with_session("premium-token", "premium@example.com", Subscription::lifetime())
        .with_session("staff-token", " STAFF@aksjeradar.trade ", Subscription::none())
}

fn gated_app(resolver: Arc<dyn PrincipalResolver>, metrics: Arc<dyn GateMetrics>) -> Router {
    let gate = Arc::new(AccessGate::new(
        ExemptionPolicy::new([STAFF_EMAIL]),
        Arc::new(NoopAuditSink),
    ));
    let state = GateState::new(gate, resolver)
        .with_routes(RouteTable::aksjeradar().with_route("/portfolio", "portfolio.index"))
        .with_metrics(metrics);
    let router = Router::new()
        .route("/stocks/details/{ticker}", get(|| async { "stock details" }))
        .route("/portfolio", get(|| async { "portfolio" }))
        .route("/demo/ping", get(|| async { "pong" }))
        .route("/demo-archive", get(|| async { "archive" }))
        .route("/static/{*file}", get(|| async { "asset" }));
    protect(router, Arc::new(state)).route("/healthz", get(|| async { "ok" }))
}

fn app() -> Router {
    gated_app(Arc::new(session_resolver()), Arc::new(RecordingMetrics::default()))
}

async fn send(router: Router, request: Request<Body>) -> Response {
    router.oneshot(request).await.unwrap()
}

fn get_request(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers().get(LOCATION).and_then(|value| value.to_str().ok()).unwrap_or_default()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[derive(Default)]
struct RecordingMetrics {
    events: Mutex<Vec<GateMetricEvent>>,
}

impl GateMetrics for RecordingMetrics {
    fn record_decision(&self, event: &GateMetricEvent) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn record_latency(&self, _event: &GateMetricEvent, _latency: Duration) {}
}

#[derive(Clone, Copy)]
enum Failure {
    Error,
    Panic,
    EmailPanic,
}

struct BrokenPrincipal {
    failure: Failure,
}

impl Principal for BrokenPrincipal {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn email(&self) -> Option<&str> {
        match self.failure {
            Failure::EmailPanic => panic!("account email unreadable"),
            Failure::Error | Failure::Panic => Some("broken@example.com"),
        }
    }

    fn has_premium_access(&self) -> Result<bool, PremiumCheckError> {
        match self.failure {
            Failure::Error => Err(PremiumCheckError::Unavailable("billing offline".to_string())),
            Failure::Panic => panic!("subscription record corrupted"),
            Failure::EmailPanic => Ok(false),
        }
    }
}

struct BrokenResolver {
    failure: Failure,
}

#[async_trait]
impl PrincipalResolver for BrokenResolver {
    async fn resolve(&self, _headers: &HeaderMap) -> Arc<dyn Principal> {
        Arc::new(BrokenPrincipal {
            failure: self.failure,
        })
    }
}

// ============================================================================
// SECTION: Premium Route Scenario
// ============================================================================

#[tokio::test]
async fn anonymous_browser_is_sent_to_login_with_next() {
    let response = send(app(), get_request("/stocks/details/EQNR.OL", &[])).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/login?next=%2Fstocks%2Fdetails%2FEQNR.OL");
}

#[tokio::test]
async fn free_account_is_sent_to_pricing() {
    let request =
        get_request("/stocks/details/EQNR.OL", &[("cookie", "aksjeradar_session=free-token")]);
    let response = send(app(), request).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/pricing");
}

#[tokio::test]
async fn premium_account_reaches_handler() {
    let request =
        get_request("/stocks/details/EQNR.OL", &[("authorization", "Bearer premium-token")]);
    let response = send(app(), request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "stock details");
}

#[tokio::test]
async fn exempt_email_reaches_handler_without_subscription() {
    let request = get_request("/portfolio", &[("cookie", "aksjeradar_session=staff-token")]);
    let response = send(app(), request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// SECTION: JSON Callers
// ============================================================================

#[tokio::test]
async fn anonymous_json_caller_gets_401() {
    let request = get_request("/portfolio", &[("accept", "application/json")]);
    let response = send(app(), request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "authentication_required"})
    );
}

#[tokio::test]
async fn free_ajax_caller_gets_403() {
    let request = get_request(
        "/portfolio",
        &[("x-requested-with", "XMLHttpRequest"), ("cookie", "aksjeradar_session=free-token")],
    );
    let response = send(app(), request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await, serde_json::json!({"error": "premium_required"}));
}

// ============================================================================
// SECTION: Exemptions
// ============================================================================

#[tokio::test]
async fn exempt_routes_and_open_prefixes_pass_anonymously() {
    for uri in ["/demo/ping", "/demo-archive", "/static/css/app.css"] {
        let response = send(app(), get_request(uri, &[("accept", "application/json")])).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn routes_registered_after_protect_are_ungated() {
    let response = send(app(), get_request("/healthz", &[])).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_paths_stay_404() {
    let response = send(app(), get_request("/nope", &[])).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// SECTION: Fail-Open
// ============================================================================

#[tokio::test]
async fn premium_check_error_fails_open() {
    let resolver = Arc::new(BrokenResolver {
        failure: Failure::Error,
    });
    let router = gated_app(resolver, Arc::new(RecordingMetrics::default()));
    let response = send(router, get_request("/stocks/details/EQNR.OL", &[])).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn premium_check_panic_fails_open() {
    let resolver = Arc::new(BrokenResolver {
        failure: Failure::Panic,
    });
    let router = gated_app(resolver, Arc::new(RecordingMetrics::default()));
    let request = get_request("/portfolio", &[("accept", "application/json")]);
    let response = send(router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn email_lookup_panic_fails_open() {
    let resolver = Arc::new(BrokenResolver {
        failure: Failure::EmailPanic,
    });
    let metrics = Arc::new(RecordingMetrics::default());
    let sink: Arc<dyn GateMetrics> = Arc::clone(&metrics) as Arc<dyn GateMetrics>;
    let router = gated_app(resolver, sink);
    let request = get_request("/stocks/details/EQNR.OL", &[("accept", "application/json")]);
    let response = send(router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "stock details");

    let events = metrics.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].basis, DecisionBasis::FailOpen);
}

// ============================================================================
// SECTION: Metrics and Redirect Targets
// ============================================================================

#[tokio::test]
async fn metrics_receive_one_event_per_gated_request() {
    let metrics = Arc::new(RecordingMetrics::default());
    let sink: Arc<dyn GateMetrics> = Arc::clone(&metrics) as Arc<dyn GateMetrics>;
    let router = gated_app(Arc::new(session_resolver()), sink);
    let _ = send(router.clone(), get_request("/stocks/details/EQNR.OL", &[])).await;
    let _ = send(router.clone(), get_request("/demo/ping", &[])).await;
    let _ = send(router, get_request("/healthz", &[])).await;

    let events = metrics.events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].route, "stocks.details");
    assert_eq!(events[0].decision, Decision::RedirectLogin);
    assert_eq!(events[0].basis, DecisionBasis::Unauthenticated);
    assert_eq!(events[1].route, "main.demo_ping");
    assert_eq!(events[1].basis, DecisionBasis::ExemptRoute);
}

#[tokio::test]
async fn configured_redirect_targets_are_used() {
    let gate = Arc::new(AccessGate::new(ExemptionPolicy::default(), Arc::new(NoopAuditSink)));
    let state = GateState::new(gate, Arc::new(session_resolver())).with_redirects(
        RedirectTargets {
            login_url: "https://aksjeradar.trade/auth/login".to_string(),
            pricing_url: "https://aksjeradar.trade/pricing".to_string(),
        },
    );
    let router = protect(
        Router::new().route("/stocks/details/{ticker}", get(|| async { "stock details" })),
        Arc::new(state),
    );

    let anonymous = send(router.clone(), get_request("/stocks/details/DNB.OL?tab=news", &[])).await;
    assert_eq!(
        location(&anonymous),
        "https://aksjeradar.trade/auth/login?next=%2Fstocks%2Fdetails%2FDNB.OL%3Ftab%3Dnews"
    );

    let request =
        get_request("/stocks/details/DNB.OL", &[("cookie", "aksjeradar_session=free-token")]);
    let free = send(router, request).await;
    assert_eq!(location(&free), "https://aksjeradar.trade/pricing");
}
