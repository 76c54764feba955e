// crates/aksjeradar-web/tests/server_endpoints.rs
// ============================================================================
// Module: Server Endpoint Tests
// Description: Exercise the configured app router end to end.
// Purpose: Validate config wiring, session fixtures, and status endpoints.
// Dependencies: aksjeradar-config, aksjeradar-web, axum, tower
// ============================================================================

//! Built-in endpoint tests for the aksjeradar-web server.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers."
)]

use aksjeradar_config::AksjeradarConfig;
use aksjeradar_web::WebServer;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use serde_json::json;
use tower::ServiceExt;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const CONFIG: &str = r#"
[access]
exempt_emails = ["staff@aksjeradar.trade"]
login_url = "/auth/login"

[audit]
enabled = false

[[sessions]]
token = "free"
email = "free@example.com"

[[sessions]]
token = "premium"
email = "premium@example.com"
has_subscription = true
subscription_type = "yearly"
subscription_end = "2999-12-31T23:59:59Z"

[[sessions]]
token = "expired"
email = "expired@example.com"
has_subscription = true
subscription_type = "monthly"
subscription_end = "2001-01-31T00:00:00Z"

[[sessions]]
token = "staff"
email = "Staff@Aksjeradar.trade"
"#;

fn router() -> Router {
    let config = AksjeradarConfig::from_toml_str(CONFIG).unwrap();
    WebServer::from_config(config, None).unwrap().router()
}

async fn call(method: &str, uri: &str, headers: &[(&str, &str)], body: Body) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    router().oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// SECTION: Ungated and Exempt Endpoints
// ============================================================================

#[tokio::test]
async fn healthz_is_ungated() {
    let response = call("GET", "/healthz", &[], Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn trial_status_reports_anonymous_caller() {
    let response = call("GET", "/api/trial-status", &[], Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"authenticated": false, "access_level": "anonymous", "unlimited": false})
    );
}

#[tokio::test]
async fn trial_status_classifies_accounts() {
    let cases = [
        ("free", "restricted", false),
        ("premium", "subscriber", true),
        ("expired", "restricted", false),
        ("staff", "exempt", true),
    ];
    for (token, level, unlimited) in cases {
        let cookie = format!("aksjeradar_session={token}");
        let response =
            call("GET", "/api/trial-status", &[("cookie", cookie.as_str())], Body::empty()).await;
        let body = json_body(response).await;
        assert_eq!(body["access_level"], level, "{token}");
        assert_eq!(body["unlimited"], unlimited, "{token}");
    }
}

#[tokio::test]
async fn demo_endpoints_are_open() {
    let ping = call("GET", "/demo/ping", &[("accept", "application/json")], Body::empty()).await;
    assert_eq!(ping.status(), StatusCode::OK);

    let echo = call(
        "POST",
        "/demo/echo",
        &[("content-type", "application/json")],
        Body::from(r#"{"ticker":"EQNR.OL"}"#),
    )
    .await;
    assert_eq!(echo.status(), StatusCode::OK);
    assert_eq!(json_body(echo).await, json!({"echo": {"ticker": "EQNR.OL"}}));
}

// ============================================================================
// SECTION: Gated Endpoint
// ============================================================================

#[tokio::test]
async fn access_endpoint_redirects_anonymous_browser_to_configured_login() {
    let response = call("GET", "/api/access", &[], Body::empty()).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers().get(LOCATION).unwrap().to_str().unwrap();
    assert_eq!(location, "/auth/login?next=%2Fapi%2Faccess");
}

#[tokio::test]
async fn access_endpoint_denies_json_callers() {
    let anonymous =
        call("GET", "/api/access", &[("accept", "application/json")], Body::empty()).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let expired = call(
        "GET",
        "/api/access",
        &[("accept", "application/json"), ("authorization", "Bearer expired")],
        Body::empty(),
    )
    .await;
    assert_eq!(expired.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(expired).await, json!({"error": "premium_required"}));
}

#[tokio::test]
async fn access_endpoint_serves_premium_and_exempt_accounts() {
    let premium =
        call("GET", "/api/access", &[("authorization", "Bearer premium")], Body::empty()).await;
    assert_eq!(premium.status(), StatusCode::OK);
    assert_eq!(
        json_body(premium).await,
        json!({"email": "premium@example.com", "access_level": "subscriber"})
    );

    let staff =
        call("GET", "/api/access", &[("cookie", "aksjeradar_session=staff")], Body::empty()).await;
    assert_eq!(staff.status(), StatusCode::OK);
}

// ============================================================================
// SECTION: Construction
// ============================================================================

#[test]
fn from_config_rejects_unwritable_audit_log() {
    let mut config = AksjeradarConfig::default();
    config.audit.log_path = Some("/nonexistent-aksjeradar-dir/audit.log".to_string());
    let Err(err) = WebServer::from_config(config, None) else {
        panic!("expected audit init failure");
    };
    assert!(err.to_string().contains("audit log open failed"));
}

#[test]
fn from_config_rejects_invalid_config() {
    let mut config = AksjeradarConfig::default();
    config.access.login_url = "//evil.example".to_string();
    let Err(err) = WebServer::from_config(config, None) else {
        panic!("expected config failure");
    };
    assert!(err.to_string().starts_with("config error"));
}
