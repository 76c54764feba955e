// crates/aksjeradar-web/src/middleware.rs
// ============================================================================
// Module: Gate Middleware
// Description: axum middleware applying the access gate to protected routes.
// Purpose: Map gate decisions to pass-through, redirects, or JSON errors.
// Dependencies: aksjeradar-core, aksjeradar-config, axum, serde, url
// ============================================================================

//! ## Overview
//! [`protect`] installs [`enforce_access`] as a `route_layer`, so it runs after
//! routing and sees the matched path pattern. For every request the
//! middleware resolves the principal, classifies the route and response
//! format, and asks the gate for a decision. Allowed requests carry the
//! resolved principal downstream as a [`RequestPrincipal`] extension.
//!
//! Denials map to:
//! - `RedirectLogin`: `302` to the login URL with `next` set to the request
//!   path and query;
//! - `RedirectPricing`: `302` to the pricing URL;
//! - `DenyJson`: `401` or `403` with `{"error": reason}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use aksjeradar_config::AccessConfig;
use aksjeradar_core::AccessGate;
use aksjeradar_core::Decision;
use aksjeradar_core::DenyReason;
use aksjeradar_core::Principal;
use axum::Json;
use axum::Router;
use axum::extract::MatchedPath;
use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::middleware::Next;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;
use url::form_urlencoded;

use crate::principal::PrincipalResolver;
use crate::request::RouteTable;
use crate::request::wants_json;
use crate::telemetry::GateMetricEvent;
use crate::telemetry::GateMetrics;
use crate::telemetry::NoopMetrics;

// ============================================================================
// SECTION: Redirect Targets
// ============================================================================

/// Destinations for browser redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTargets {
    /// Login page URL.
    pub login_url: String,
    /// Pricing page URL.
    pub pricing_url: String,
}

impl Default for RedirectTargets {
    fn default() -> Self {
        Self {
            login_url: "/login".to_string(),
            pricing_url: "/pricing".to_string(),
        }
    }
}

impl RedirectTargets {
    /// Builds redirect targets from access configuration.
    #[must_use]
    pub fn from_config(access: &AccessConfig) -> Self {
        Self {
            login_url: access.login_url.clone(),
            pricing_url: access.pricing_url.clone(),
        }
    }

    /// Returns the login URL carrying the original target as `next`.
    #[must_use]
    pub fn login_location(&self, next: &str) -> String {
        let separator = if self.login_url.contains('?') { '&' } else { '?' };
        let encoded: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
        format!("{}{separator}next={encoded}", self.login_url)
    }
}

// ============================================================================
// SECTION: Gate State
// ============================================================================

/// Principal attached to requests that passed the gate.
#[derive(Clone)]
pub struct RequestPrincipal(pub Arc<dyn Principal>);

/// Shared state for the gate middleware.
pub struct GateState {
    /// Access gate with the live policy snapshot.
    gate: Arc<AccessGate>,
    /// Principal resolver for incoming requests.
    resolver: Arc<dyn PrincipalResolver>,
    /// Route pattern to endpoint name mapping.
    routes: RouteTable,
    /// Browser redirect destinations.
    redirects: RedirectTargets,
    /// Decision metrics sink.
    metrics: Arc<dyn GateMetrics>,
}

impl GateState {
    /// Builds gate state with the Aksjeradar route table and default targets.
    #[must_use]
    pub fn new(gate: Arc<AccessGate>, resolver: Arc<dyn PrincipalResolver>) -> Self {
        Self {
            gate,
            resolver,
            routes: RouteTable::aksjeradar(),
            redirects: RedirectTargets::default(),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Replaces the route table.
    #[must_use]
    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Replaces the redirect targets.
    #[must_use]
    pub fn with_redirects(mut self, redirects: RedirectTargets) -> Self {
        self.redirects = redirects;
        self
    }

    /// Replaces the metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn GateMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns the access gate.
    #[must_use]
    pub const fn gate(&self) -> &Arc<AccessGate> {
        &self.gate
    }
}

// ============================================================================
// SECTION: Middleware
// ============================================================================

/// Wraps every route registered so far on `router` with the access gate.
///
/// Routes added after this call are not gated.
pub fn protect<S>(router: Router<S>, state: Arc<GateState>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(from_fn_with_state(state, enforce_access))
}

/// Applies the access gate to a single request.
pub async fn enforce_access(
    State(state): State<Arc<GateState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let path = request.uri().path().to_string();
    let next_target =
        request.uri().path_and_query().map_or_else(|| path.clone(), |target| target.to_string());
    let matched =
        request.extensions().get::<MatchedPath>().map(|matched| matched.as_str().to_string());
    let route = state.routes.resolve(matched.as_deref(), &path);
    let headers = request.headers();
    let accept_json = wants_json(headers);
    let principal = state.resolver.resolve(headers).await;
    let assessment = state.gate.assess(principal.as_ref(), &route, &path, accept_json);

    let event = GateMetricEvent {
        route,
        decision: assessment.decision,
        basis: assessment.basis,
        accept_json,
    };
    state.metrics.record_decision(&event);
    state.metrics.record_latency(&event, started.elapsed());

    match assessment.decision {
        Decision::Allow => {
            request.extensions_mut().insert(RequestPrincipal(principal));
            next.run(request).await
        }
        Decision::RedirectLogin => found(state.redirects.login_location(&next_target)),
        Decision::RedirectPricing => found(state.redirects.pricing_url.clone()),
        Decision::DenyJson(reason) => deny_json(reason),
    }
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// JSON body for denied API calls.
#[derive(Debug, Serialize)]
struct DenyBody {
    /// Machine-readable denial reason.
    error: &'static str,
}

/// Builds a `302 Found` redirect.
fn found(location: String) -> Response {
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}

/// Builds the JSON denial for API callers.
fn deny_json(reason: DenyReason) -> Response {
    let status = match reason {
        DenyReason::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        DenyReason::PremiumRequired => StatusCode::FORBIDDEN,
    };
    (
        status,
        Json(DenyBody {
            error: reason.as_str(),
        }),
    )
        .into_response()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
