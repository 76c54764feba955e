// crates/aksjeradar-web/src/lib.rs
// ============================================================================
// Module: Aksjeradar Web
// Description: HTTP integration of the Aksjeradar access gate.
// Purpose: Apply the gate as axum middleware and serve the gated app.
// Dependencies: aksjeradar-core, aksjeradar-config, axum, tokio
// ============================================================================

//! ## Overview
//! Aksjeradar web wraps protected routers in a middleware stage that resolves
//! the request principal, classifies the request, asks
//! [`aksjeradar_core::AccessGate`] for a decision, and turns denials into
//! redirects or JSON errors. The gate never produces a 5xx response.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod middleware;
pub mod principal;
pub mod reload;
pub mod request;
pub mod server;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use middleware::GateState;
pub use middleware::RedirectTargets;
pub use middleware::RequestPrincipal;
pub use middleware::enforce_access;
pub use middleware::protect;
pub use principal::PrincipalResolver;
pub use principal::SESSION_COOKIE;
pub use principal::SessionPrincipalResolver;
pub use reload::ConfigWatcher;
pub use reload::ReloadOutcome;
pub use reload::spawn_config_reloader;
pub use request::RouteTable;
pub use request::wants_json;
pub use server::WebServer;
pub use server::WebServerError;
pub use server::app_router;
pub use telemetry::GateMetricEvent;
pub use telemetry::GateMetrics;
pub use telemetry::NoopMetrics;
