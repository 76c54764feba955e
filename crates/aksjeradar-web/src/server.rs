// crates/aksjeradar-web/src/server.rs
// ============================================================================
// Module: Web Server
// Description: HTTP server hosting the gated Aksjeradar endpoints.
// Purpose: Wire config, audit, principal resolution, and reload into axum.
// Dependencies: aksjeradar-core, aksjeradar-config, axum, tokio
// ============================================================================

//! ## Overview
//! [`WebServer`] builds the access gate from configuration and serves the
//! built-in endpoints. `/healthz` sits outside the gate; every other route is
//! registered on the protected router and passes through
//! [`crate::middleware::enforce_access`]. When a config path is known the
//! server also runs the policy reloader.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use aksjeradar_config::AksjeradarConfig;
use aksjeradar_config::AuditConfig;
use aksjeradar_core::AccessGate;
use aksjeradar_core::AccessLevel;
use aksjeradar_core::FileAuditSink;
use aksjeradar_core::GateAuditSink;
use aksjeradar_core::NoopAuditSink;
use aksjeradar_core::StderrAuditSink;
use axum::Extension;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use axum::routing::post;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::middleware::GateState;
use crate::middleware::RedirectTargets;
use crate::middleware::RequestPrincipal;
use crate::middleware::protect;
use crate::principal::SessionPrincipalResolver;
use crate::reload::spawn_config_reloader;

// ============================================================================
// SECTION: Web Server
// ============================================================================

/// Aksjeradar web server instance.
pub struct WebServer {
    /// Server configuration.
    config: AksjeradarConfig,
    /// Config file to watch for policy reloads.
    config_path: Option<PathBuf>,
    /// Shared gate middleware state.
    state: Arc<GateState>,
}

impl WebServer {
    /// Builds a server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WebServerError`] when configuration or the audit sink is
    /// invalid.
    pub fn from_config(
        config: AksjeradarConfig,
        config_path: Option<PathBuf>,
    ) -> Result<Self, WebServerError> {
        config.validate().map_err(|err| WebServerError::Config(err.to_string()))?;
        let audit = build_audit_sink(&config.audit)?;
        let gate = Arc::new(AccessGate::new(config.exemption_policy(), audit));
        let resolver = SessionPrincipalResolver::from_config(&config.sessions)
            .map_err(|err| WebServerError::Config(err.to_string()))?;
        emit_session_fixture_warning(resolver.session_count());
        let state = GateState::new(gate, Arc::new(resolver))
            .with_redirects(RedirectTargets::from_config(&config.access));
        Ok(Self {
            config,
            config_path,
            state: Arc::new(state),
        })
    }

    /// Returns the access gate.
    #[must_use]
    pub fn gate(&self) -> Arc<AccessGate> {
        Arc::clone(self.state.gate())
    }

    /// Returns the application router.
    #[must_use]
    pub fn router(&self) -> Router {
        app_router(Arc::clone(&self.state))
    }

    /// Serves HTTP requests until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`WebServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), WebServerError> {
        let addr =
            self.config.server.bind_addr().map_err(|err| WebServerError::Config(err.to_string()))?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|_| WebServerError::Transport("http bind failed".to_string()))?;
        let reloader = self.config_path.clone().map(|path| {
            spawn_config_reloader(
                path,
                self.gate(),
                Duration::from_millis(self.config.server.reload_interval_ms),
                self.config.source_modified_at,
            )
        });
        let result = axum::serve(listener, self.router())
            .await
            .map_err(|_| WebServerError::Transport("http server failed".to_string()));
        if let Some(handle) = reloader {
            handle.abort();
        }
        result
    }
}

/// Builds the audit sink selected by configuration.
fn build_audit_sink(audit: &AuditConfig) -> Result<Arc<dyn GateAuditSink>, WebServerError> {
    if !audit.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match &audit.log_path {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| WebServerError::Init(format!("audit log open failed: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

/// Warns when development session fixtures are being served.
fn emit_session_fixture_warning(count: usize) {
    if count > 0 {
        let _ = writeln!(
            io::stderr(),
            "aksjeradar: WARNING: serving {count} configured session fixture(s); use a real \
             principal resolver in production"
        );
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the Aksjeradar router over the given gate state.
pub fn app_router(state: Arc<GateState>) -> Router {
    let gated = Router::new()
        .route("/api/trial-status", get(trial_status))
        .route("/api/access", get(access_summary))
        .route("/demo/ping", get(demo_ping))
        .route("/demo/echo", post(demo_echo));
    protect(gated, Arc::clone(&state)).route("/healthz", get(healthz)).with_state(state)
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Plain status body.
#[derive(Debug, Serialize)]
struct StatusBody {
    /// Status label.
    status: &'static str,
}

/// Trial and access status for the current caller.
#[derive(Debug, Serialize)]
struct TrialStatus {
    /// Whether the caller has a session.
    authenticated: bool,
    /// Access classification.
    access_level: AccessLevel,
    /// Whether premium content is unrestricted for the caller.
    unlimited: bool,
}

/// Account access summary.
#[derive(Debug, Serialize)]
struct AccessSummary {
    /// Account email.
    email: Option<String>,
    /// Access classification.
    access_level: AccessLevel,
}

/// Echoed demo payload.
#[derive(Debug, Serialize)]
struct EchoBody {
    /// Request body as received.
    echo: Value,
}

/// Liveness probe.
async fn healthz() -> Json<StatusBody> {
    Json(StatusBody {
        status: "ok",
    })
}

/// Reports the caller's access level.
async fn trial_status(
    State(state): State<Arc<GateState>>,
    Extension(RequestPrincipal(principal)): Extension<RequestPrincipal>,
) -> Json<TrialStatus> {
    let access_level = state.gate().access_level(principal.as_ref());
    Json(TrialStatus {
        authenticated: principal.is_authenticated(),
        access_level,
        unlimited: access_level.is_unlimited(),
    })
}

/// Premium endpoint summarizing the caller's account access.
async fn access_summary(
    State(state): State<Arc<GateState>>,
    Extension(RequestPrincipal(principal)): Extension<RequestPrincipal>,
) -> Json<AccessSummary> {
    Json(AccessSummary {
        email: principal.email().map(str::to_string),
        access_level: state.gate().access_level(principal.as_ref()),
    })
}

/// Demo liveness endpoint.
async fn demo_ping() -> Json<StatusBody> {
    Json(StatusBody {
        status: "ok",
    })
}

/// Demo endpoint echoing its JSON body.
async fn demo_echo(Json(payload): Json<Value>) -> Json<EchoBody> {
    Json(EchoBody {
        echo: payload,
    })
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Web server errors.
#[derive(Debug, Error)]
pub enum WebServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
