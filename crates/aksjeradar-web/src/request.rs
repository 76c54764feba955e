// crates/aksjeradar-web/src/request.rs
// ============================================================================
// Module: Request Classification
// Description: Route descriptors and response-format detection.
// Purpose: Derive the gate inputs that come from the HTTP request itself.
// Dependencies: axum
// ============================================================================

//! ## Overview
//! axum routes by path pattern, not by symbolic endpoint name. [`RouteTable`]
//! maps matched patterns to the endpoint names the exemption list is written
//! in. Static assets always resolve to `static`. JSON callers are detected
//! from `X-Requested-With`, `Content-Type`, and `Accept`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use aksjeradar_core::STATIC_ROUTE;
use axum::http::HeaderMap;
use axum::http::header::ACCEPT;
use axum::http::header::CONTENT_TYPE;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Path prefix served as static assets.
const STATIC_PATH_PREFIX: &str = "/static/";
/// Header set by browser XHR helpers.
const X_REQUESTED_WITH: &str = "x-requested-with";
/// Media type that marks a JSON caller.
const JSON_MEDIA_TYPE: &str = "application/json";

// ============================================================================
// SECTION: Route Table
// ============================================================================

/// Mapping from axum path patterns to symbolic endpoint names.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    /// Endpoint names keyed by path pattern.
    names: BTreeMap<String, String>,
}

impl RouteTable {
    /// Builds an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table for the Aksjeradar site layout.
    #[must_use]
    pub fn aksjeradar() -> Self {
        Self::new()
            .with_route("/register", "main.register")
            .with_route("/login", "main.login")
            .with_route("/logout", "main.logout")
            .with_route("/privacy", "main.privacy")
            .with_route("/subscription", "main.subscription")
            .with_route("/demo", "main.demo")
            .with_route("/demo/ping", "main.demo_ping")
            .with_route("/demo/echo", "main.demo_echo")
            .with_route("/api/trial-status", "main.api_trial_status")
            .with_route("/market-overview", "main.market_overview")
            .with_route("/stock/{ticker}", "main.stock_details")
            .with_route("/stocks/details/{ticker}", "stocks.details")
            .with_route("/api/access", "api.access")
    }

    /// Adds or replaces a pattern mapping.
    #[must_use]
    pub fn with_route(mut self, pattern: impl Into<String>, name: impl Into<String>) -> Self {
        self.names.insert(pattern.into(), name.into());
        self
    }

    /// Returns the route descriptor for a request.
    ///
    /// Unmapped patterns fall back to the pattern itself, then the raw path.
    #[must_use]
    pub fn resolve(&self, matched_pattern: Option<&str>, path: &str) -> String {
        if path.starts_with(STATIC_PATH_PREFIX) {
            return STATIC_ROUTE.to_string();
        }
        match matched_pattern {
            Some(pattern) => self.names.get(pattern).cloned().unwrap_or_else(|| pattern.to_string()),
            None => path.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Response Format
// ============================================================================

/// Returns true when the caller expects a JSON response.
#[must_use]
pub fn wants_json(headers: &HeaderMap) -> bool {
    let header_text = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
    if header_text(X_REQUESTED_WITH).is_some_and(|value| value == "XMLHttpRequest") {
        return true;
    }
    [CONTENT_TYPE.as_str(), ACCEPT.as_str()].into_iter().any(|name| {
        header_text(name).is_some_and(|value| value.trim_start().starts_with(JSON_MEDIA_TYPE))
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
