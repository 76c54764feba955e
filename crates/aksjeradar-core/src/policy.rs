// crates/aksjeradar-core/src/policy.rs
// ============================================================================
// Module: Exemption Policy
// Description: Route, path-prefix, and email exemptions for the access gate.
// Purpose: Hold the immutable allowlists consulted before premium checks.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Exemptions are exceptions only: a route, path, or email that is not listed
//! falls through to the restricted default. The route set is fixed at compile
//! time; open path prefixes and exempt emails come from deployment config and
//! are replaced wholesale on reload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Route name used for static assets.
pub const STATIC_ROUTE: &str = "static";

/// Routes reachable without authentication or premium access.
pub const EXEMPT_ROUTES: &[&str] = &[
    "main.register",
    "main.login",
    "main.logout",
    "main.privacy",
    "main.subscription",
    "main.demo",
    "main.api_trial_status",
    STATIC_ROUTE,
    "main.demo_ping",
    "main.demo_echo",
    "main.market_overview",
    "main.stock_details",
];

/// Path prefixes that stay public regardless of route naming.
pub const DEFAULT_OPEN_PATH_PREFIXES: &[&str] = &["/demo", "/market-overview"];

// ============================================================================
// SECTION: Route Exemptions
// ============================================================================

/// Returns true when `route` bypasses the gate.
#[must_use]
pub fn is_exempt_route(route: &str) -> bool {
    route == STATIC_ROUTE || EXEMPT_ROUTES.contains(&route)
}

// ============================================================================
// SECTION: Exemption Policy
// ============================================================================

/// Runtime-configurable exemptions.
///
/// # Invariants
/// - Stored emails are trimmed and ASCII-lowercased.
/// - Empty entries are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExemptionPolicy {
    /// Normalized exempt emails.
    exempt_emails: BTreeSet<String>,
    /// Open path prefixes, in configuration order.
    open_path_prefixes: Vec<String>,
}

impl Default for ExemptionPolicy {
    fn default() -> Self {
        Self {
            exempt_emails: BTreeSet::new(),
            open_path_prefixes: DEFAULT_OPEN_PATH_PREFIXES
                .iter()
                .map(|prefix| (*prefix).to_string())
                .collect(),
        }
    }
}

impl ExemptionPolicy {
    /// Builds a policy with the given exempt emails and default open prefixes.
    #[must_use]
    pub fn new<I, S>(exempt_emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let exempt_emails = exempt_emails
            .into_iter()
            .map(|email| normalize_email(email.as_ref()))
            .filter(|email| !email.is_empty())
            .collect();
        Self {
            exempt_emails,
            ..Self::default()
        }
    }

    /// Replaces the open path prefixes.
    #[must_use]
    pub fn with_open_path_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.open_path_prefixes = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|prefix: &String| !prefix.is_empty())
            .collect();
        self
    }

    /// Returns true when `path` starts with any open prefix.
    #[must_use]
    pub fn is_open_path(&self, path: &str) -> bool {
        self.open_path_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Returns true when `email` is on the exempt list.
    #[must_use]
    pub fn is_exempt_email(&self, email: &str) -> bool {
        let normalized = normalize_email(email);
        !normalized.is_empty() && self.exempt_emails.contains(&normalized)
    }

    /// Returns the number of exempt emails.
    #[must_use]
    pub fn exempt_email_count(&self) -> usize {
        self.exempt_emails.len()
    }

    /// Returns the configured open path prefixes.
    #[must_use]
    pub fn open_path_prefixes(&self) -> &[String] {
        &self.open_path_prefixes
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Normalizes an email for allowlist comparison.
fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
