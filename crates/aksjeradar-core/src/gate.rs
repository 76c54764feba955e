// crates/aksjeradar-core/src/gate.rs
// ============================================================================
// Module: Access Gate
// Description: Per-request premium access decision with fail-open recovery.
// Purpose: Decide allow / redirect / deny before protected handlers run.
// Dependencies: crate::{audit, decision, policy, principal}
// ============================================================================

//! ## Overview
//! [`assess`] is the pure decision function. Rules are applied in order and
//! the first match wins:
//!
//! 1. exempt route (including `static`) allows;
//! 2. open path prefix allows;
//! 3. unauthenticated principals are sent to login (or 401 for JSON callers);
//! 4. premium access allows;
//! 5. exempt email allows;
//! 6. everything else is sent to pricing (or 403 for JSON callers).
//!
//! Any failure in steps 4 and 5, including a panic inside the principal, is
//! recovered and resolved to allow. [`AccessGate`] wraps [`assess`] with an
//! atomically swappable policy snapshot and audit emission.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use serde::Serialize;

use crate::audit::GateAuditEvent;
use crate::audit::GateAuditSink;
use crate::audit::PolicyReloadEvent;
use crate::audit::email_fingerprint;
use crate::decision::Assessment;
use crate::decision::Decision;
use crate::decision::DecisionBasis;
use crate::decision::DenyReason;
use crate::policy::ExemptionPolicy;
use crate::policy::is_exempt_route;
use crate::principal::PremiumCheckError;
use crate::principal::Principal;

// ============================================================================
// SECTION: Decision Function
// ============================================================================

/// Evaluates the gate rules against a fixed policy snapshot.
#[must_use]
pub fn assess(
    policy: &ExemptionPolicy,
    principal: &dyn Principal,
    route: &str,
    path: &str,
    accept_json: bool,
) -> Assessment {
    if is_exempt_route(route) {
        return Assessment::new(Decision::Allow, DecisionBasis::ExemptRoute);
    }
    if policy.is_open_path(path) {
        return Assessment::new(Decision::Allow, DecisionBasis::OpenPrefix);
    }
    if !principal.is_authenticated() {
        let decision = if accept_json {
            Decision::DenyJson(DenyReason::AuthenticationRequired)
        } else {
            Decision::RedirectLogin
        };
        return Assessment::new(decision, DecisionBasis::Unauthenticated);
    }
    match contain(|| premium_or_exempt(policy, principal)) {
        Ok(Some(basis)) => Assessment::new(Decision::Allow, basis),
        Ok(None) => {
            let decision = if accept_json {
                Decision::DenyJson(DenyReason::PremiumRequired)
            } else {
                Decision::RedirectPricing
            };
            Assessment::new(decision, DecisionBasis::PremiumRequired)
        }
        Err(failure) => Assessment::fail_open(failure),
    }
}

/// Applies the premium and exempt-email rules.
fn premium_or_exempt(
    policy: &ExemptionPolicy,
    principal: &dyn Principal,
) -> Result<Option<DecisionBasis>, PremiumCheckError> {
    if principal.has_premium_access()? {
        return Ok(Some(DecisionBasis::Premium));
    }
    if principal.email().is_some_and(|email| policy.is_exempt_email(email)) {
        return Ok(Some(DecisionBasis::ExemptEmail));
    }
    Ok(None)
}

// ============================================================================
// SECTION: Access Levels
// ============================================================================

/// Coarse access classification for status endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// No authenticated session.
    Anonymous,
    /// Authenticated without premium access.
    Restricted,
    /// Authenticated with an active subscription.
    Subscriber,
    /// Authenticated with an exempt email.
    Exempt,
    /// Premium status could not be determined.
    Unknown,
}

impl AccessLevel {
    /// Returns true when the level implies unrestricted premium access.
    #[must_use]
    pub const fn is_unlimited(self) -> bool {
        matches!(self, Self::Subscriber | Self::Exempt)
    }
}

// ============================================================================
// SECTION: Access Gate
// ============================================================================

/// Access gate with a reloadable policy snapshot.
///
/// # Invariants
/// - An evaluation uses exactly one policy snapshot from start to finish.
pub struct AccessGate {
    /// Active exemption policy.
    policy: RwLock<Arc<ExemptionPolicy>>,
    /// Audit sink for decisions and reloads.
    audit: Arc<dyn GateAuditSink>,
}

impl AccessGate {
    /// Builds a gate over the given policy.
    #[must_use]
    pub fn new(policy: ExemptionPolicy, audit: Arc<dyn GateAuditSink>) -> Self {
        Self {
            policy: RwLock::new(Arc::new(policy)),
            audit,
        }
    }

    /// Returns the current policy snapshot.
    #[must_use]
    pub fn policy(&self) -> Arc<ExemptionPolicy> {
        Arc::clone(&self.policy.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the policy snapshot; in-flight evaluations are unaffected.
    pub fn reload(&self, policy: ExemptionPolicy) {
        let count = policy.exempt_email_count();
        *self.policy.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(policy);
        self.audit.record_reload(&PolicyReloadEvent::applied(count));
    }

    /// Records a reload that was rejected before reaching the gate.
    pub fn reject_reload(&self, error: &str) {
        let count = self.policy().exempt_email_count();
        self.audit.record_reload(&PolicyReloadEvent::rejected(count, error));
    }

    /// Returns the decision for a request.
    #[must_use]
    pub fn evaluate(
        &self,
        principal: &dyn Principal,
        route: &str,
        path: &str,
        accept_json: bool,
    ) -> Decision {
        self.assess(principal, route, path, accept_json).decision
    }

    /// Returns the decision with its basis and records an audit event.
    #[must_use]
    pub fn assess(
        &self,
        principal: &dyn Principal,
        route: &str,
        path: &str,
        accept_json: bool,
    ) -> Assessment {
        let policy = self.policy();
        let assessment = assess(&policy, principal, route, path, accept_json);
        let (authenticated, fingerprint) = audit_identity(principal);
        let event = GateAuditEvent::new(&assessment, authenticated, fingerprint, route, path);
        self.audit.record(&event);
        assessment
    }

    /// Classifies the principal for status displays.
    #[must_use]
    pub fn access_level(&self, principal: &dyn Principal) -> AccessLevel {
        if !principal.is_authenticated() {
            return AccessLevel::Anonymous;
        }
        let policy = self.policy();
        let level = contain(|| {
            if principal.email().is_some_and(|email| policy.is_exempt_email(email)) {
                return Ok(AccessLevel::Exempt);
            }
            if principal.has_premium_access()? {
                Ok(AccessLevel::Subscriber)
            } else {
                Ok(AccessLevel::Restricted)
            }
        });
        level.unwrap_or(AccessLevel::Unknown)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs a principal callback, converting panics into [`PremiumCheckError`].
fn contain<T>(
    check: impl FnOnce() -> Result<T, PremiumCheckError>,
) -> Result<T, PremiumCheckError> {
    panic::catch_unwind(AssertUnwindSafe(check))
        .unwrap_or_else(|payload| Err(PremiumCheckError::Panicked(panic_message(&*payload))))
}

/// Captures the principal facts recorded in audit events.
///
/// Panics inside the principal are contained; the affected field is recorded
/// as unauthenticated or without a fingerprint.
fn audit_identity(principal: &dyn Principal) -> (bool, Option<String>) {
    let authenticated = contain(|| Ok(principal.is_authenticated())).unwrap_or(false);
    let fingerprint = contain(|| Ok(principal.email().map(email_fingerprint))).ok().flatten();
    (authenticated, fingerprint)
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "non-string panic payload".to_string()
}
