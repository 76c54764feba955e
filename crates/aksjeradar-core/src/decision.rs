// crates/aksjeradar-core/src/decision.rs
// ============================================================================
// Module: Gate Decisions
// Description: Outcomes produced by the access gate.
// Purpose: Separate the caller-visible decision from its audit basis.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Decision`] is what the HTTP layer acts on. The [`DecisionBasis`] records
//! which rule produced it and is only used for auditing and metrics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::principal::PremiumCheckError;

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Machine-readable denial reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No authenticated session.
    AuthenticationRequired,
    /// Authenticated, but without premium access.
    PremiumRequired,
}

impl DenyReason {
    /// Returns the wire label for the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "authentication_required",
            Self::PremiumRequired => "premium_required",
        }
    }
}

/// Access gate outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    /// Pass control to the protected handler.
    Allow,
    /// Redirect an anonymous browser to the login page.
    RedirectLogin,
    /// Redirect an authenticated browser to the pricing page.
    RedirectPricing,
    /// Reject a JSON caller with an error body.
    DenyJson(DenyReason),
}

impl Decision {
    /// Returns a stable label for the decision.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::RedirectLogin => "redirect_login",
            Self::RedirectPricing => "redirect_pricing",
            Self::DenyJson(_) => "deny_json",
        }
    }

    /// Returns true when the request may proceed.
    #[must_use]
    pub const fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }
}

// ============================================================================
// SECTION: Basis
// ============================================================================

/// Rule that produced a decision.
///
/// # Invariants
/// - Variants are stable for audit and metric labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionBasis {
    /// Route is on the exempt list.
    ExemptRoute,
    /// Path starts with an open prefix.
    OpenPrefix,
    /// Principal is not authenticated.
    Unauthenticated,
    /// Principal has premium access.
    Premium,
    /// Principal email is on the exempt list.
    ExemptEmail,
    /// Authenticated principal lacks premium access.
    PremiumRequired,
    /// Premium evaluation failed; request allowed.
    FailOpen,
}

impl DecisionBasis {
    /// Returns a stable label for the basis.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExemptRoute => "exempt_route",
            Self::OpenPrefix => "open_prefix",
            Self::Unauthenticated => "unauthenticated",
            Self::Premium => "premium",
            Self::ExemptEmail => "exempt_email",
            Self::PremiumRequired => "premium_required",
            Self::FailOpen => "fail_open",
        }
    }
}

// ============================================================================
// SECTION: Assessment
// ============================================================================

/// Decision plus the rule and failure that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    /// Caller-visible decision.
    pub decision: Decision,
    /// Rule that produced the decision.
    pub basis: DecisionBasis,
    /// Premium-check failure recovered by failing open.
    pub failure: Option<PremiumCheckError>,
}

impl Assessment {
    /// Builds an assessment without a recovered failure.
    #[must_use]
    pub const fn new(decision: Decision, basis: DecisionBasis) -> Self {
        Self {
            decision,
            basis,
            failure: None,
        }
    }

    /// Builds a fail-open assessment.
    #[must_use]
    pub const fn fail_open(failure: PremiumCheckError) -> Self {
        Self {
            decision: Decision::Allow,
            basis: DecisionBasis::FailOpen,
            failure: Some(failure),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
