// crates/aksjeradar-core/src/subscription.rs
// ============================================================================
// Module: Subscription Model
// Description: Paid subscription state attached to an account.
// Purpose: Derive premium access from subscription kind and expiry.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! A subscription grants premium access while it is active. Dated
//! subscriptions are active up to and including their end instant; lifetime
//! subscriptions without an end date never expire. There is no trial
//! fallback: an account without a subscription has no premium access.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Subscription Kind
// ============================================================================

/// Billing plan attached to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionKind {
    /// No paid plan.
    #[default]
    Free,
    /// Monthly billing.
    Monthly,
    /// Yearly billing.
    Yearly,
    /// One-off purchase with no expiry.
    Lifetime,
}

// ============================================================================
// SECTION: Subscription
// ============================================================================

/// Subscription state for a single account.
///
/// # Invariants
/// - `ends_at` takes precedence over `kind` when both are present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Subscription {
    /// Whether the account has ever been marked as subscribed.
    pub has_subscription: bool,
    /// Billing plan.
    pub kind: SubscriptionKind,
    /// Inclusive end of the paid period, if dated.
    pub ends_at: Option<OffsetDateTime>,
}

impl Subscription {
    /// Returns an empty (free) subscription.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            has_subscription: false,
            kind: SubscriptionKind::Free,
            ends_at: None,
        }
    }

    /// Returns an undated lifetime subscription.
    #[must_use]
    pub const fn lifetime() -> Self {
        Self {
            has_subscription: true,
            kind: SubscriptionKind::Lifetime,
            ends_at: None,
        }
    }

    /// Returns a dated subscription ending at `ends_at`.
    #[must_use]
    pub const fn until(kind: SubscriptionKind, ends_at: OffsetDateTime) -> Self {
        Self {
            has_subscription: true,
            kind,
            ends_at: Some(ends_at),
        }
    }

    /// Returns true when the subscription grants premium access at `now`.
    #[must_use]
    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        if !self.has_subscription {
            return false;
        }
        match self.ends_at {
            Some(ends_at) => now <= ends_at,
            None => self.kind == SubscriptionKind::Lifetime,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
