// crates/aksjeradar-core/src/principal.rs
// ============================================================================
// Module: Request Principal
// Description: Identity view consumed by the access gate.
// Purpose: Abstract over session-backed users without owning their storage.
// Dependencies: thiserror, time
// ============================================================================

//! ## Overview
//! A [`Principal`] is the identity attached to a request. The gate only reads
//! it: authentication state, the account email, and the premium check. The
//! premium check may perform I/O in the implementing type and may fail; the
//! gate treats such failures as fail-open.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use time::OffsetDateTime;

use crate::subscription::Subscription;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure while computing premium access for a principal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PremiumCheckError {
    /// The backing store or service could not answer.
    #[error("premium check unavailable: {0}")]
    Unavailable(String),
    /// The premium check panicked and was contained by the gate.
    #[error("premium check panicked: {0}")]
    Panicked(String),
}

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Identity associated with a request.
pub trait Principal: Send + Sync {
    /// Returns true when the request carries an authenticated session.
    fn is_authenticated(&self) -> bool;

    /// Returns the account email when known.
    fn email(&self) -> Option<&str>;

    /// Returns whether the principal currently holds premium access.
    ///
    /// # Errors
    ///
    /// Returns [`PremiumCheckError`] when premium status cannot be determined.
    fn has_premium_access(&self) -> Result<bool, PremiumCheckError>;
}

// ============================================================================
// SECTION: Implementations
// ============================================================================

/// Visitor without a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousPrincipal;

impl Principal for AnonymousPrincipal {
    fn is_authenticated(&self) -> bool {
        false
    }

    fn email(&self) -> Option<&str> {
        None
    }

    fn has_premium_access(&self) -> Result<bool, PremiumCheckError> {
        Ok(false)
    }
}

/// Authenticated account with its subscription, pinned to an evaluation instant.
#[derive(Debug, Clone)]
pub struct AccountPrincipal {
    /// Account email.
    email: String,
    /// Subscription state loaded with the session.
    subscription: Subscription,
    /// Instant used for expiry checks.
    evaluated_at: OffsetDateTime,
}

impl AccountPrincipal {
    /// Builds an authenticated principal.
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        subscription: Subscription,
        evaluated_at: OffsetDateTime,
    ) -> Self {
        Self {
            email: email.into(),
            subscription,
            evaluated_at,
        }
    }
}

impl Principal for AccountPrincipal {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn email(&self) -> Option<&str> {
        Some(&self.email)
    }

    fn has_premium_access(&self) -> Result<bool, PremiumCheckError> {
        Ok(self.subscription.is_active(self.evaluated_at))
    }
}
