// crates/aksjeradar-web/src/principal.rs
// ============================================================================
// Module: Principal Resolution
// Description: Request-to-principal lookup for the access gate.
// Purpose: Identify the caller from session cookies or bearer tokens.
// Dependencies: aksjeradar-core, aksjeradar-config, async-trait, axum, time
// ============================================================================

//! ## Overview
//! [`PrincipalResolver`] is the seam between the gate and the account store.
//! Resolution never fails: unknown or missing credentials resolve to
//! [`AnonymousPrincipal`]. [`SessionPrincipalResolver`] serves session
//! fixtures from configuration and accepts either the `aksjeradar_session`
//! cookie or an `Authorization: Bearer` header.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use aksjeradar_config::ConfigError;
use aksjeradar_config::SessionConfig;
use aksjeradar_core::AccountPrincipal;
use aksjeradar_core::AnonymousPrincipal;
use aksjeradar_core::Principal;
use aksjeradar_core::Subscription;
use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::header::COOKIE;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Session cookie carrying the account token.
pub const SESSION_COOKIE: &str = "aksjeradar_session";
/// Maximum credential header size considered for lookup.
const MAX_CREDENTIAL_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Resolves the principal for an incoming request.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    /// Returns the principal described by the request headers.
    async fn resolve(&self, headers: &HeaderMap) -> Arc<dyn Principal>;
}

// ============================================================================
// SECTION: Session Resolver
// ============================================================================

/// Account record bound to a session token.
#[derive(Debug, Clone)]
struct SessionAccount {
    /// Account email.
    email: String,
    /// Subscription state of the account.
    subscription: Subscription,
}

/// Resolver backed by configured session fixtures.
#[derive(Debug, Clone, Default)]
pub struct SessionPrincipalResolver {
    /// Accounts keyed by session token.
    sessions: BTreeMap<String, SessionAccount>,
}

impl SessionPrincipalResolver {
    /// Builds a resolver from session fixtures.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a fixture subscription is invalid.
    pub fn from_config(sessions: &[SessionConfig]) -> Result<Self, ConfigError> {
        let mut resolver = Self::default();
        for session in sessions {
            resolver = resolver.with_session(
                session.token.clone(),
                session.email.clone(),
                session.subscription()?,
            );
        }
        Ok(resolver)
    }

    /// Adds a session fixture.
    #[must_use]
    pub fn with_session(
        mut self,
        token: impl Into<String>,
        email: impl Into<String>,
        subscription: Subscription,
    ) -> Self {
        self.sessions.insert(
            token.into(),
            SessionAccount {
                email: email.into(),
                subscription,
            },
        );
        self
    }

    /// Returns the number of known sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Looks up the account bound to a token.
    fn lookup(&self, token: &str) -> Option<&SessionAccount> {
        self.sessions.get(token)
    }
}

#[async_trait]
impl PrincipalResolver for SessionPrincipalResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Arc<dyn Principal> {
        let account = session_token(headers).and_then(|token| self.lookup(token));
        match account {
            Some(account) => Arc::new(AccountPrincipal::new(
                account.email.clone(),
                account.subscription.clone(),
                OffsetDateTime::now_utc(),
            )),
            None => Arc::new(AnonymousPrincipal),
        }
    }
}

// ============================================================================
// SECTION: Credential Parsing
// ============================================================================

/// Extracts the session token from the cookie or bearer header.
fn session_token(headers: &HeaderMap) -> Option<&str> {
    cookie_token(headers).or_else(|| bearer_token(headers))
}

/// Finds the session cookie across all `Cookie` headers.
fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter(|value| value.len() <= MAX_CREDENTIAL_HEADER_BYTES)
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, token)| *name == SESSION_COOKIE && !token.is_empty())
        .map(|(_, token)| token)
}

/// Parses an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    if header.len() > MAX_CREDENTIAL_HEADER_BYTES {
        return None;
    }
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
