// crates/aksjeradar-core/src/audit.rs
// ============================================================================
// Module: Gate Audit Logging
// Description: Structured audit events for access gate decisions.
// Purpose: Emit redacted JSON-line logs without hard dependencies.
// Dependencies: serde, serde_json, sha2
// ============================================================================

//! ## Overview
//! Every gate decision and every policy reload produces one audit event.
//! Emails are never logged in the clear; events carry a SHA-256 fingerprint of
//! the normalized address instead. Fail-open decisions are emitted at `warn`
//! level together with the recovered error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use crate::decision::Assessment;
use crate::decision::DecisionBasis;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Access gate decision event payload.
#[derive(Debug, Clone, Serialize)]
pub struct GateAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Severity label (`info` or `warn`).
    pub level: &'static str,
    /// Decision label.
    pub decision: &'static str,
    /// Rule that produced the decision.
    pub basis: DecisionBasis,
    /// Symbolic route name.
    pub route: String,
    /// Raw request path.
    pub path: String,
    /// Whether the principal was authenticated.
    pub authenticated: bool,
    /// SHA-256 fingerprint of the principal email, if known.
    pub email_fingerprint: Option<String>,
    /// Recovered failure text for fail-open decisions.
    pub error: Option<String>,
}

impl GateAuditEvent {
    /// Builds a decision event with a consistent timestamp.
    ///
    /// Principal facts are passed in already captured so that emitting the
    /// event never calls back into the principal.
    #[must_use]
    pub fn new(
        assessment: &Assessment,
        authenticated: bool,
        email_fingerprint: Option<String>,
        route: &str,
        path: &str,
    ) -> Self {
        let level = if assessment.failure.is_some() { "warn" } else { "info" };
        Self {
            event: "access_gate",
            timestamp_ms: now_ms(),
            level,
            decision: assessment.decision.as_str(),
            basis: assessment.basis,
            route: route.to_string(),
            path: path.to_string(),
            authenticated,
            email_fingerprint,
            error: assessment.failure.as_ref().map(ToString::to_string),
        }
    }
}

/// Exemption policy reload event payload.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyReloadEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Severity label (`info` or `warn`).
    pub level: &'static str,
    /// Whether the new policy was applied.
    pub applied: bool,
    /// Number of exempt emails in the active policy.
    pub exempt_email_count: usize,
    /// Failure text when the reload was rejected.
    pub error: Option<String>,
}

impl PolicyReloadEvent {
    /// Builds an event for a successfully applied policy.
    #[must_use]
    pub fn applied(exempt_email_count: usize) -> Self {
        Self {
            event: "policy_reload",
            timestamp_ms: now_ms(),
            level: "info",
            applied: true,
            exempt_email_count,
            error: None,
        }
    }

    /// Builds an event for a rejected reload; the previous policy stays active.
    #[must_use]
    pub fn rejected(exempt_email_count: usize, error: impl Into<String>) -> Self {
        Self {
            event: "policy_reload",
            timestamp_ms: now_ms(),
            level: "warn",
            applied: false,
            exempt_email_count,
            error: Some(error.into()),
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for access gate events.
pub trait GateAuditSink: Send + Sync {
    /// Record a decision event.
    fn record(&self, event: &GateAuditEvent);

    /// Record a policy reload event.
    fn record_reload(&self, _event: &PolicyReloadEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl GateAuditSink for StderrAuditSink {
    fn record(&self, event: &GateAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }

    fn record_reload(&self, event: &PolicyReloadEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized line.
    fn append<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl GateAuditSink for FileAuditSink {
    fn record(&self, event: &GateAuditEvent) {
        self.append(event);
    }

    fn record_reload(&self, event: &PolicyReloadEvent) {
        self.append(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl GateAuditSink for NoopAuditSink {
    fn record(&self, _event: &GateAuditEvent) {}
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the hex SHA-256 fingerprint of a trimmed, lowercased email.
#[must_use]
pub fn email_fingerprint(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_ascii_lowercase().as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest.as_slice() {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
