// crates/aksjeradar-core/src/lib.rs
// ============================================================================
// Module: Aksjeradar Core Library
// Description: Public API surface for the Aksjeradar access gate.
// Purpose: Expose principal, policy, decision, gate, and audit types.
// Dependencies: serde, serde_json, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! Aksjeradar core decides whether a request may reach premium content. The
//! gate is a pure function of the principal, the requested route and path, and
//! an immutable exemption policy snapshot; the only side effect is an audit
//! event per decision. Failures inside the premium check fail open.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod decision;
pub mod gate;
pub mod policy;
pub mod principal;
pub mod subscription;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileAuditSink;
pub use audit::GateAuditEvent;
pub use audit::GateAuditSink;
pub use audit::NoopAuditSink;
pub use audit::PolicyReloadEvent;
pub use audit::StderrAuditSink;
pub use audit::email_fingerprint;
pub use decision::Assessment;
pub use decision::Decision;
pub use decision::DecisionBasis;
pub use decision::DenyReason;
pub use gate::AccessGate;
pub use gate::AccessLevel;
pub use gate::assess;
pub use policy::DEFAULT_OPEN_PATH_PREFIXES;
pub use policy::EXEMPT_ROUTES;
pub use policy::ExemptionPolicy;
pub use policy::STATIC_ROUTE;
pub use policy::is_exempt_route;
pub use principal::AccountPrincipal;
pub use principal::AnonymousPrincipal;
pub use principal::PremiumCheckError;
pub use principal::Principal;
pub use subscription::Subscription;
pub use subscription::SubscriptionKind;
