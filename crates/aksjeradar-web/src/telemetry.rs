// crates/aksjeradar-web/src/telemetry.rs
// ============================================================================
// Module: Gate Telemetry
// Description: Observability hooks for access gate decisions.
// Purpose: Provide decision counters and latency without hard deps.
// Dependencies: aksjeradar-core
// ============================================================================

//! ## Overview
//! A thin metrics interface for gate outcomes. Deployments plug in their own
//! exporter; the default sink discards everything. Labels carry route names
//! and decision labels only, never emails or tokens.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use aksjeradar_core::Decision;
use aksjeradar_core::DecisionBasis;

// ============================================================================
// SECTION: Metric Events
// ============================================================================

/// Gate decision metric payload.
#[derive(Debug, Clone)]
pub struct GateMetricEvent {
    /// Route descriptor the request was classified as.
    pub route: String,
    /// Decision returned by the gate.
    pub decision: Decision,
    /// Rule that produced the decision.
    pub basis: DecisionBasis,
    /// Whether the caller expected JSON.
    pub accept_json: bool,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for gate decisions.
pub trait GateMetrics: Send + Sync {
    /// Records a decision counter event.
    fn record_decision(&self, event: &GateMetricEvent);
    /// Records the time spent resolving the principal and deciding.
    fn record_latency(&self, event: &GateMetricEvent, latency: Duration);
}

/// No-op metrics sink.
pub struct NoopMetrics;

impl GateMetrics for NoopMetrics {
    fn record_decision(&self, _event: &GateMetricEvent) {}

    fn record_latency(&self, _event: &GateMetricEvent, _latency: Duration) {}
}
