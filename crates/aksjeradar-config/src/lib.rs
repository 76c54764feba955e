// crates/aksjeradar-config/src/lib.rs
// ============================================================================
// Module: Aksjeradar Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for aksjeradar.toml semantics.
// Dependencies: aksjeradar-core, serde, time, toml
// ============================================================================

//! ## Overview
//! `aksjeradar-config` defines the configuration model for the access gate
//! server: bind address, exemption lists, redirect targets, audit output, and
//! development session fixtures. Loading is size-limited and validation is
//! strict; invalid input never produces a partially applied config.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
