// crates/aksjeradar-web/src/reload.rs
// ============================================================================
// Module: Config Reload
// Description: Hot reload of the exemption policy from the config file.
// Purpose: Swap the gate policy snapshot when the config file changes.
// Dependencies: aksjeradar-core, aksjeradar-config, tokio
// ============================================================================

//! ## Overview
//! The reloader polls the config file modification time. When it changes the
//! file is loaded and validated in full; a valid file replaces the gate's
//! exemption policy, an invalid one is audited and the previous snapshot
//! stays active. A missing file keeps the current policy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;

use aksjeradar_config::AksjeradarConfig;
use aksjeradar_core::AccessGate;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

// ============================================================================
// SECTION: Watcher
// ============================================================================

/// Result of a single reload check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The file modification time did not change.
    Unchanged,
    /// A new policy snapshot was installed.
    Applied,
    /// The changed file failed validation.
    Rejected(String),
}

/// Modification-time watcher for a config file.
#[derive(Debug, Clone)]
pub struct ConfigWatcher {
    /// Config file path.
    path: PathBuf,
    /// Modification time of the last file seen.
    last_modified: Option<SystemTime>,
}

impl ConfigWatcher {
    /// Creates a watcher that treats `last_modified` as already loaded.
    #[must_use]
    pub const fn new(path: PathBuf, last_modified: Option<SystemTime>) -> Self {
        Self {
            path,
            last_modified,
        }
    }

    /// Reloads the gate policy if the file changed since the last check.
    pub fn check(&mut self, gate: &AccessGate) -> ReloadOutcome {
        let modified = fs::metadata(&self.path).and_then(|meta| meta.modified()).ok();
        if modified.is_none() || modified == self.last_modified {
            return ReloadOutcome::Unchanged;
        }
        self.last_modified = modified;
        match AksjeradarConfig::load(Some(&self.path)) {
            Ok(config) => {
                gate.reload(config.exemption_policy());
                ReloadOutcome::Applied
            }
            Err(err) => {
                let message = err.to_string();
                gate.reject_reload(&message);
                ReloadOutcome::Rejected(message)
            }
        }
    }
}

// ============================================================================
// SECTION: Background Task
// ============================================================================

/// Spawns a task polling `path` every `interval` and reloading `gate`.
#[must_use]
pub fn spawn_config_reloader(
    path: PathBuf,
    gate: Arc<AccessGate>,
    interval: Duration,
    loaded_modified_at: Option<SystemTime>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut watcher = ConfigWatcher::new(path, loaded_modified_at);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let gate = Arc::clone(&gate);
            let checked = tokio::task::spawn_blocking(move || {
                let outcome = watcher.check(&gate);
                (watcher, outcome)
            })
            .await;
            match checked {
                Ok((returned, _)) => watcher = returned,
                Err(_) => break,
            }
        }
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
