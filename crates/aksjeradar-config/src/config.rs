// crates/aksjeradar-config/src/config.rs
// ============================================================================
// Module: Aksjeradar Configuration
// Description: Configuration loading and validation for the access gate.
// Purpose: Provide strict config parsing with hard limits.
// Dependencies: aksjeradar-core, serde, time, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The resolved path is `--config`, then `AKSJERADAR_CONFIG`, then
//! `aksjeradar.toml` in the working directory. Validation runs after every
//! load, including hot reloads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use aksjeradar_core::DEFAULT_OPEN_PATH_PREFIXES;
use aksjeradar_core::ExemptionPolicy;
use aksjeradar_core::Subscription;
use aksjeradar_core::SubscriptionKind;
use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "aksjeradar.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "AKSJERADAR_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of exempt emails.
pub(crate) const MAX_EXEMPT_EMAILS: usize = 1024;
/// Maximum length of an email address.
pub(crate) const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum number of open path prefixes.
pub(crate) const MAX_OPEN_PATH_PREFIXES: usize = 64;
/// Maximum length of a redirect URL.
pub(crate) const MAX_URL_LENGTH: usize = 2048;
/// Maximum number of session fixtures.
pub(crate) const MAX_SESSIONS: usize = 1024;
/// Maximum length of a session token.
pub(crate) const MAX_SESSION_TOKEN_LENGTH: usize = 256;
/// Minimum config reload poll interval in milliseconds.
pub(crate) const MIN_RELOAD_INTERVAL_MS: u64 = 100;
/// Maximum config reload poll interval in milliseconds.
pub(crate) const MAX_RELOAD_INTERVAL_MS: u64 = 60_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Aksjeradar access gate configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AksjeradarConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Access gate exemptions and redirect targets.
    #[serde(default)]
    pub access: AccessConfig,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Development session fixtures.
    #[serde(default)]
    pub sessions: Vec<SessionConfig>,
    /// Optional config source metadata (not serialized).
    #[serde(skip)]
    pub source_modified_at: Option<SystemTime>,
}

impl AksjeradarConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml_str(content)?;
        config.source_modified_at = fs::metadata(&resolved).and_then(|meta| meta.modified()).ok();
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.access.validate()?;
        self.audit.validate()?;
        if self.sessions.len() > MAX_SESSIONS {
            return Err(ConfigError::Invalid("too many sessions".to_string()));
        }
        let mut tokens = BTreeSet::new();
        for session in &self.sessions {
            session.validate()?;
            if !tokens.insert(session.token.as_str()) {
                return Err(ConfigError::Invalid("duplicate session token".to_string()));
            }
        }
        Ok(())
    }

    /// Builds the exemption policy snapshot for the access gate.
    #[must_use]
    pub fn exemption_policy(&self) -> ExemptionPolicy {
        ExemptionPolicy::new(&self.access.exempt_emails)
            .with_open_path_prefixes(self.access.open_path_prefixes.iter().cloned())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Config file poll interval for hot reload, in milliseconds.
    #[serde(default = "default_reload_interval_ms")]
    pub reload_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            reload_interval_ms: default_reload_interval_ms(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address is invalid.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))
    }

    /// Validates server settings.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if !(MIN_RELOAD_INTERVAL_MS ..= MAX_RELOAD_INTERVAL_MS).contains(&self.reload_interval_ms) {
            return Err(ConfigError::Invalid(format!(
                "reload_interval_ms must be between {MIN_RELOAD_INTERVAL_MS} and \
                 {MAX_RELOAD_INTERVAL_MS}"
            )));
        }
        Ok(())
    }
}

/// Access gate exemptions and redirect targets.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// Emails that bypass the premium requirement.
    #[serde(default)]
    pub exempt_emails: Vec<String>,
    /// Path prefixes that stay public.
    #[serde(default = "default_open_path_prefixes")]
    pub open_path_prefixes: Vec<String>,
    /// Login page URL for anonymous redirects.
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Pricing page URL for non-premium redirects.
    #[serde(default = "default_pricing_url")]
    pub pricing_url: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            exempt_emails: Vec::new(),
            open_path_prefixes: default_open_path_prefixes(),
            login_url: default_login_url(),
            pricing_url: default_pricing_url(),
        }
    }
}

impl AccessConfig {
    /// Validates exemptions and redirect targets.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.exempt_emails.len() > MAX_EXEMPT_EMAILS {
            return Err(ConfigError::Invalid("too many exempt emails".to_string()));
        }
        for email in &self.exempt_emails {
            validate_email("access.exempt_emails", email)?;
        }
        if self.open_path_prefixes.len() > MAX_OPEN_PATH_PREFIXES {
            return Err(ConfigError::Invalid("too many open path prefixes".to_string()));
        }
        for prefix in &self.open_path_prefixes {
            if prefix.is_empty() {
                return Err(ConfigError::Invalid(
                    "access.open_path_prefixes entries must be non-empty".to_string(),
                ));
            }
            if !prefix.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "access.open_path_prefixes entry {prefix} must start with /"
                )));
            }
        }
        validate_url("access.login_url", &self.login_url)?;
        validate_url("access.pricing_url", &self.pricing_url)?;
        Ok(())
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Enable audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional JSONL log path (stderr when absent).
    #[serde(default)]
    pub log_path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            log_path: None,
        }
    }
}

impl AuditConfig {
    /// Validates audit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.log_path {
            validate_path_string("audit.log_path", path)?;
        }
        Ok(())
    }
}

/// Development session fixture mapping a token to an account.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session token presented by the client.
    pub token: String,
    /// Account email.
    pub email: String,
    /// Whether the account is marked as subscribed.
    #[serde(default)]
    pub has_subscription: bool,
    /// Billing plan.
    #[serde(default)]
    pub subscription_type: SubscriptionKind,
    /// Inclusive end of the paid period (RFC 3339).
    #[serde(default)]
    pub subscription_end: Option<String>,
}

impl SessionConfig {
    /// Returns the subscription described by this fixture.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `subscription_end` is not RFC 3339.
    pub fn subscription(&self) -> Result<Subscription, ConfigError> {
        let ends_at = self.subscription_end.as_deref().map(parse_timestamp).transpose()?;
        Ok(Subscription {
            has_subscription: self.has_subscription,
            kind: self.subscription_type,
            ends_at,
        })
    }

    /// Validates the session fixture.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::Invalid("session token must be non-empty".to_string()));
        }
        if self.token.len() > MAX_SESSION_TOKEN_LENGTH {
            return Err(ConfigError::Invalid("session token too long".to_string()));
        }
        validate_email("sessions.email", &self.email)?;
        self.subscription()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the argument, environment, or default.
///
/// # Errors
///
/// Returns [`ConfigError`] when the environment override is too long.
pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an email-shaped allowlist entry.
fn validate_email(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} entries must be non-empty")));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} entry too long")));
    }
    if !trimmed.contains('@') {
        return Err(ConfigError::Invalid(format!("{field} entry {trimmed} must contain @")));
    }
    Ok(())
}

/// Validates a redirect target.
fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_URL_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let relative = trimmed.starts_with('/') && !trimmed.starts_with("//");
    let absolute = trimmed.starts_with("https://") || trimmed.starts_with("http://");
    if !relative && !absolute {
        return Err(ConfigError::Invalid(format!(
            "{field} must be a relative path or http(s) url"
        )));
    }
    Ok(())
}

/// Parses an RFC 3339 timestamp.
fn parse_timestamp(value: &str) -> Result<OffsetDateTime, ConfigError> {
    OffsetDateTime::parse(value.trim(), &Rfc3339)
        .map_err(|_| ConfigError::Invalid(format!("invalid rfc3339 timestamp: {value}")))
}

/// Default bind address.
fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

/// Default config reload poll interval.
const fn default_reload_interval_ms() -> u64 {
    2_000
}

/// Default open path prefixes.
fn default_open_path_prefixes() -> Vec<String> {
    DEFAULT_OPEN_PATH_PREFIXES.iter().map(|prefix| (*prefix).to_string()).collect()
}

/// Default login page.
fn default_login_url() -> String {
    "/login".to_string()
}

/// Default pricing page.
fn default_pricing_url() -> String {
    "/pricing".to_string()
}

/// Audit logging defaults to on.
const fn default_audit_enabled() -> bool {
    true
}
