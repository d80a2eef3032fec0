// SPDX-License-Identifier: MIT OR Apache-2.0
//! Broker-wide configuration: the well-known bus name, on-disk paths, the
//! per-uid proxy table (spec §9 Open Question 1), default cache-age, and
//! idle-exit timeout.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::collections::BTreeMap;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while loading or validating a [`BrokerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

/// Advisory-level issues that do not prevent the daemon from starting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// `default_cache_age_secs` is set above a week; stale metadata will be
    /// accepted for a long time between idle-exit restarts.
    LargeDefaultCacheAge {
        /// Configured value, in seconds.
        secs: u32,
    },
    /// `idle_exit_secs` is zero, meaning the daemon never exits for
    /// inactivity and must be managed externally.
    IdleExitDisabled,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ConfigWarning::LargeDefaultCacheAge { secs } => {
                write!(f, "default_cache_age_secs is unusually large ({secs}s)")
            }
            ConfigWarning::IdleExitDisabled => {
                write!(f, "idle_exit_secs is 0: the daemon will never exit for inactivity")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default bus well-known name (spec §6.1: "a fixed reverse-DNS identifier,
/// configurable in one place").
pub const DEFAULT_BUS_NAME: &str = "org.freedesktop.SoftwareBroker";

/// Default idle-exit timeout, in seconds.
pub const DEFAULT_IDLE_EXIT_SECS: u32 = 300;

/// Default cache-age hint, in seconds (one hour).
pub const DEFAULT_CACHE_AGE_SECS: u32 = 3_600;

/// Threshold above which `default_cache_age_secs` generates a warning
/// (one week).
const LARGE_CACHE_AGE_THRESHOLD: u32 = 7 * 24 * 3_600;

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Per-uid proxy hints applied to a transaction's `SETUP` (spec §9 Open
/// Question 1: per-uid, applied only at the next transaction's `SETUP`).
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ProxyHints {
    /// `http_proxy` value, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,
    /// `ftp_proxy` value, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ftp: Option<String>,
    /// PAC file or `no_proxy` exclusion list, backend-specific.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_proxy: Option<String>,
}

/// Top-level runtime configuration for the broker daemon.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Bus well-known name the control surface registers under.
    #[serde(default = "default_bus_name")]
    pub bus_name: String,

    /// Path to the append-only transaction history database.
    pub transaction_db_path: String,

    /// Directory searched for backend plugins.
    pub backend_search_path: String,

    /// Default cache-age hint (seconds) applied when a client's `SetHints`
    /// omits `cache-age`.
    #[serde(default = "default_cache_age")]
    pub default_cache_age_secs: u32,

    /// Seconds of inactivity (no active or queued transaction) before the
    /// daemon exits voluntarily. Zero disables idle-exit.
    #[serde(default = "default_idle_exit")]
    pub idle_exit_secs: u32,

    /// Per-uid proxy hints set via `SetProxy`, keyed by numeric uid.
    #[serde(default)]
    pub proxies: BTreeMap<u32, ProxyHints>,
}

fn default_bus_name() -> String {
    DEFAULT_BUS_NAME.to_string()
}

fn default_cache_age() -> u32 {
    DEFAULT_CACHE_AGE_SECS
}

fn default_idle_exit() -> u32 {
    DEFAULT_IDLE_EXIT_SECS
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bus_name: default_bus_name(),
            transaction_db_path: "/var/lib/swbroker/transactions.jsonl".to_string(),
            backend_search_path: "/usr/lib/swbroker/backends".to_string(),
            default_cache_age_secs: default_cache_age(),
            idle_exit_secs: default_idle_exit(),
            proxies: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`BrokerConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`BrokerConfig::default()`].
///
/// # Errors
///
/// Returns [`ConfigError::FileNotFound`] if `path` is given but does not
/// exist, or [`ConfigError::ParseError`] if its contents are not valid TOML
/// matching [`BrokerConfig`]'s shape.
pub fn load_config(path: Option<&Path>) -> Result<BrokerConfig, ConfigError> {
    match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)
                .map_err(|_| ConfigError::FileNotFound { path: p.display().to_string() })?;
            parse_toml(&content)
        }
        None => Ok(BrokerConfig::default()),
    }
}

/// Parse a TOML string into a [`BrokerConfig`].
///
/// # Errors
///
/// Returns [`ConfigError::ParseError`] if `content` is not valid TOML, or
/// does not match [`BrokerConfig`]'s shape (a missing required field, a
/// type mismatch).
pub fn parse_toml(content: &str) -> Result<BrokerConfig, ConfigError> {
    toml::from_str::<BrokerConfig>(content).map_err(|e| ConfigError::ParseError { reason: e.to_string() })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (an empty bus name or path) come back as
/// [`ConfigError::ValidationError`]; soft issues come back as warnings.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] if `config` has an empty
/// `bus_name`, `transaction_db_path`, or `backend_search_path`.
pub fn validate_config(config: &BrokerConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if config.bus_name.trim().is_empty() {
        errors.push("bus_name must not be empty".into());
    }
    if config.transaction_db_path.trim().is_empty() {
        errors.push("transaction_db_path must not be empty".into());
    }
    if config.backend_search_path.trim().is_empty() {
        errors.push("backend_search_path must not be empty".into());
    }

    if config.default_cache_age_secs > LARGE_CACHE_AGE_THRESHOLD {
        warnings.push(ConfigWarning::LargeDefaultCacheAge { secs: config.default_cache_age_secs });
    }
    if config.idle_exit_secs == 0 {
        warnings.push(ConfigWarning::IdleExitDisabled);
    }
    if config.proxies.is_empty() {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "proxies".into(),
            hint: "no per-uid proxy hints configured; clients must set them via SetProxy".into(),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Proxy table updates
// ---------------------------------------------------------------------------

impl BrokerConfig {
    /// Record `hints` as the proxy entry for `uid` (the `SetProxy` control
    /// method). Per spec §9 Open Question 1, this only affects transactions
    /// that have not yet left `SETUP`; it does not retroactively alter a
    /// transaction already in flight.
    pub fn set_proxy(&mut self, uid: u32, hints: ProxyHints) {
        self.proxies.insert(uid, hints);
    }

    /// Snapshot the proxy hints currently on file for `uid`, if any.
    #[must_use]
    pub fn proxy_for(&self, uid: u32) -> Option<ProxyHints> {
        self.proxies.get(&uid).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_with_advisory_warnings() {
        let cfg = BrokerConfig::default();
        let warnings = validate_config(&cfg).expect("default config should be valid");
        assert!(!warnings.is_empty());
    }

    #[test]
    fn parse_valid_toml_string() {
        let toml = r#"
            bus_name = "org.example.Broker"
            transaction_db_path = "/var/lib/broker/txns.jsonl"
            backend_search_path = "/usr/lib/broker/backends"
        "#;
        let cfg = parse_toml(toml).unwrap();
        assert_eq!(cfg.bus_name, "org.example.Broker");
        assert_eq!(cfg.default_cache_age_secs, DEFAULT_CACHE_AGE_SECS);
    }

    #[test]
    fn parse_invalid_toml_gives_parse_error() {
        let bad = "this is [not valid toml =";
        let err = parse_toml(bad).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn validation_rejects_empty_bus_name() {
        let cfg = BrokerConfig { bus_name: String::new(), ..BrokerConfig::default() };
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_warns_on_large_default_cache_age() {
        let cfg = BrokerConfig { default_cache_age_secs: 8 * 24 * 3_600, ..BrokerConfig::default() };
        let warnings = validate_config(&cfg).unwrap();
        assert!(warnings.iter().any(|w| matches!(w, ConfigWarning::LargeDefaultCacheAge { .. })));
    }

    #[test]
    fn validation_warns_on_disabled_idle_exit() {
        let cfg = BrokerConfig { idle_exit_secs: 0, ..BrokerConfig::default() };
        let warnings = validate_config(&cfg).unwrap();
        assert!(warnings.contains(&ConfigWarning::IdleExitDisabled));
    }

    #[test]
    fn set_proxy_then_proxy_for_round_trips() {
        let mut cfg = BrokerConfig::default();
        assert!(cfg.proxy_for(1000).is_none());
        cfg.set_proxy(1000, ProxyHints { http: Some("proxy:3128".into()), ..ProxyHints::default() });
        let hints = cfg.proxy_for(1000).unwrap();
        assert_eq!(hints.http.as_deref(), Some("proxy:3128"));
    }

    #[test]
    fn load_config_missing_file_is_file_not_found() {
        let err = load_config(Some(Path::new("/nonexistent/swbroker.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn load_config_none_is_default() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg, BrokerConfig::default());
    }
}
