// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for the change control plane.
//!
//! This crate provides [`CcpConfig`] — the top-level daemon settings —
//! together with helpers for loading from TOML files, merging overlays, and
//! producing advisory [`ConfigWarning`]s.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
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

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// A mutation-test deadline is unusually large.
    LargeMutationDeadline {
        /// The budget or plan this deadline came from.
        context: String,
        /// Deadline value in seconds.
        secs: u64,
    },
    /// A budget's alert threshold is set so low it will fire almost
    /// immediately.
    LowAlertThreshold {
        /// Budget id.
        budget: String,
        /// Threshold percentage.
        pct: f64,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ConfigWarning::LargeMutationDeadline { context, secs } => {
                write!(f, "'{context}' has a large mutation-test deadline ({secs}s)")
            }
            ConfigWarning::LowAlertThreshold { budget, pct } => {
                write!(f, "budget '{budget}' has a low alert threshold ({pct}%)")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level daemon configuration for the change control plane.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct CcpConfig {
    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Directory the Evidence Log persists event/audit-pack files under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_store_dir: Option<String>,
    /// Path to a TOML file of additional redaction policies, layered on top
    /// of [`ccp_redactor`]'s built-in defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redaction_policies_path: Option<String>,
    /// HTTP server bind settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Named budget definitions, keyed by budget id.
    #[serde(default)]
    pub budgets: BTreeMap<String, BudgetConfig>,
    /// Default mutation-score threshold applied when a `ChangeSpec`'s test
    /// plan does not specify one.
    #[serde(default = "default_mutation_threshold")]
    pub default_mutation_threshold: f64,
}

fn default_mutation_threshold() -> f64 {
    0.6
}

impl Default for CcpConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".into()),
            evidence_store_dir: None,
            redaction_policies_path: None,
            server: ServerConfig::default(),
            budgets: BTreeMap::new(),
            default_mutation_threshold: default_mutation_threshold(),
        }
    }
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Configuration for a single [`ccp_core::Budget`], as loaded from TOML
/// before being turned into a live budget tracked by the Cost Ledger.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct BudgetConfig {
    /// Hard ceiling in USD.
    pub max_cost: f64,
    /// Percentage of `max_cost` (0-100) at which an alert fires.
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold_pct: f64,
    /// Mutation-test deadline in seconds for specs charged against this
    /// budget, if overridden from the workspace default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_deadline_secs: Option<u64>,
}

fn default_alert_threshold() -> f64 {
    80.0
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Threshold above which a mutation-test deadline generates a warning.
const LARGE_MUTATION_DEADLINE_THRESHOLD_SECS: u64 = 3_600;

/// Threshold below which an alert threshold generates a warning.
const LOW_ALERT_THRESHOLD_PCT: f64 = 10.0;

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`CcpConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`CcpConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<CcpConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => CcpConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`CcpConfig`].
pub fn parse_toml(content: &str) -> Result<CcpConfig, ConfigError> {
    toml::from_str::<CcpConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `CCP_LOG_LEVEL`
/// - `CCP_EVIDENCE_STORE_DIR`
/// - `CCP_SERVER_PORT`
pub fn apply_env_overrides(config: &mut CcpConfig) {
    if let Ok(val) = std::env::var("CCP_LOG_LEVEL") {
        config.log_level = Some(val);
    }
    if let Ok(val) = std::env::var("CCP_EVIDENCE_STORE_DIR") {
        config.evidence_store_dir = Some(val);
    }
    if let Ok(val) = std::env::var("CCP_SERVER_PORT")
        && let Ok(port) = val.parse::<u16>()
    {
        config.server.port = port;
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (bad log level, out-of-range alert threshold, non-positive
/// budget ceiling) are returned as a [`ConfigError::ValidationError`]; soft
/// issues come back as warnings.
pub fn validate_config(config: &CcpConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(ref level) = config.log_level
        && !VALID_LOG_LEVELS.contains(&level.as_str())
    {
        errors.push(format!("invalid log_level '{level}'"));
    }

    if !(0.0..=1.0).contains(&config.default_mutation_threshold) {
        errors.push(format!(
            "default_mutation_threshold {} out of range (0.0..=1.0)",
            config.default_mutation_threshold
        ));
    }

    for (id, budget) in &config.budgets {
        if id.is_empty() {
            errors.push("budget id must not be empty".into());
        }
        if budget.max_cost <= 0.0 {
            errors.push(format!("budget '{id}': max_cost must be positive"));
        }
        if !(0.0..=100.0).contains(&budget.alert_threshold_pct) {
            errors.push(format!(
                "budget '{id}': alert_threshold_pct {} out of range (0..=100)",
                budget.alert_threshold_pct
            ));
        } else if budget.alert_threshold_pct < LOW_ALERT_THRESHOLD_PCT {
            warnings.push(ConfigWarning::LowAlertThreshold {
                budget: id.clone(),
                pct: budget.alert_threshold_pct,
            });
        }
        if let Some(secs) = budget.mutation_deadline_secs
            && secs > LARGE_MUTATION_DEADLINE_THRESHOLD_SECS
        {
            warnings.push(ConfigWarning::LargeMutationDeadline {
                context: id.clone(),
                secs,
            });
        }
    }

    if config.evidence_store_dir.is_none() {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "evidence_store_dir".into(),
            hint: "evidence events will only be kept in memory for this process lifetime".into(),
        });
    }
    if config.redaction_policies_path.is_none() {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "redaction_policies_path".into(),
            hint: "only the built-in redaction policies will be registered".into(),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations. Values in `overlay` take precedence over `base`.
///
/// Budget maps are combined; on id collisions the overlay entry wins.
pub fn merge_configs(base: CcpConfig, overlay: CcpConfig) -> CcpConfig {
    let mut budgets = base.budgets;
    budgets.extend(overlay.budgets);
    CcpConfig {
        log_level: overlay.log_level.or(base.log_level),
        evidence_store_dir: overlay.evidence_store_dir.or(base.evidence_store_dir),
        redaction_policies_path: overlay.redaction_policies_path.or(base.redaction_policies_path),
        server: overlay.server,
        budgets,
        default_mutation_threshold: overlay.default_mutation_threshold,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let cfg = CcpConfig::default();
        let warnings = validate_config(&cfg).expect("default config should be valid");
        assert!(!warnings.is_empty(), "should have advisory warnings");
    }

    #[test]
    fn default_config_has_sensible_defaults() {
        let cfg = CcpConfig::default();
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
        assert!(cfg.budgets.is_empty());
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn parse_valid_toml_string() {
        let toml = r#"
            log_level = "debug"
            evidence_store_dir = "/tmp/evidence"

            [server]
            port = 9090

            [budgets.default]
            max_cost = 100.0
            alert_threshold_pct = 75.0
        "#;
        let cfg = parse_toml(toml).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.budgets.len(), 1);
    }

    #[test]
    fn parse_invalid_toml_gives_parse_error() {
        let bad = "this is [not valid toml =";
        let err = parse_toml(bad).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn validation_catches_invalid_log_level() {
        let cfg = CcpConfig {
            log_level: Some("verbose".into()),
            ..Default::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_catches_non_positive_budget_ceiling() {
        let mut cfg = CcpConfig::default();
        cfg.budgets.insert(
            "b".into(),
            BudgetConfig {
                max_cost: 0.0,
                alert_threshold_pct: 80.0,
                mutation_deadline_secs: None,
            },
        );
        let err = validate_config(&cfg).unwrap_err();
        match err {
            ConfigError::ValidationError { reasons } => {
                assert!(reasons.iter().any(|r| r.contains("max_cost must be positive")));
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn validation_catches_alert_threshold_out_of_range() {
        let mut cfg = CcpConfig::default();
        cfg.budgets.insert(
            "b".into(),
            BudgetConfig {
                max_cost: 10.0,
                alert_threshold_pct: 150.0,
                mutation_deadline_secs: None,
            },
        );
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn low_alert_threshold_produces_warning() {
        let mut cfg = CcpConfig::default();
        cfg.evidence_store_dir = Some("/tmp".into());
        cfg.redaction_policies_path = Some("/tmp/policies.toml".into());
        cfg.budgets.insert(
            "b".into(),
            BudgetConfig {
                max_cost: 10.0,
                alert_threshold_pct: 5.0,
                mutation_deadline_secs: None,
            },
        );
        let warnings = validate_config(&cfg).unwrap();
        assert!(
            warnings
                .iter()
                .any(|w| matches!(w, ConfigWarning::LowAlertThreshold { .. }))
        );
    }

    #[test]
    fn large_mutation_deadline_produces_warning() {
        let mut cfg = CcpConfig::default();
        cfg.evidence_store_dir = Some("/tmp".into());
        cfg.redaction_policies_path = Some("/tmp/policies.toml".into());
        cfg.budgets.insert(
            "b".into(),
            BudgetConfig {
                max_cost: 10.0,
                alert_threshold_pct: 80.0,
                mutation_deadline_secs: Some(7200),
            },
        );
        let warnings = validate_config(&cfg).unwrap();
        assert!(
            warnings
                .iter()
                .any(|w| matches!(w, ConfigWarning::LargeMutationDeadline { .. }))
        );
    }

    #[test]
    fn merge_overlay_overrides_base() {
        let base = CcpConfig {
            log_level: Some("info".into()),
            ..Default::default()
        };
        let overlay = CcpConfig {
            log_level: None,
            ..Default::default()
        };
        let merged = merge_configs(base, overlay);
        assert_eq!(merged.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn merge_combines_budget_maps() {
        let mut base = CcpConfig::default();
        base.budgets.insert(
            "a".into(),
            BudgetConfig {
                max_cost: 10.0,
                alert_threshold_pct: 80.0,
                mutation_deadline_secs: None,
            },
        );
        let mut overlay = CcpConfig::default();
        overlay.budgets.insert(
            "b".into(),
            BudgetConfig {
                max_cost: 20.0,
                alert_threshold_pct: 80.0,
                mutation_deadline_secs: None,
            },
        );
        let merged = merge_configs(base, overlay);
        assert!(merged.budgets.contains_key("a"));
        assert!(merged.budgets.contains_key("b"));
    }

    #[test]
    fn merge_overlay_budget_wins_on_collision() {
        let mut base = CcpConfig::default();
        base.budgets.insert(
            "b".into(),
            BudgetConfig {
                max_cost: 10.0,
                alert_threshold_pct: 80.0,
                mutation_deadline_secs: None,
            },
        );
        let mut overlay = CcpConfig::default();
        overlay.budgets.insert(
            "b".into(),
            BudgetConfig {
                max_cost: 999.0,
                alert_threshold_pct: 80.0,
                mutation_deadline_secs: None,
            },
        );
        let merged = merge_configs(base, overlay);
        assert_eq!(merged.budgets["b"].max_cost, 999.0);
    }

    #[test]
    fn empty_string_toml_parses_to_defaults() {
        let cfg = parse_toml("").unwrap();
        assert_eq!(cfg.log_level, None);
        assert!(cfg.budgets.is_empty());
    }

    #[test]
    fn toml_roundtrip() {
        let mut cfg = CcpConfig {
            log_level: Some("debug".into()),
            evidence_store_dir: Some("/ev".into()),
            ..Default::default()
        };
        cfg.budgets.insert(
            "m".into(),
            BudgetConfig {
                max_cost: 5.0,
                alert_threshold_pct: 80.0,
                mutation_deadline_secs: None,
            },
        );
        let serialized = toml::to_string(&cfg).unwrap();
        let deserialized: CcpConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(cfg, deserialized);
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ccp.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "log_level = \"warn\"\nevidence_store_dir = \"/tmp/e\"").unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("warn"));
        assert_eq!(cfg.evidence_store_dir.as_deref(), Some("/tmp/e"));
    }

    #[test]
    fn load_missing_file_gives_file_not_found() {
        let err = load_config(Some(Path::new("/nonexistent/ccp.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn load_none_returns_default() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn validation_catches_empty_budget_id() {
        let mut cfg = CcpConfig::default();
        cfg.budgets.insert(
            "".into(),
            BudgetConfig {
                max_cost: 10.0,
                alert_threshold_pct: 80.0,
                mutation_deadline_secs: None,
            },
        );
        let err = validate_config(&cfg).unwrap_err();
        match err {
            ConfigError::ValidationError { reasons } => {
                assert!(reasons.iter().any(|r| r.contains("id must not be empty")));
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn config_error_display() {
        let e = ConfigError::FileNotFound {
            path: "/foo".into(),
        };
        assert!(e.to_string().contains("/foo"));

        let e = ConfigError::ParseError {
            reason: "bad toml".into(),
        };
        assert!(e.to_string().contains("bad toml"));
    }

    #[test]
    fn config_warning_display() {
        let w = ConfigWarning::MissingOptionalField {
            field: "f".into(),
            hint: "h".into(),
        };
        assert!(w.to_string().contains('f'));

        let w = ConfigWarning::LargeMutationDeadline {
            context: "b".into(),
            secs: 9999,
        };
        assert!(w.to_string().contains("9999"));

        let w = ConfigWarning::LowAlertThreshold {
            budget: "b".into(),
            pct: 5.0,
        };
        assert!(w.to_string().contains("5"));
    }
}
