//! Configuration for the scanner
//!
//! Configuration is supplied as YAML or JSON text by the host; this crate never
//! reads files itself.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Evaluate elements in parallel
    pub parallel: bool,

    /// Number of parallel jobs (0 = auto-detect)
    pub jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: 0,
        }
    }
}

impl EngineConfig {
    /// Worker count after auto-detection
    pub fn effective_jobs(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get()
        } else {
            self.jobs
        }
    }
}

/// Rule selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Disabled rules
    pub disabled: Vec<String>,

    /// Enabled rules (empty = all)
    pub enabled: Vec<String>,

    /// Select rules by prefix (e.g., "Name" selects all Name* rules)
    pub extend: Vec<String>,

    /// Ignore rules by prefix (e.g., "BoundingRectangle")
    pub ignore: Vec<String>,
}

/// Timing collection settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Collect per-rule evaluation timings
    pub rule_timings: bool,

    /// Warn when one evaluation takes longer than this (0 = off)
    pub slow_rule_threshold_ms: u64,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine settings
    pub engine: EngineConfig,

    /// Rule selection
    pub rules: RulesConfig,

    /// Timing collection
    pub diagnostics: DiagnosticsConfig,
}

impl Config {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML configuration text
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse JSON configuration text
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let lists = [
            ("disabled", &self.rules.disabled),
            ("enabled", &self.rules.enabled),
            ("extend", &self.rules.extend),
            ("ignore", &self.rules.ignore),
        ];
        for (name, ids) in lists {
            if ids.iter().any(|id| id.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "rules.{} contains an empty rule id",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Self) {
        // Engine settings - other takes precedence if non-default
        if other.engine.jobs != 0 {
            self.engine.jobs = other.engine.jobs;
        }
        // parallel always inherits from other
        self.engine.parallel = other.engine.parallel;

        // Rules - merge
        self.rules.disabled.extend(other.rules.disabled);
        if !other.rules.enabled.is_empty() {
            self.rules.enabled = other.rules.enabled;
        }
        self.rules.extend.extend(other.rules.extend);
        self.rules.ignore.extend(other.rules.ignore);

        if other.diagnostics.rule_timings {
            self.diagnostics.rule_timings = true;
        }
        if other.diagnostics.slow_rule_threshold_ms != 0 {
            self.diagnostics.slow_rule_threshold_ms = other.diagnostics.slow_rule_threshold_ms;
        }
    }

    /// Merge host overrides into configuration
    pub fn merge_overrides(
        &mut self,
        parallel: Option<bool>,
        jobs: Option<usize>,
        disabled_rules: Option<Vec<String>>,
        enabled_rules: Option<Vec<String>>,
    ) {
        if let Some(p) = parallel {
            self.engine.parallel = p;
        }
        if let Some(j) = jobs {
            self.engine.jobs = j;
        }
        if let Some(disabled) = disabled_rules {
            self.rules.disabled.extend(disabled);
        }
        if let Some(enabled) = enabled_rules {
            self.rules.enabled = enabled;
        }
    }

    /// Add prefixes to extend (select rules by prefix)
    pub fn add_extend_prefixes(&mut self, prefixes: Vec<String>) {
        self.rules.extend.extend(prefixes);
    }

    /// Add prefixes to ignore
    pub fn add_ignore_prefixes(&mut self, prefixes: Vec<String>) {
        self.rules.ignore.extend(prefixes);
    }

    /// Check if a rule is enabled
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        // Explicit disable wins over everything
        if self.rules.disabled.iter().any(|id| id == rule_id) {
            return false;
        }

        if self.matches_ignore_prefix(rule_id) {
            return false;
        }

        // If enabled list is not empty, rule must be in it
        if !self.rules.enabled.is_empty() {
            return self.rules.enabled.iter().any(|id| id == rule_id);
        }

        self.matches_extend_prefix(rule_id)
    }

    /// Check if a rule matches any prefix in the extend list
    pub fn matches_extend_prefix(&self, rule_id: &str) -> bool {
        if self.rules.extend.is_empty() {
            return true; // No prefix filter = all match
        }
        starts_with_any(rule_id, &self.rules.extend)
    }

    /// Check if a rule matches any prefix in the ignore list
    pub fn matches_ignore_prefix(&self, rule_id: &str) -> bool {
        starts_with_any(rule_id, &self.rules.ignore)
    }
}

/// Case-insensitive prefix match
fn starts_with_any(rule_id: &str, prefixes: &[String]) -> bool {
    let rule_upper = rule_id.to_uppercase();
    prefixes
        .iter()
        .any(|prefix| rule_upper.starts_with(&prefix.to_uppercase()))
}
