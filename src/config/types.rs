//! Configuration types for the workflow engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML configuration file. Every field has a
//! compiled-in default so the engine runs without any file present.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::workflow::ActionKey;

/// Timeout budgets for workflow actions, in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActionTimeouts {
    /// Timeout for audit and status actions.
    pub default_ms: u64,
    /// Timeout for the integrated calculation engine action, which has a
    /// heavier backend cost.
    pub calculation_ms: u64,
    /// Per-action overrides, keyed by action key string.
    pub overrides: HashMap<String, u64>,
}

impl Default for ActionTimeouts {
    fn default() -> Self {
        Self {
            default_ms: 30_000,
            calculation_ms: 180_000,
            overrides: HashMap::new(),
        }
    }
}

impl ActionTimeouts {
    /// The timeout budget for one action key.
    ///
    /// Overrides win over the class defaults; the calculation engine
    /// action otherwise gets the long budget and everything else the
    /// default.
    pub fn for_action(&self, key: ActionKey) -> Duration {
        if let Some(override_ms) = self.overrides.get(key.as_str()) {
            return Duration::from_millis(*override_ms);
        }
        match key {
            ActionKey::RunCalculationEngine => Duration::from_millis(self.calculation_ms),
            _ => Duration::from_millis(self.default_ms),
        }
    }
}

/// Polling policy for calculation progress snapshots.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProgressPolling {
    /// Interval between progress fetches, in milliseconds.
    pub interval_ms: u64,
    /// Multiply the interval by two after each fetch when enabled.
    pub exponential_backoff: bool,
    /// Upper bound on the backed-off interval, in milliseconds.
    pub max_interval_ms: u64,
    /// Give up after this many fetches without a terminal status.
    pub max_attempts: u32,
}

impl Default for ProgressPolling {
    fn default() -> Self {
        Self {
            interval_ms: 1_500,
            exponential_backoff: false,
            max_interval_ms: 8_000,
            max_attempts: 120,
        }
    }
}

/// Workflow engine configuration from workflow.yaml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Timeout budgets for workflow actions.
    pub timeouts: ActionTimeouts,
    /// Polling policy for calculation progress.
    pub polling: ProgressPolling,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = ActionTimeouts::default();
        assert_eq!(
            timeouts.for_action(ActionKey::RunAudit),
            Duration::from_secs(30)
        );
        assert_eq!(
            timeouts.for_action(ActionKey::RunCalculationEngine),
            Duration::from_secs(180)
        );
    }

    #[test]
    fn test_override_wins_over_class_default() {
        let mut timeouts = ActionTimeouts::default();
        timeouts
            .overrides
            .insert("run_audit".to_string(), 5_000);
        assert_eq!(
            timeouts.for_action(ActionKey::RunAudit),
            Duration::from_millis(5_000)
        );
        assert_eq!(
            timeouts.for_action(ActionKey::RunAdvancedAudit),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_config_deserializes_from_partial_yaml() {
        let yaml = r#"
timeouts:
  default_ms: 10000
"#;
        let config: WorkflowConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.timeouts.default_ms, 10_000);
        // Unspecified sections fall back to defaults.
        assert_eq!(config.timeouts.calculation_ms, 180_000);
        assert_eq!(config.polling.interval_ms, 1_500);
    }

    #[test]
    fn test_config_deserializes_from_empty_yaml() {
        let config: WorkflowConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.timeouts.default_ms, 30_000);
        assert_eq!(config.polling.max_attempts, 120);
    }
}
