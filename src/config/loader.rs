//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading workflow
//! configuration from a YAML file.

use std::fs;
use std::path::Path;

use crate::error::{WorkflowError, WorkflowResult};

use super::types::WorkflowConfig;

/// Loads and provides access to workflow configuration.
///
/// # Example
///
/// ```no_run
/// use payroll_workflow::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/workflow.yaml").unwrap();
/// let timeouts = &loader.config().timeouts;
/// println!("default action timeout: {}ms", timeouts.default_ms);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: WorkflowConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified YAML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file (e.g., "./config/workflow.yaml")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if the
    /// file is missing or contains invalid YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> WorkflowResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| WorkflowError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        let config =
            serde_yaml::from_str(&content).map_err(|e| WorkflowError::ConfigParse {
                path: path_str,
                message: e.to_string(),
            })?;

        Ok(Self { config })
    }

    /// Builds a loader carrying the compiled-in defaults, for running
    /// without a configuration file.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Returns the underlying workflow configuration.
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> WorkflowConfig {
        self.config
    }
}
