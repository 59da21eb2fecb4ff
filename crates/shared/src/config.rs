//! Application configuration management.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Workflow configuration.
    #[serde(default)]
    pub workflow: WorkflowConfig,
    /// Seeder configuration.
    #[serde(default)]
    pub seeder: SeederConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Fallback `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

fn default_filter() -> String {
    "seeder=info,exportflow_ledger=info".to_string()
}

/// Workflow configuration.
///
/// Both fields are optional; the built-in standard transition table and
/// role-to-capability mapping apply when they are absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowConfig {
    /// Path to a declarative transition table document.
    #[serde(default)]
    pub table_file: Option<PathBuf>,
    /// Role-to-capability mapping, one entry per organization.
    #[serde(default)]
    pub organizations: Vec<OrganizationConfig>,
}

/// Capabilities granted to one organization.
#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationConfig {
    /// Organization label as supplied by the identity provider.
    pub msp_id: String,
    /// Capability names, e.g. `quality_authority`.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Seeder configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SeederConfig {
    /// Number of sample cases to create.
    #[serde(default = "default_sample_cases")]
    pub sample_cases: u32,
}

impl Default for SeederConfig {
    fn default() -> Self {
        Self {
            sample_cases: default_sample_cases(),
        }
    }
}

fn default_sample_cases() -> u32 {
    3
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("EXPORTFLOW").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

/// Loads an auxiliary configuration document, such as a transition table.
///
/// The format is inferred from the file extension.
///
/// # Errors
///
/// Returns an error if the file is missing or does not match `T`.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::from(path).required(true))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
