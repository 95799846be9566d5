//! Engine configuration
//!
//! Small, defaulted knobs for the mock engine. Loadable from a TOML string
//! so test harnesses can tune them without code changes.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// Configuration for the mock engine
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether stubbed calls with mockable return types create chained mocks
    pub chaining_enabled: bool,
    /// Maximum number of invocations rendered in a scenario report
    pub max_report_invocations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            chaining_enabled: true,
            max_report_invocations: 50,
        }
    }
}

static DEFAULT_CONFIG: Lazy<EngineConfig> = Lazy::new(EngineConfig::default);

impl EngineConfig {
    /// Parse a configuration from a TOML string; missing keys use defaults
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    /// Shared default configuration
    pub fn shared_default() -> &'static EngineConfig {
        &DEFAULT_CONFIG
    }
}
