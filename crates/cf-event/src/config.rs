//! Manager configuration

use cf_core::{CfError, CfResult};
use serde::{Deserialize, Serialize};

/// Diagnostics toggles and RNG seed for [`EventManager`](crate::EventManager)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Warn when a `play` request resolves to nothing
    pub log_missing_events: bool,
    /// Log every `play` request
    pub log_all_events: bool,
    /// Log each resolution attempt and hit
    pub log_lookups: bool,
    /// Log each physical bank load
    pub log_bank_loads: bool,
    /// Seed for variant selection (`None` = OS entropy)
    pub seed: Option<u64>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            log_missing_events: false,
            log_all_events: false,
            log_lookups: false,
            log_bank_loads: true,
            seed: None,
        }
    }
}

impl ManagerConfig {
    /// Everything on, for debugging sessions
    pub fn verbose() -> Self {
        Self {
            log_missing_events: true,
            log_all_events: true,
            log_lookups: true,
            log_bank_loads: true,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn from_json_str(json: &str) -> CfResult<Self> {
        serde_json::from_str(json).map_err(|e| CfError::Serialization(e.to_string()))
    }

    pub fn from_yaml_str(yaml: &str) -> CfResult<Self> {
        serde_yml::from_str(yaml).map_err(|e| CfError::Serialization(e.to_string()))
    }

    pub fn to_json_string(&self) -> CfResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CfError::Serialization(e.to_string()))
    }
}
