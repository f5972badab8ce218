//! Orchestrator configuration

use crate::{ConfigError, HelixError, HelixResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default cap on agents per `run_parallel` call.
pub const DEFAULT_MAX_PARALLEL: usize = 10;

/// Default per-run deadline in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default page size for `list_agents`.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Engine-wide tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum agents accepted by one parallel execution request.
    pub max_parallel: usize,
    /// Deadline applied when a request does not carry one.
    pub default_timeout: Duration,
    /// Page size used when `list_agents` receives no limit.
    pub default_list_limit: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL,
            default_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl OrchestratorConfig {
    /// Validate the configuration.
    ///
    /// Validates:
    /// - max_parallel > 0
    /// - default_timeout is positive
    /// - default_list_limit > 0
    pub fn validate(&self) -> HelixResult<()> {
        if self.max_parallel == 0 {
            return Err(HelixError::Config(ConfigError::InvalidValue {
                field: "max_parallel".to_string(),
                value: self.max_parallel.to_string(),
                reason: "max_parallel must be greater than 0".to_string(),
            }));
        }

        if self.default_timeout.is_zero() {
            return Err(HelixError::Config(ConfigError::InvalidValue {
                field: "default_timeout".to_string(),
                value: format!("{:?}", self.default_timeout),
                reason: "default_timeout must be positive".to_string(),
            }));
        }

        if self.default_list_limit == 0 {
            return Err(HelixError::Config(ConfigError::InvalidValue {
                field: "default_list_limit".to_string(),
                value: self.default_list_limit.to_string(),
                reason: "default_list_limit must be greater than 0".to_string(),
            }));
        }

        Ok(())
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `HELIX_MAX_PARALLEL`: Agents per parallel request (default: 10)
    /// - `HELIX_DEFAULT_TIMEOUT_SECS`: Per-run deadline (default: 120)
    /// - `HELIX_LIST_LIMIT`: Default `list_agents` page size (default: 50)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_parallel: std::env::var("HELIX_MAX_PARALLEL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_parallel),
            default_timeout: std::env::var("HELIX_DEFAULT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_timeout),
            default_list_limit: std::env::var("HELIX_LIST_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.default_list_limit),
        }
    }
}
