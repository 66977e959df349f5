//! Evaluation settings.
//!
//! Loaded from TOML; every key is optional and falls back to its default, so
//! an empty file (or no file) gives the standard scoring rules.
//!
//! ```toml
//! time_eq_tol = 1e-8
//! acl_switch_up_allowed = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Tolerance when comparing accumulated times (uptime, downtime, window bounds).
    pub time_eq_tol: f64,

    /// AC lines may be switched on during the horizon.
    pub acl_switch_up_allowed: bool,

    /// AC lines may be switched off during the horizon.
    pub acl_switch_dn_allowed: bool,

    /// Transformers may be switched on during the horizon.
    pub xfr_switch_up_allowed: bool,

    /// Transformers may be switched off during the horizon.
    pub xfr_switch_dn_allowed: bool,

    /// Clamp tap ratio and phase shift onto their bounds before computing flows.
    /// When off, out-of-range settings enter the flow equations unchanged.
    pub project_transformer_controls: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            time_eq_tol: 1e-8,
            acl_switch_up_allowed: true,
            acl_switch_dn_allowed: true,
            xfr_switch_up_allowed: true,
            xfr_switch_dn_allowed: true,
            project_transformer_controls: true,
        }
    }
}

impl EvalConfig {
    pub fn from_toml_str(contents: &str) -> GridResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path.
    pub fn load(path: impl AsRef<Path>) -> GridResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> GridResult<()> {
        if !self.time_eq_tol.is_finite() || self.time_eq_tol < 0.0 {
            return Err(GridError::Config(format!(
                "time_eq_tol must be a finite non-negative number, got {}",
                self.time_eq_tol
            )));
        }
        Ok(())
    }
}
