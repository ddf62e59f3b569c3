//! CLI configuration
//!
//! A TOML file with the account name and a `[bridge]` table holding the
//! bridge configuration. Every field is optional.
//!
//! ```toml
//! account = "alice"
//!
//! [bridge.timers]
//! pump_interval_ms = 50
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use toxbridge_core::BridgeConfig;

use crate::error::{CliError, Result};

pub const DEFAULT_ACCOUNT: &str = "toxbridge";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Account name; the simulated identity is derived from it
    pub account: String,
    pub bridge: BridgeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            account: DEFAULT_ACCOUNT.to_string(),
            bridge: BridgeConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.account.trim().is_empty() {
            return Err(CliError::Config("account name is empty".to_string()));
        }
        self.bridge.validate()?;
        Ok(())
    }
}
