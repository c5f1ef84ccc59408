//! Runtime settings shared by repositories and the staging coordinator.

use std::time::Duration;

use oxide_contrib_core::DEFAULT_STAGING_PREFIX;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Execution settings.
///
/// ```rust
/// use oxide_contrib::ContribConfig;
///
/// let config = ContribConfig::from_json(r#"{ "command_timeout_secs": 30 }"#).unwrap();
/// assert_eq!(config.command_timeout().map(|t| t.as_secs()), Some(30));
/// assert_eq!(config.staging_prefix, "#tmp_");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContribConfig {
    /// Per-statement timeout in seconds. `None` waits indefinitely.
    pub command_timeout_secs: Option<u64>,
    /// Prefix of staging temp table names. A leading `#` is always enforced.
    pub staging_prefix: String,
}

impl Default for ContribConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: None,
            staging_prefix: DEFAULT_STAGING_PREFIX.to_string(),
        }
    }
}

impl ContribConfig {
    /// Parses settings from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ContribError::Config`] on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the per-statement timeout.
    #[must_use]
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ContribConfig::from_json("{}").unwrap();
        assert_eq!(config, ContribConfig::default());
        assert_eq!(config.command_timeout(), None);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ContribConfig::from_json("{ nope"),
            Err(crate::ContribError::Config(_))
        ));
    }
}
