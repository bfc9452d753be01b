//! Sync configuration
//!
//! Every field has a default, so `{}` (or no config at all) is valid.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reconcile::UpdateStrategy;
use crate::retry::RetryPolicy;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid sync config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid sync config: {0}")]
    Invalid(String),
}

/// Drag gesture tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Pointer travel before a press becomes a drag
    pub threshold_px: f64,
    /// Dead band around slot midpoints
    pub hysteresis_px: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self { threshold_px: 5.0, hysteresis_px: 4.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub api_base_url: String,
    pub retry: RetryPolicy,
    pub drag: DragConfig,
    pub update_strategy: UpdateStrategy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            drag: DragConfig::default(),
            update_strategy: UpdateStrategy::default(),
        }
    }
}

impl SyncConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Config from an optional raw value (e.g. a build-time env var);
    /// absent or blank means defaults
    pub fn from_optional(raw: Option<&str>) -> Result<Self, ConfigError> {
        match raw.map(str::trim) {
            Some(json) if !json.is_empty() => Self::from_json(json),
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url is empty".to_string()));
        }
        if self.drag.threshold_px < 0.0 || self.drag.hysteresis_px < 0.0 {
            return Err(ConfigError::Invalid("drag distances must not be negative".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = SyncConfig::from_json("{}").unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.base_backoff_ms, 250);
        assert_eq!(config.drag.threshold_px, 5.0);
        assert_eq!(config.update_strategy, UpdateStrategy::Minimal);
    }

    #[test]
    fn test_partial_override() {
        let config = SyncConfig::from_json(
            r#"{ "api_base_url": "https://api.example.org/v1", "retry": { "max_retries": 0 }, "update_strategy": "full_order" }"#,
        )
        .unwrap();
        assert_eq!(config.api_base_url, "https://api.example.org/v1");
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.retry.base_backoff_ms, 250);
        assert_eq!(config.update_strategy, UpdateStrategy::FullOrder);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(SyncConfig::from_json("not json"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            SyncConfig::from_json(r#"{ "api_base_url": " " }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SyncConfig::from_json(r#"{ "drag": { "threshold_px": -1 } }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_raw_value_uses_defaults() {
        assert_eq!(SyncConfig::from_optional(None).unwrap(), SyncConfig::default());
        assert_eq!(SyncConfig::from_optional(Some("  ")).unwrap(), SyncConfig::default());
    }
}
