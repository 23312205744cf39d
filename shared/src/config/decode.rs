//! Decoder configuration.
//!
//! Defines the tunables of response decoding and label extraction.

use crate::prom::LABEL_PREFIX;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Default timestamp resolution, matching the usual scrape-interval jitter.
pub const DEFAULT_TIMESTAMP_RESOLUTION: f64 = 10.0;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The timestamp resolution is not a finite positive number.
    #[error("Timestamp resolution must be a finite number greater than zero, got {0}")]
    InvalidResolution(f64),

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

/// Configuration for decoding query responses.
///
/// # Example
///
/// ```
/// use shared::config::DecodeConfig;
///
/// let config: DecodeConfig = serde_json::from_str(r#"{"timestamp_resolution": 60.0}"#).unwrap();
/// assert_eq!(config.timestamp_resolution, 60.0);
/// assert_eq!(config.label_prefix, "label_");
/// assert!(config.validate_config().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DecodeConfig {
    /// Sample timestamps are snapped to the nearest multiple of this value.
    #[validate(range(exclusive_min = 0.0, message = "Timestamp resolution must be positive"))]
    pub timestamp_resolution: f64,

    /// Prefix identifying label fields in a result's label set.
    #[validate(length(min = 1, message = "Label prefix cannot be empty"))]
    pub label_prefix: String,
}

impl DecodeConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The timestamp resolution is not finite or not positive
    /// - The label prefix is empty
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        if !self.timestamp_resolution.is_finite() || self.timestamp_resolution <= 0.0 {
            return Err(ConfigError::InvalidResolution(self.timestamp_resolution));
        }

        self.validate()?;
        Ok(())
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            timestamp_resolution: DEFAULT_TIMESTAMP_RESOLUTION,
            label_prefix: LABEL_PREFIX.to_string(),
        }
    }
}
