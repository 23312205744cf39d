//! Data point parsing.
//!
//! Turns one raw `[timestamp, "value"]` pair into a [`Vector`], snapping the
//! timestamp and replacing non-finite values.

use super::error::DecodeError;
use super::warning::Warning;
use crate::config::DEFAULT_TIMESTAMP_RESOLUTION;
use crate::models::Vector;
use serde_json::Value;

/// Parses raw data points from a query response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPointParser {
    resolution: f64,
}

impl DataPointParser {
    /// Creates a parser that snaps timestamps to multiples of `resolution`.
    #[must_use]
    pub const fn new(resolution: f64) -> Self {
        Self { resolution }
    }

    /// Returns the timestamp resolution of this parser.
    #[must_use]
    pub const fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Parses a single data point.
    ///
    /// Returns the sample together with at most one warning. `+Inf`, `-Inf`
    /// and `NaN` values are replaced with `0.0` and reported as a warning
    /// rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::DataPointMalformed`] if the point is not a
    /// two-element sequence of a numeric timestamp and a string value, and
    /// [`DecodeError::NumericParseFailure`] if the value string does not
    /// parse as a float.
    ///
    /// # Example
    ///
    /// ```
    /// use shared::prom::{DataPointParser, Warning};
    /// use serde_json::json;
    ///
    /// let parser = DataPointParser::default();
    /// let (sample, warning) = parser.parse(&json!([1_700_000_004.2, "+Inf"])).unwrap();
    ///
    /// assert_eq!(sample.timestamp, 1_700_000_000.0);
    /// assert_eq!(sample.value, 0.0);
    /// assert_eq!(warning, Some(Warning::Inf));
    /// ```
    pub fn parse(&self, point: &Value) -> Result<(Vector, Option<Warning>), DecodeError> {
        let [timestamp, value] = point
            .as_array()
            .map(Vec::as_slice)
            .ok_or(DecodeError::DataPointMalformed)?
        else {
            return Err(DecodeError::DataPointMalformed);
        };

        let timestamp = timestamp.as_f64().ok_or(DecodeError::DataPointMalformed)?;
        let raw = value.as_str().ok_or(DecodeError::DataPointMalformed)?;
        let parsed: f64 = raw.parse()?;

        let (value, warning) = if parsed.is_infinite() {
            (0.0, Some(Warning::Inf))
        } else if parsed.is_nan() {
            (0.0, Some(Warning::NaN))
        } else {
            (parsed, None)
        };

        Ok((Vector::new(self.snap(timestamp), value), warning))
    }

    /// Snaps a timestamp to the nearest multiple of the resolution.
    fn snap(&self, timestamp: f64) -> f64 {
        (timestamp / self.resolution).round() * self.resolution
    }
}

impl Default for DataPointParser {
    fn default() -> Self {
        Self::new(DEFAULT_TIMESTAMP_RESOLUTION)
    }
}
