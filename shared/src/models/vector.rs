//! Sample data model.
//!
//! Defines the `Vector` structure holding one decoded time-series sample.

use serde::{Deserialize, Serialize};

/// A single timestamped sample from a metrics query.
///
/// Despite the name this is not a mathematical vector; it is the
/// `(timestamp, value)` pair the query API calls a sample.
///
/// # Example
///
/// ```
/// use shared::models::Vector;
///
/// let sample = Vector::new(1_700_000_000.0, 0.25);
/// assert_eq!(sample.timestamp, 1_700_000_000.0);
/// assert_eq!(sample.value, 0.25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// Sample timestamp in the unit of the source query, snapped to the
    /// decoder's resolution.
    pub timestamp: f64,

    /// Sample value. Always finite once decoded.
    pub value: f64,
}

impl Vector {
    /// Creates a new sample.
    #[must_use]
    pub const fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}
