//! Output rendering for decoded results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use shared::models::Vector;
use shared::prom::{QueryResult, QueryResults};

/// A decoded result set as printed by the `decode` command.
#[derive(Debug, Serialize)]
pub struct RenderedResults<'a> {
    pub query: &'a str,
    pub results: Vec<RenderedResult<'a>>,
}

#[derive(Debug, Serialize)]
pub struct RenderedResult<'a> {
    pub metric: &'a Map<String, Value>,
    pub values: Vec<RenderedSample>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct RenderedSample {
    pub timestamp: f64,
    /// RFC 3339 rendering, assuming the timestamp is in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub value: f64,
}

impl<'a> From<&'a QueryResults> for RenderedResults<'a> {
    fn from(results: &'a QueryResults) -> Self {
        Self {
            query: &results.query,
            results: results.iter().map(RenderedResult::from).collect(),
        }
    }
}

impl<'a> From<&'a QueryResult> for RenderedResult<'a> {
    fn from(result: &'a QueryResult) -> Self {
        Self {
            metric: &result.metric,
            values: result.values.iter().map(RenderedSample::from).collect(),
        }
    }
}

impl From<&Vector> for RenderedSample {
    fn from(sample: &Vector) -> Self {
        Self {
            timestamp: sample.timestamp,
            time: rfc3339(sample.timestamp),
            value: sample.value,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn rfc3339(seconds: f64) -> Option<String> {
    if !seconds.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis((seconds * 1000.0).round() as i64)
        .map(|time| time.to_rfc3339())
}
