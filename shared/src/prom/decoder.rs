//! Response decoding.
//!
//! Validates the envelope of a metrics query response and decodes every
//! result entry into a typed [`QueryResults`]. Decoding is all-or-nothing:
//! the first structural failure aborts the whole response.

use super::error::DecodeError;
use super::parser::DataPointParser;
use super::result::{render_labels, QueryResult, QueryResults};
use super::warning::Warning;
use crate::config::{ConfigError, DecodeConfig};
use crate::models::Vector;
use serde_json::{Map, Value};
use std::cell::OnceCell;
use std::collections::HashMap;

/// Decodes raw query responses using the default configuration.
///
/// # Errors
///
/// Returns an error if the response is `null`, carries an upstream error, or
/// is structurally malformed at any level.
///
/// # Example
///
/// ```
/// use shared::prom::decode;
/// use serde_json::json;
///
/// let raw = json!({
///     "status": "success",
///     "data": {
///         "resultType": "vector",
///         "result": [
///             {"metric": {"namespace": "default"}, "value": [1_700_000_003, "42"]}
///         ]
///     }
/// });
///
/// let results = decode("sum(up) by (namespace)", &raw).unwrap();
/// assert_eq!(results.get_first_value().unwrap(), 42.0);
/// assert_eq!(results.results[0].values[0].timestamp, 1_700_000_000.0);
/// ```
pub fn decode(query: &str, raw: &Value) -> Result<QueryResults, DecodeError> {
    Decoder::default().decode(query, raw)
}

/// Decoder for metrics query responses.
#[derive(Debug, Clone)]
pub struct Decoder {
    parser: DataPointParser,
    label_prefix: String,
}

impl Default for Decoder {
    fn default() -> Self {
        let config = DecodeConfig::default();
        Self {
            parser: DataPointParser::new(config.timestamp_resolution),
            label_prefix: config.label_prefix,
        }
    }
}

impl Decoder {
    /// Creates a decoder from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &DecodeConfig) -> Result<Self, ConfigError> {
        config.validate_config()?;
        Ok(Self {
            parser: DataPointParser::new(config.timestamp_resolution),
            label_prefix: config.label_prefix.clone(),
        })
    }

    /// Returns the configured label prefix.
    #[must_use]
    pub fn label_prefix(&self) -> &str {
        &self.label_prefix
    }

    /// Returns the labels of `result` carrying the configured prefix, with
    /// the prefix stripped.
    #[must_use]
    pub fn labels(&self, result: &QueryResult) -> HashMap<String, String> {
        result.get_labels_with_prefix(&self.label_prefix)
    }

    /// Decodes `raw`, the deserialized body of a response to `query`.
    ///
    /// Results keep the order of the response. Inf and NaN samples are
    /// replaced with `0.0` and logged at warn level.
    ///
    /// # Errors
    ///
    /// Returns the [`DecodeError`] of the first failed validation step.
    pub fn decode(&self, query: &str, raw: &Value) -> Result<QueryResults, DecodeError> {
        if raw.is_null() {
            return Err(DecodeError::NilResponse);
        }

        let envelope = raw
            .as_object()
            .ok_or(DecodeError::UnexpectedResponseShape)?;

        let Some(data) = envelope.get("data") else {
            return Err(upstream_error(envelope));
        };

        let entries = data
            .as_object()
            .ok_or(DecodeError::DataFieldMalformed)?
            .get("result")
            .ok_or(DecodeError::ResultFieldMissing)?
            .as_array()
            .ok_or(DecodeError::ResultFieldMalformed)?;

        let results = entries
            .iter()
            .map(|entry| self.decode_entry(query, entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QueryResults::new(query, results))
    }

    fn decode_entry(&self, query: &str, entry: &Value) -> Result<QueryResult, DecodeError> {
        let entry = entry.as_object().ok_or(DecodeError::MalformedResultEntry)?;

        let metric = entry
            .get("metric")
            .ok_or(DecodeError::MetricFieldMissing)?
            .as_object()
            .ok_or(DecodeError::MetricFieldMalformed)?;

        let reporter = EntryReporter::new(query, || render_labels(metric));
        let parse = |point: &Value| -> Result<Vector, DecodeError> {
            let (sample, warning) = self.parser.parse(point)?;
            if let Some(warning) = warning {
                reporter.report(warning);
            }
            Ok(sample)
        };

        let values = if let Some(values) = entry.get("values") {
            values
                .as_array()
                .ok_or(DecodeError::ValuesFieldMalformed)?
                .iter()
                .map(&parse)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            let point = entry.get("value").ok_or(DecodeError::ValueFieldMissing)?;
            vec![parse(point)?]
        };

        Ok(QueryResult::new(metric.clone(), values))
    }
}

fn upstream_error(envelope: &Map<String, Value>) -> DecodeError {
    match envelope.get("error").and_then(Value::as_str) {
        Some(message) => DecodeError::UpstreamError(message.to_string()),
        None => DecodeError::UnexpectedResponseShape,
    }
}

/// Logs the warnings of one result entry.
///
/// The label string is rendered on the first warning and reused for the
/// rest of the entry.
struct EntryReporter<'a, R> {
    query: &'a str,
    render: R,
    labels: OnceCell<String>,
}

impl<'a, R: Fn() -> String> EntryReporter<'a, R> {
    fn new(query: &'a str, render: R) -> Self {
        Self {
            query,
            render,
            labels: OnceCell::new(),
        }
    }

    fn report(&self, warning: Warning) {
        let labels = self.labels.get_or_init(&self.render);
        tracing::warn!("{}\nQuery: {}\nLabels: {}", warning, self.query, labels);
    }
}
