//! Decoded query results and their typed accessors.

use super::error::{DecodeError, FieldError};
use crate::models::Vector;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Prefix marking label fields exported by kube-state-metrics style series.
pub const LABEL_PREFIX: &str = "label_";

/// A single labeled time series from a query response.
///
/// The label set is kept as decoded from the wire because its schema is not
/// known statically. Use [`QueryResult::get_string`] and
/// [`QueryResult::get_labels`] for typed access.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Label name to label value, as decoded.
    pub metric: Map<String, Value>,

    /// Samples in the order they appeared in the response.
    pub values: Vec<Vector>,
}

impl QueryResult {
    /// Creates a result from a label set and its samples.
    #[must_use]
    pub fn new(metric: Map<String, Value>, values: Vec<Vector>) -> Self {
        Self { metric, values }
    }

    /// Returns the requested label as a string.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::FieldMissing`] if the label is absent and
    /// [`FieldError::FieldWrongType`] if its value is not a string.
    ///
    /// # Example
    ///
    /// ```
    /// use shared::prom::QueryResult;
    /// use serde_json::json;
    ///
    /// let metric = json!({"pod": "api-0"}).as_object().cloned().unwrap();
    /// let result = QueryResult::new(metric, Vec::new());
    ///
    /// assert_eq!(result.get_string("pod").unwrap(), "api-0");
    /// assert!(result.get_string("namespace").is_err());
    /// ```
    pub fn get_string(&self, field: &str) -> Result<String, FieldError> {
        self.metric
            .get(field)
            .ok_or_else(|| FieldError::FieldMissing(field.to_string()))?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| FieldError::FieldWrongType(field.to_string()))
    }

    /// Returns all `label_`-prefixed fields with the prefix stripped.
    ///
    /// Fields whose value is not a string are skipped and logged. Never fails;
    /// returns an empty map when no field carries the prefix.
    #[must_use]
    pub fn get_labels(&self) -> HashMap<String, String> {
        self.get_labels_with_prefix(LABEL_PREFIX)
    }

    /// Same as [`QueryResult::get_labels`] with a caller-chosen prefix.
    #[must_use]
    pub fn get_labels_with_prefix(&self, prefix: &str) -> HashMap<String, String> {
        let mut labels = HashMap::new();

        for (key, value) in &self.metric {
            let Some(label) = key.strip_prefix(prefix) else {
                continue;
            };

            let Some(value) = value.as_str() else {
                tracing::warn!("Failed to parse label value for label: '{}'", label);
                continue;
            };

            labels.insert(label.to_string(), value.to_string());
        }

        labels
    }

    /// Renders the label set as `{name: value, ...}` for diagnostics.
    #[must_use]
    pub fn labels_string(&self) -> String {
        render_labels(&self.metric)
    }
}

/// All results of one query together with the query text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResults {
    /// The query that produced these results.
    pub query: String,

    /// Results in response order.
    pub results: Vec<QueryResult>,
}

impl QueryResults {
    /// Creates a result set for `query`.
    #[must_use]
    pub fn new(query: impl Into<String>, results: Vec<QueryResult>) -> Self {
        Self {
            query: query.into(),
            results,
        }
    }

    /// Returns the value of the first sample of the first result.
    ///
    /// Intended for queries known to produce a single scalar, such as
    /// normalization queries.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::NoData`] if there are no results and
    /// [`DecodeError::ResultFormatError`] if the first result has no samples.
    pub fn get_first_value(&self) -> Result<f64, DecodeError> {
        let first = self.results.first().ok_or(DecodeError::NoData)?;
        let sample = first.values.first().ok_or(DecodeError::ResultFormatError)?;
        Ok(sample.value)
    }

    /// Returns true if the result set holds no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns the number of results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Iterates over the results in response order.
    pub fn iter(&self) -> std::slice::Iter<'_, QueryResult> {
        self.results.iter()
    }
}

impl<'a> IntoIterator for &'a QueryResults {
    type Item = &'a QueryResult;
    type IntoIter = std::slice::Iter<'a, QueryResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

pub(crate) fn render_labels(metric: &Map<String, Value>) -> String {
    let pairs: Vec<String> = metric
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{key}: {s}"),
            other => format!("{key}: {other}"),
        })
        .collect();

    format!("{{{}}}", pairs.join(", "))
}
