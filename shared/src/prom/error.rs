//! Error types for query result decoding and access.

use std::num::ParseFloatError;
use thiserror::Error;

/// Errors that can occur while decoding a query response or reading a
/// decoded result set.
///
/// Every structural variant aborts the whole decode; no partial result set is
/// ever returned alongside one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The raw response was `null`.
    #[error("nil queryResult")]
    NilResponse,

    /// The backend reported a query error instead of data.
    #[error("{0}")]
    UpstreamError(String),

    /// The response carried neither a `data` nor an `error` field.
    #[error("Unexpected response from Prometheus")]
    UnexpectedResponseShape,

    /// The `data` field is not a mapping.
    #[error("Data field improperly formatted in prometheus response")]
    DataFieldMalformed,

    /// The `data` mapping has no `result` field.
    #[error("Result field does not exist in prometheus response")]
    ResultFieldMissing,

    /// The `result` field is not a sequence.
    #[error("Result field improperly formatted in prometheus response")]
    ResultFieldMalformed,

    /// An entry of the `result` sequence is not a mapping.
    #[error("Result is improperly formatted")]
    MalformedResultEntry,

    /// A result entry has no `metric` field.
    #[error("Metric field does not exist in data result vector")]
    MetricFieldMissing,

    /// A result entry's `metric` field is not a mapping.
    #[error("Metric field is improperly formatted")]
    MetricFieldMalformed,

    /// A result entry has neither `value` nor `values`.
    #[error("Value field does not exist in data result vector")]
    ValueFieldMissing,

    /// A result entry's `values` field is not a sequence.
    #[error("Values field is improperly formatted")]
    ValuesFieldMalformed,

    /// A data point is not a `[timestamp, "value"]` pair.
    #[error("Improperly formatted datapoint from Prometheus")]
    DataPointMalformed,

    /// The sample value string is not a valid number.
    #[error(transparent)]
    NumericParseFailure(#[from] ParseFloatError),

    /// The result set holds no results.
    #[error("No data")]
    NoData,

    /// The first result holds no samples.
    #[error("Result is improperly formatted")]
    ResultFormatError,
}

impl DecodeError {
    /// Returns true for failures of the `data`/`result` envelope.
    #[must_use]
    pub const fn is_malformed_envelope(&self) -> bool {
        matches!(
            self,
            Self::DataFieldMalformed | Self::ResultFieldMissing | Self::ResultFieldMalformed
        )
    }
}

/// Errors returned by typed field accessors on a single result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The field is not present in the label set.
    #[error("'{0}' field does not exist in data result vector")]
    FieldMissing(String),

    /// The field is present but is not a string.
    #[error("'{0}' field is improperly formatted")]
    FieldWrongType(String),
}
