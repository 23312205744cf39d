//! Decoding of metrics query responses.
//!
//! This module turns the deserialized JSON body of an instant or range query
//! response into typed [`QueryResults`], and provides the typed accessors used
//! by downstream extraction code.
//!
//! # Wire format
//!
//! ```json
//! {"data": {"result": [
//!     {"metric": {"pod": "api-0"}, "value": [1700000000, "0.5"]},
//!     {"metric": {"pod": "api-1"}, "values": [[1700000000, "1"], [1700000060, "2"]]}
//! ]}}
//! ```
//!
//! An error response has the shape `{"error": "..."}` and decodes to
//! [`DecodeError::UpstreamError`].
//!
//! # Example
//!
//! ```
//! use shared::prom::decode;
//! use serde_json::json;
//!
//! let raw = json!({"data": {"result": [
//!     {"metric": {"pod": "api-0", "label_app": "api"}, "value": [1_700_000_000, "NaN"]}
//! ]}});
//!
//! let results = decode("kube_pod_labels", &raw).unwrap();
//! let first = &results.results[0];
//! assert_eq!(first.get_string("pod").unwrap(), "api-0");
//! assert_eq!(first.get_labels().get("app").map(String::as_str), Some("api"));
//! assert_eq!(first.values[0].value, 0.0);
//! ```

mod decoder;
mod error;
mod handoff;
mod parser;
mod result;
mod warning;

pub use decoder::{decode, Decoder};
pub use error::{DecodeError, FieldError};
pub use handoff::{handoff, HandoffError, PendingResults, ResultsPublisher};
pub use parser::DataPointParser;
pub use result::{QueryResult, QueryResults, LABEL_PREFIX};
pub use warning::Warning;
