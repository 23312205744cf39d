//! Promresult Shared Library
//!
//! This crate decodes the JSON responses of Prometheus-style metrics queries
//! into typed result sets and provides the accessors used to build keyed
//! usage maps from them.
//!
//! # Modules
//!
//! - [`models`] - Leaf data types (samples)
//! - [`prom`] - Response decoding, typed result access and result handoff
//! - [`config`] - Decoder configuration
//! - [`extract`] - Keyed extraction helpers over decoded results
//!
//! # Example
//!
//! ```
//! use shared::prom::decode;
//! use serde_json::json;
//!
//! let raw = json!({"data": {"result": [
//!     {"metric": {"instance": "node-a"}, "values": [[1_700_000_001, "0.04"], [1_700_000_059, "+Inf"]]}
//! ]}});
//!
//! let results = decode("node_total_hourly_cost", &raw).unwrap();
//! let series = &results.results[0];
//!
//! assert_eq!(series.get_string("instance").unwrap(), "node-a");
//! assert_eq!(series.values[1].timestamp, 1_700_000_060.0);
//! assert_eq!(series.values[1].value, 0.0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod extract;
pub mod models;
pub mod prom;

#[cfg(test)]
mod test_support;

/// Re-export common dependencies for convenience.
pub use serde;
pub use serde_json;
