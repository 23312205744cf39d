//! Configuration module.
//!
//! This module contains configuration structures for response decoding.

pub mod decode;

pub use decode::{ConfigError, DecodeConfig, DEFAULT_TIMESTAMP_RESOLUTION};
