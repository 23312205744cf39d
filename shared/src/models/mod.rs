//! Data models for decoded query results.
//!
//! This module contains the leaf data structures shared by the decoder and
//! the extraction helpers.

pub mod vector;

pub use vector::Vector;
