//! Monstera benchmarking suite
//!
//! Measures configuration resolution, client cache lookups and payload key
//! conversion.

pub mod common;

pub use common::*;
