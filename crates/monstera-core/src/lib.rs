//! # monstera-core
//!
//! Core types and utilities shared across all Monstera crates.
//!
//! This crate provides:
//! - `Preset`, `Environment` and `ApiVersion`, the closed identifiers used to
//!   resolve HTTP client configurations
//! - `ErrorKind` and `ApiFailure`, the normalized failure taxonomy
//! - `MonsteraError` enum for unified error handling
//! - Utility functions for key case conversion and session token checks
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Preset, Environment, ApiFailure, etc.)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{MonsteraError, MonsteraResult};
pub use types::{
    ApiFailure, ApiVersion, Environment, ErrorKind, ErrorSeverity, Preset, StandardErrorResponse,
};
