//! Core data types for Monstera client resolution.
//!
//! This module provides the fundamental types used throughout the workspace:
//! - Preset and environment identifiers
//! - API version segments
//! - The normalized failure taxonomy

pub mod environment;
pub mod failure;
pub mod preset;
pub mod version;

// Re-export all public types
pub use environment::Environment;
pub use failure::{extract_message, ApiFailure, ErrorBody, ErrorKind, ErrorSeverity, StandardErrorResponse};
pub use preset::Preset;
pub use version::ApiVersion;
