//! Utility functions and helpers.
//!
//! Common functionality used across multiple Monstera crates.

pub mod case;
pub mod token;

// Re-export commonly used utilities
pub use case::{camel_to_snake, keys_to_camel, keys_to_snake, snake_to_camel};
pub use token::{is_jwt_shaped, SessionCookies};
