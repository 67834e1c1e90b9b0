//! Common utilities and types for Triton Packager
//!
//! This crate provides shared functionality used across the Triton Packager
//! system, including error types, model hint enums, and utility functions.

pub mod error;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use error::{Error, Result};
pub use models::*;
