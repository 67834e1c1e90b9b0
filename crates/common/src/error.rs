//! Error types for the common crate
//!
//! This module defines the common error types used throughout the Triton Packager system.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Triton Packager operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for Triton Packager operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A fixed template file or directory is absent
    #[error("Missing template: {0}")]
    MissingTemplate(PathBuf),

    /// The external loading routine could not resolve or load a model
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Archive creation or extraction error
    #[error("Archive error: {0}")]
    Archive(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if the error is a missing template error
    pub fn is_missing_template(&self) -> bool {
        matches!(self, Error::MissingTemplate(_))
    }

    /// Returns true if the error is a model load error
    pub fn is_model_load(&self) -> bool {
        matches!(self, Error::ModelLoad(_))
    }

    /// Returns true if the error is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// Returns true if the error is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}
