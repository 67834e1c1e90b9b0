//! Model repository assembly and packaging for Triton Packager
//!
//! This crate prepares a text-to-image diffusion pipeline for serving: it
//! assembles an inference-server model repository (compiled VAE plan, ONNX
//! text encoder, full pipeline with fused weights) and compresses it into a
//! distributable archive.

pub mod archiver;
pub mod command;
pub mod config;
pub mod pipeline;
pub mod repository;

// Re-export commonly used types
pub use archiver::{archive_repository, extract_archive, MODEL_ARCHIVE_NAME};
pub use command::{CommandOutput, CommandRunner, ExportOutcome, SystemCommandRunner};
pub use config::PackagerConfig;
pub use pipeline::{HuggingFaceLoader, LoadOptions, PipelineLoader};
pub use repository::{ModelRepository, RepositoryBuilder};
