//! Main integration module for Triton Packager
//!
//! This module composes the repository builder and archiver into the
//! two-step packaging pipeline an external orchestrator schedules: model
//! identifier in, populated model repository and compressed archive out.

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::Result;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use model_packager::archiver::archive_repository;
use model_packager::command::{CommandRunner, ExportOutcome, SystemCommandRunner};
use model_packager::config::PackagerConfig;
use model_packager::pipeline::{HuggingFaceLoader, PipelineLoader};
use model_packager::repository::{ModelRepository, RepositoryBuilder};

pub use model_packager::MODEL_ARCHIVE_NAME;

/// Cache version declared for the repository build step
///
/// An orchestrator caching step outputs keys on (step, cache version,
/// inputs); bump this when the repository layout or export contract changes.
pub const BUILD_CACHE_VERSION: &str = "2.8";

/// Cache version declared for the archive step
pub const ARCHIVE_CACHE_VERSION: &str = "2";

/// Two-step packaging pipeline for diffusion models
pub struct Packager {
    builder: RepositoryBuilder,
    output_dir: PathBuf,
}

impl Packager {
    /// Creates a packager with the production collaborators: a real process
    /// runner and a Hugging Face Hub pipeline loader
    pub fn new(config: PackagerConfig, output_dir: PathBuf) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner);
        let loader: Arc<dyn PipelineLoader> =
            Arc::new(HuggingFaceLoader::new(std::env::var("HF_TOKEN").ok()));

        Self::with_collaborators(config, runner, loader, output_dir)
    }

    /// Creates a packager with injected collaborators
    pub fn with_collaborators(
        config: PackagerConfig,
        runner: Arc<dyn CommandRunner>,
        loader: Arc<dyn PipelineLoader>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            builder: RepositoryBuilder::new(config, runner, loader),
            output_dir,
        }
    }

    /// Builds the model repository for `model_id`
    pub async fn build(&self, model_id: &str) -> Result<ModelRepository> {
        Ok(self.builder.build_repository(model_id).await?)
    }

    /// Builds the model repository and archives it, returning the repository
    /// handle and the archive path
    pub async fn package(&self, model_id: &str) -> Result<(ModelRepository, PathBuf)> {
        let repo = self.builder.build_repository(model_id).await?;

        if let ExportOutcome::Failed { exit_code, .. } = repo.export_outcome() {
            warn!(
                "Packaging {} despite failed export (status {:?}); compiled artifacts may be absent",
                model_id, exit_code
            );
        }

        let archive = archive_repository(repo.root(), &self.output_dir).await?;

        Ok((repo, archive))
    }
}

/// Initializes logging
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
