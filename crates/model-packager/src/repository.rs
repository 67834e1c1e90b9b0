//! Model repository assembly
//!
//! This module builds the fixed-layout directory tree an inference server
//! expects for a diffusion pipeline: a compiled VAE plan, an ONNX text
//! encoder, their descriptor files, and the full pipeline with fused weights.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use common::error::{Error, Result};

use crate::command::{CommandRunner, ExportOutcome};
use crate::config::PackagerConfig;
use crate::pipeline::{LoadOptions, PipelineLoader};

/// Descriptor file name expected by the serving runtime
pub const DESCRIPTOR_FILE: &str = "config.pbtxt";
/// Compiled VAE artifact name
pub const VAE_PLAN_FILE: &str = "model.plan";
/// Text encoder interchange artifact name
pub const ENCODER_ONNX_FILE: &str = "model.onnx";
/// Subdirectory of `pipeline/` holding the saved fused-weights pipeline
pub const FUSED_PIPELINE_DIR: &str = "fused-lora";

/// Handle to a populated model repository
///
/// Dropping the handle removes the underlying scratch directory unless
/// [`ModelRepository::keep`] detached it first.
#[derive(Debug)]
pub struct ModelRepository {
    root: PathBuf,
    model_id: String,
    export: ExportOutcome,
    workdir: Option<TempDir>,
}

impl ModelRepository {
    /// Returns the repository root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the identifier of the packaged model
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Returns the outcome of the export step
    ///
    /// A failed export still yields a repository; the compiled `model.plan`
    /// and `model.onnx` artifacts may be absent in that case.
    pub fn export_outcome(&self) -> &ExportOutcome {
        &self.export
    }

    /// Detaches the scratch directory so it survives this handle, returning
    /// the repository root
    pub fn keep(mut self) -> PathBuf {
        match self.workdir.take() {
            Some(dir) => dir.keep(),
            None => self.root.clone(),
        }
    }
}

/// Assembles inference-server model repositories for diffusion pipelines
pub struct RepositoryBuilder {
    config: PackagerConfig,
    runner: Arc<dyn CommandRunner>,
    loader: Arc<dyn PipelineLoader>,
}

impl RepositoryBuilder {
    /// Creates a new repository builder
    pub fn new(
        config: PackagerConfig,
        runner: Arc<dyn CommandRunner>,
        loader: Arc<dyn PipelineLoader>,
    ) -> Self {
        Self {
            config,
            runner,
            loader,
        }
    }

    /// Builds a model repository for `model_id`
    ///
    /// The repository is assembled in a fresh working directory scoped to
    /// this invocation. Export-command failure is recorded on the returned
    /// handle rather than raised; missing templates and loader failures
    /// abort.
    pub async fn build_repository(&self, model_id: &str) -> Result<ModelRepository> {
        info!("Building model repository for {}", model_id);

        let workdir = match &self.config.work_dir {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                tempfile::tempdir_in(root)?
            }
            None => tempfile::tempdir()?,
        };
        let root = workdir.path().to_path_buf();

        let vae_dir = root.join("vae");
        let encoder_dir = root.join("text_encoder");
        let pipeline_dir = root.join("pipeline");
        let vae_version_dir = vae_dir.join("1");
        let encoder_version_dir = encoder_dir.join("1");

        // Version directories must exist before the export command writes
        // into them
        std::fs::create_dir_all(&vae_version_dir)?;
        std::fs::create_dir_all(&encoder_version_dir)?;
        std::fs::create_dir_all(&pipeline_dir)?;

        let vae_plan = vae_version_dir.join(VAE_PLAN_FILE);
        let encoder_onnx = encoder_version_dir.join(ENCODER_ONNX_FILE);

        let export = self.run_export(&vae_plan, &encoder_onnx, model_id).await;

        copy_template(
            &self.config.vae_config_template,
            &vae_dir.join(DESCRIPTOR_FILE),
        )?;
        copy_template(
            &self.config.encoder_config_template,
            &encoder_dir.join(DESCRIPTOR_FILE),
        )?;

        // Stage the saved pipeline inside this invocation's scratch space,
        // then merge it into the repository
        let staging = tempfile::Builder::new()
            .prefix(".pipeline-staging")
            .tempdir_in(&root)?;
        let load_options = LoadOptions {
            precision: self.config.precision,
            device: self.config.device,
        };
        self.loader
            .load_and_save(model_id, &load_options, staging.path())
            .await?;

        copy_dir_recursive(staging.path(), &pipeline_dir.join(FUSED_PIPELINE_DIR))?;
        staging.close()?;

        let template_dir = &self.config.pipeline_template_dir;
        if !template_dir.is_dir() {
            return Err(Error::MissingTemplate(template_dir.clone()));
        }
        copy_dir_recursive(template_dir, &pipeline_dir)?;

        info!(
            "Model repository for {} assembled at {}",
            model_id,
            root.display()
        );

        Ok(ModelRepository {
            root,
            model_id: model_id.to_string(),
            export,
            workdir: Some(workdir),
        })
    }

    /// Runs the export command with its three positional arguments
    ///
    /// Failure is logged and surfaced on the outcome, never raised; assembly
    /// continues with whatever artifacts the command managed to produce.
    async fn run_export(
        &self,
        vae_plan: &Path,
        encoder_onnx: &Path,
        model_id: &str,
    ) -> ExportOutcome {
        let args = vec![
            vae_plan.display().to_string(),
            encoder_onnx.display().to_string(),
            model_id.to_string(),
        ];

        match self
            .runner
            .run(&self.config.export_script, &args, self.config.export_timeout())
            .await
        {
            Ok(output) if output.success() => {
                debug!("Export succeeded: {}", output.stdout);
                ExportOutcome::Succeeded
            }
            Ok(output) => {
                warn!(
                    "Export command failed with status {:?}: {}",
                    output.exit_code, output.stderr
                );
                ExportOutcome::Failed {
                    exit_code: output.exit_code,
                    stderr: output.stderr,
                }
            }
            Err(e) => {
                warn!("Export command could not be run: {}", e);
                ExportOutcome::Failed {
                    exit_code: None,
                    stderr: e.to_string(),
                }
            }
        }
    }
}

fn copy_template(template: &Path, dest: &Path) -> Result<()> {
    if !template.is_file() {
        return Err(Error::MissingTemplate(template.to_path_buf()));
    }
    std::fs::copy(template, dest)?;
    Ok(())
}

/// Copies `src` into `dst` recursively, merging with existing contents and
/// overwriting files on conflict
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)?;

    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}
