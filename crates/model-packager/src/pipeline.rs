//! Pipeline loading
//!
//! This module models the external pipeline-loading routine as a mockable
//! collaborator. The production implementation snapshots a diffusion pipeline
//! from the Hugging Face Hub into a local staging directory, preferring
//! reduced-precision weight variants when asked for them.

use async_trait::async_trait;
use hf_hub::api::tokio::{Api, ApiBuilder};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use common::error::{Error, Result};
use common::models::{Device, Precision};

/// Hints forwarded to the loading routine
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Numeric precision the pipeline weights are loaded with
    pub precision: Precision,
    /// Device the pipeline is placed on at serving time
    pub device: Device,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            precision: Precision::FP16,
            device: Device::CUDA(0),
        }
    }
}

/// Loads a full diffusion pipeline and persists it to a directory
#[async_trait]
pub trait PipelineLoader: Send + Sync {
    /// Resolves `model_id`, loads the pipeline with the given hints, and
    /// saves it under `dest`
    async fn load_and_save(&self, model_id: &str, options: &LoadOptions, dest: &Path)
        -> Result<()>;
}

/// Loader that snapshots a pipeline from the Hugging Face Hub
pub struct HuggingFaceLoader {
    api_token: Option<String>,
}

impl HuggingFaceLoader {
    /// Creates a new Hub-backed loader
    pub fn new(api_token: Option<String>) -> Self {
        Self { api_token }
    }

    /// Creates the Hub API client
    fn create_api(&self) -> Result<Api> {
        let mut builder = ApiBuilder::new();

        if let Some(token) = &self.api_token {
            builder = builder.with_token(Some(token.clone()));
        }

        builder
            .build()
            .map_err(|e| Error::ModelLoad(format!("Failed to create hub client: {}", e)))
    }
}

#[async_trait]
impl PipelineLoader for HuggingFaceLoader {
    async fn load_and_save(
        &self,
        model_id: &str,
        options: &LoadOptions,
        dest: &Path,
    ) -> Result<()> {
        info!(
            "Loading pipeline {} ({}, {})",
            model_id, options.precision, options.device
        );

        let api = self.create_api()?;
        let repo = api.model(model_id.to_string());

        let repo_info = repo
            .info()
            .await
            .map_err(|e| Error::ModelLoad(format!("Cannot resolve {}: {}", model_id, e)))?;

        let names: HashSet<&str> = repo_info
            .siblings
            .iter()
            .map(|sibling| sibling.rfilename.as_str())
            .collect();

        let mut saved = 0usize;

        for sibling in &repo_info.siblings {
            let name = &sibling.rfilename;

            if !should_fetch(name, options.precision, &names) {
                debug!("Skipping {} in favor of its fp16 variant", name);
                continue;
            }

            let fetched = repo.download(name).await.map_err(|e| {
                Error::ModelLoad(format!("Failed to fetch {} from {}: {}", name, model_id, e))
            })?;

            let target = dest.join(name);
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::copy(&fetched, &target).await?;
            saved += 1;
        }

        if saved == 0 {
            return Err(Error::ModelLoad(format!(
                "Pipeline {} contains no files",
                model_id
            )));
        }

        info!("Saved pipeline {} ({} files) to {}", model_id, saved, dest.display());

        Ok(())
    }
}

/// Returns true if `name` should be fetched under the given precision hint
///
/// When fp16 is requested and a weight file has an fp16 variant in the same
/// repository, the full-precision copy is skipped.
fn should_fetch(name: &str, precision: Precision, names: &HashSet<&str>) -> bool {
    if precision != Precision::FP16 || !is_weight_file(name) || name.contains(".fp16.") {
        return true;
    }

    match fp16_variant(name) {
        Some(variant) => !names.contains(variant.as_str()),
        None => true,
    }
}

fn is_weight_file(name: &str) -> bool {
    name.ends_with(".safetensors") || name.ends_with(".bin") || name.ends_with(".ckpt")
}

/// Builds the fp16 variant file name, e.g.
/// `unet/diffusion_pytorch_model.safetensors` becomes
/// `unet/diffusion_pytorch_model.fp16.safetensors`
fn fp16_variant(name: &str) -> Option<String> {
    let (stem, extension) = name.rsplit_once('.')?;
    Some(format!("{}.fp16.{}", stem, extension))
}
