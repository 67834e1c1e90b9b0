//! Packager configuration
//!
//! This module defines the filesystem locations and limits the packaging
//! pipeline depends on. The defaults preserve the locations the compilation
//! container ships with; deployments with a different layout inject their own
//! values instead of patching path literals.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use common::error::Result;
use common::models::{Device, Precision};

use crate::pipeline::LoadOptions;

/// Configuration for the packaging pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagerConfig {
    /// External command producing the compiled VAE plan and the text encoder
    /// ONNX graph
    pub export_script: PathBuf,

    /// Template descriptor for the VAE component
    pub vae_config_template: PathBuf,

    /// Template descriptor for the text encoder component
    pub encoder_config_template: PathBuf,

    /// Template pipeline-definition directory merged into `pipeline/`
    pub pipeline_template_dir: PathBuf,

    /// Root under which per-invocation working directories are created
    /// (system temp when unset)
    pub work_dir: Option<PathBuf>,

    /// Maximum time in seconds the export command may run (unset = wait
    /// indefinitely, the historical behavior)
    pub export_timeout_secs: Option<u64>,

    /// Numeric precision the pipeline is loaded with
    pub precision: Precision,

    /// Device placement hint forwarded to the loading routine
    pub device: Device,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        let hints = LoadOptions::default();

        Self {
            export_script: PathBuf::from("/root/export.sh"),
            vae_config_template: PathBuf::from("/root/vae_config.pbtxt"),
            encoder_config_template: PathBuf::from("/root/text_encoder_config.pbtxt"),
            pipeline_template_dir: PathBuf::from("/root/pipeline"),
            work_dir: None,
            export_timeout_secs: None,
            precision: hints.precision,
            device: hints.device,
        }
    }
}

impl PackagerConfig {
    /// Loads a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Returns the export timeout as a duration
    pub fn export_timeout(&self) -> Option<Duration> {
        self.export_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_preserve_container_layout() {
        let config = PackagerConfig::default();
        assert_eq!(config.export_script, PathBuf::from("/root/export.sh"));
        assert_eq!(config.vae_config_template, PathBuf::from("/root/vae_config.pbtxt"));
        assert_eq!(
            config.encoder_config_template,
            PathBuf::from("/root/text_encoder_config.pbtxt")
        );
        assert_eq!(config.pipeline_template_dir, PathBuf::from("/root/pipeline"));
        assert!(config.work_dir.is_none());
        assert!(config.export_timeout().is_none());
        assert_eq!(config.precision, Precision::FP16);
        assert_eq!(config.device, Device::CUDA(0));
    }

    #[test]
    fn test_from_file_with_partial_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packager.json");
        std::fs::write(
            &path,
            r#"{"export_script": "/opt/export.sh", "export_timeout_secs": 600}"#,
        )
        .unwrap();

        let config = PackagerConfig::from_file(&path).unwrap();
        assert_eq!(config.export_script, PathBuf::from("/opt/export.sh"));
        assert_eq!(config.export_timeout(), Some(Duration::from_secs(600)));
        // Untouched fields keep their defaults
        assert_eq!(config.pipeline_template_dir, PathBuf::from("/root/pipeline"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = PackagerConfig::from_file(Path::new("/nonexistent/packager.json")).unwrap_err();
        assert!(err.is_io());
    }
}
