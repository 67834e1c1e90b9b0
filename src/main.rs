use std::path::PathBuf;
use anyhow::Result;
use clap::{Parser, Subcommand};
use common::models::{Device, Precision};

use model_packager::archiver::archive_repository;
use model_packager::command::ExportOutcome;
use model_packager::config::PackagerConfig;
use model_packager::repository::copy_dir_recursive;
use triton_packager::{init_logging, Packager};

#[derive(Parser)]
#[command(
    name = "triton-packager",
    about = "Packages text-to-image diffusion pipelines into a Triton-style model repository"
)]
struct Cli {
    /// Path to a JSON configuration file (defaults used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a model repository without archiving it
    Build {
        /// Model identifier, e.g. runwayml/stable-diffusion-v1-5
        model: String,

        /// Directory the populated repository is copied to
        #[arg(long, default_value = "model_repository")]
        output: PathBuf,

        /// Precision the pipeline is loaded with (fp32, fp16, bf16)
        #[arg(long)]
        precision: Option<Precision>,

        /// Device placement hint (cpu, cuda, cuda:N)
        #[arg(long)]
        device: Option<Device>,
    },
    /// Archive an existing model repository
    Package {
        /// Repository root to archive
        repo: PathBuf,

        /// Directory the archive is written to
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
    /// Build a model repository and archive it in one run
    Run {
        /// Model identifier, e.g. runwayml/stable-diffusion-v1-5
        model: String,

        /// Directory the archive is written to
        #[arg(long, default_value = ".")]
        output: PathBuf,

        /// Precision the pipeline is loaded with (fp32, fp16, bf16)
        #[arg(long)]
        precision: Option<Precision>,

        /// Device placement hint (cpu, cuda, cuda:N)
        #[arg(long)]
        device: Option<Device>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PackagerConfig::from_file(path)?,
        None => PackagerConfig::default(),
    };

    match cli.command {
        Command::Build {
            model,
            output,
            precision,
            device,
        } => {
            if let Some(precision) = precision {
                config.precision = precision;
            }
            if let Some(device) = device {
                config.device = device;
            }

            let packager = Packager::new(config, output.clone());
            let repo = packager.build(&model).await?;

            if let ExportOutcome::Failed { exit_code, .. } = repo.export_outcome() {
                eprintln!(
                    "warning: export failed (status {:?}); compiled artifacts may be absent",
                    exit_code
                );
            }

            copy_dir_recursive(repo.root(), &output)?;
            println!("{}", output.display());
        }
        Command::Package { repo, output } => {
            let archive = archive_repository(&repo, &output).await?;
            println!("{}", archive.display());
        }
        Command::Run {
            model,
            output,
            precision,
            device,
        } => {
            if let Some(precision) = precision {
                config.precision = precision;
            }
            if let Some(device) = device {
                config.device = device;
            }

            let packager = Packager::new(config, output);
            let (repo, archive) = packager.package(&model).await?;

            if let ExportOutcome::Failed { exit_code, .. } = repo.export_outcome() {
                eprintln!(
                    "warning: export failed (status {:?}); archive may lack compiled artifacts",
                    exit_code
                );
            }

            println!("{}", archive.display());
        }
    }

    Ok(())
}
