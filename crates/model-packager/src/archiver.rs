//! Repository archiving
//!
//! This module serializes a populated model repository into a single gzip
//! compressed tar archive for distribution. The archive mirrors the
//! repository byte for byte and path for path, rooted at `.`, with no
//! filtering.

use async_compression::tokio::bufread::GzipDecoder;
use async_compression::tokio::write::GzipEncoder;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::info;

use common::error::{Error, Result};
use common::utils::format_bytes;

/// Fixed archive file name expected by downstream deployment steps
pub const MODEL_ARCHIVE_NAME: &str = "stable-diff-bls.tar.gz";

/// Archives the repository at `root` into `output_dir`, returning the path
/// of the created `stable-diff-bls.tar.gz`
pub async fn archive_repository(root: &Path, output_dir: &Path) -> Result<PathBuf> {
    if !root.is_dir() {
        return Err(Error::Archive(format!(
            "Not a readable directory: {}",
            root.display()
        )));
    }

    tokio::fs::create_dir_all(output_dir).await?;
    let archive_path = output_dir.join(MODEL_ARCHIVE_NAME);

    // tar assembly is blocking filesystem work
    let tar_file = {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<tempfile::NamedTempFile> {
            let staging = tempfile::NamedTempFile::new()?;
            let mut builder = tar::Builder::new(staging.reopen()?);
            builder.append_dir_all(".", &root)?;
            builder.finish()?;
            Ok(staging)
        })
        .await
        .map_err(|e| Error::Internal(format!("Archive task panicked: {}", e)))??
    };

    let mut reader = tokio::fs::File::open(tar_file.path()).await?;
    let output = tokio::fs::File::create(&archive_path).await?;
    let mut encoder = GzipEncoder::new(output);
    tokio::io::copy(&mut reader, &mut encoder).await?;
    encoder.shutdown().await?;

    let size = tokio::fs::metadata(&archive_path).await?.len();
    info!(
        "Archived {} as {} ({})",
        root.display(),
        archive_path.display(),
        format_bytes(size)
    );

    Ok(archive_path)
}

/// Extracts an archive produced by [`archive_repository`] into `dest`
pub async fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let input = tokio::fs::File::open(archive).await?;
    let mut decoder = GzipDecoder::new(BufReader::new(input));

    let staging = tempfile::NamedTempFile::new()?;
    let mut tar_out = tokio::fs::File::create(staging.path()).await?;
    tokio::io::copy(&mut decoder, &mut tar_out).await?;
    tar_out.flush().await?;
    drop(tar_out);

    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> {
        std::fs::create_dir_all(&dest)?;
        let mut archive = tar::Archive::new(staging.reopen()?);
        archive.unpack(&dest)?;
        Ok(())
    })
    .await
    .map_err(|e| Error::Internal(format!("Extraction task panicked: {}", e)))??;

    Ok(())
}
