//! Scoped temporary storage for generated assets.
//!
//! # Design
//! - [`StagedFile`] owns its path; dropping it without [`AssetStager::release`] still removes the file.
//! - A failed write removes the partial file before the error is returned.
//! - Names are derived from a UUID so concurrent workflows never collide.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StagingError;
use crate::model::GeneratedAsset;

/// Writes assets into a staging directory.
#[derive(Debug, Clone)]
pub struct AssetStager {
    dir: PathBuf,
}

impl AssetStager {
    /// Stage into `dir`, creating it on first use.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Persist `asset` under a name derived from `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError`] when the directory cannot be created or the
    /// file cannot be written. No file is left behind on error.
    pub async fn stage(&self, asset: &GeneratedAsset, id: Uuid) -> Result<StagedFile, StagingError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StagingError {
                operation: "create directory for",
                path: self.dir.clone(),
                source,
            })?;

        let path = self
            .dir
            .join(format!("video_{id}.{}", asset.media_type.extension()));
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|source| StagingError {
                operation: "create",
                path: path.clone(),
                source,
            })?;
        let guard = StagedFile::new(path);

        let write = async {
            file.write_all(&asset.bytes).await?;
            file.flush().await?;
            file.sync_all().await
        };
        if let Err(source) = write.await {
            return Err(StagingError {
                operation: "write",
                path: guard.path().to_path_buf(),
                source,
            });
        }
        drop(file);

        debug!(path = %guard.path().display(), bytes = asset.bytes.len(), "asset staged");
        Ok(guard)
    }

    /// Remove a staged file. A file that is already gone counts as released.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError`] when the file exists but cannot be removed.
    pub async fn release(&self, mut file: StagedFile) -> Result<(), StagingError> {
        file.released = true;
        match tokio::fs::remove_file(&file.path).await {
            Ok(()) => {
                debug!(path = %file.path.display(), "staged file released");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StagingError {
                operation: "remove",
                path: file.path.clone(),
                source,
            }),
        }
    }
}

/// A staged asset on disk, removed when released or dropped.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    released: bool,
}

impl StagedFile {
    const fn new(path: PathBuf) -> Self {
        Self {
            path,
            released: false,
        }
    }

    /// Location of the staged file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "staged file removed on drop"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(
                path = %self.path.display(),
                error = %err,
                "failed to remove staged file on drop"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MediaType;
    use tempfile::TempDir;

    fn asset(bytes: &[u8]) -> GeneratedAsset {
        GeneratedAsset {
            bytes: bytes.to_vec(),
            media_type: MediaType::Mp4,
        }
    }

    #[tokio::test]
    async fn stage_writes_bytes_under_unique_name() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let stager = AssetStager::new(temp.path().join("staging"));
        let id = Uuid::new_v4();

        let staged = stager.stage(&asset(b"clip"), id).await?;
        assert_eq!(
            staged.path().file_name().and_then(|name| name.to_str()),
            Some(format!("video_{id}.mp4").as_str())
        );
        assert_eq!(tokio::fs::read(staged.path()).await?, b"clip");

        let path = staged.path().to_path_buf();
        stager.release(staged).await?;
        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn dropping_unreleased_file_removes_it() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let stager = AssetStager::new(temp.path());
        let staged = stager.stage(&asset(b"clip"), Uuid::new_v4()).await?;
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn release_of_missing_file_succeeds() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let stager = AssetStager::new(temp.path());
        let staged = stager.stage(&asset(b"clip"), Uuid::new_v4()).await?;
        std::fs::remove_file(staged.path())?;
        stager.release(staged).await?;
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected_without_touching_existing_file() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let stager = AssetStager::new(temp.path());
        let id = Uuid::new_v4();
        let first = stager.stage(&asset(b"first"), id).await?;

        let Err(error) = stager.stage(&asset(b"second"), id).await else {
            panic!("expected collision error");
        };
        assert_eq!(error.operation, "create");
        assert_eq!(tokio::fs::read(first.path()).await?, b"first");
        Ok(())
    }

    #[tokio::test]
    async fn unwritable_directory_is_a_staging_error() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, b"x")?;
        let stager = AssetStager::new(blocker.join("nested"));

        let Err(error) = stager.stage(&asset(b"clip"), Uuid::new_v4()).await else {
            panic!("expected staging error");
        };
        assert_eq!(error.operation, "create directory for");
        Ok(())
    }
}
