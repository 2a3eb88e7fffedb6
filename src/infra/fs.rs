//! Filesystem infrastructure — implements `ArtifactStore` over local files.

use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::ArtifactStore;
use crate::domain::{ArtifactMeta, ArtifactProbe};

/// Production filesystem implementation of `ArtifactStore`.
pub struct LocalArtifacts;

impl ArtifactStore for LocalArtifacts {
    async fn stat(&self, path: &Path) -> Result<ArtifactProbe> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => Ok(ArtifactProbe::File(ArtifactMeta { size: meta.len() })),
            Ok(_) => Ok(ArtifactProbe::NotAFile),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(ArtifactProbe::Missing),
            Err(err) => {
                Err(err).with_context(|| format!("probing artifact {}", path.display()))
            }
        }
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .with_context(|| format!("reading artifact {}", path.display()))
    }
}
