use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::MediaError;

use super::MediaToolkit;

/// Joins segments, in the order given, into one file without re-encoding
#[derive(Debug, Clone)]
pub struct Assembler {
    media: Arc<dyn MediaToolkit>,
}

impl Assembler {
    pub fn new(media: Arc<dyn MediaToolkit>) -> Self {
        Self { media }
    }

    /// Concat demuxer manifest: one `file '<path>'` entry per segment
    pub fn manifest(segments: &[PathBuf]) -> String {
        segments
            .iter()
            .map(|segment| format!("file '{}'\n", Self::quote(segment)))
            .collect()
    }

    // Inside single quotes a quote is written as '\''
    fn quote(path: &Path) -> String {
        path.display().to_string().replace('\'', r"'\''")
    }

    /// Write the manifest to `manifest_path`, join into `output`, and remove the manifest
    pub async fn concatenate(&self, segments: &[PathBuf], output: &Path, manifest_path: &Path) -> Result<(), MediaError> {
        if segments.is_empty() {
            return Err(MediaError::NoSegments);
        }

        tokio::fs::write(manifest_path, Self::manifest(segments)).await?;
        debug!("Concatenating {} segments into {}", segments.len(), output.display());

        let result = self.media.concat(manifest_path, output).await;

        if let Err(e) = tokio::fs::remove_file(manifest_path).await {
            warn!("Failed to remove {}: {}", manifest_path.display(), e);
        }

        result
    }
}
