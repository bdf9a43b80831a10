//! Scoped temporary workspace for one pipeline run.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of every workspace directory created in the system temp folder
pub const WORKSPACE_PREFIX: &str = "storyreel_";

/// Temporary directory exclusively owned by one run
///
/// Intermediate audio, image tracks, segments and the concat manifest live here.
/// The directory is removed when the workspace is closed or dropped, so every
/// exit path (including a mid-run abort) tears it down.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace in the system temp folder
    pub fn create() -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(WORKSPACE_PREFIX).tempdir()?;
        Ok(Self { dir })
    }

    /// Create a fresh workspace under `parent`
    pub fn create_in<P: AsRef<Path>>(parent: P) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(WORKSPACE_PREFIX).tempdir_in(parent)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Synthesized audio for the unit at `index` (0-based)
    pub fn audio_path(&self, index: usize) -> PathBuf {
        self.path().join(format!("{:03}.mp3", index + 1))
    }

    /// Still-image video track for the unit at `index`
    pub fn image_track_path(&self, index: usize) -> PathBuf {
        self.path().join(format!("{:03}_img.mp4", index + 1))
    }

    /// Muxed segment for the unit at `index`
    pub fn segment_path(&self, index: usize) -> PathBuf {
        self.path().join(format!("{:03}_seg.mp4", index + 1))
    }

    /// Manifest driving the final concatenation
    pub fn manifest_path(&self) -> PathBuf {
        self.path().join("concat_list.txt")
    }

    /// Remove the workspace now, reporting any failure
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}
