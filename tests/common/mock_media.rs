/*!
 * Fake media toolkit for testing
 *
 * Works on the text files written by `MockEngine` instead of real media:
 * - probe: fixed duration, or 0.4s per spoken word
 * - render: writes `<image name>|<duration>`
 * - mux: writes `<text>|<image name>|<voice>`
 * - concat: joins the listed files line by line, in manifest order
 */

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use storyreel::errors::MediaError;
use storyreel::media::{MediaToolkit, RenderSettings};

/// In-memory stand-in for ffmpeg/ffprobe
#[derive(Debug, Default)]
pub struct FakeMedia {
    /// Duration every probe reports, if set
    fixed_duration: Option<f64>,
    /// Images whose render fails
    failing_images: Vec<String>,
    /// `(image, duration)` of every render, in call order
    renders: Mutex<Vec<(PathBuf, f64)>>,
    /// Number of concat calls
    concats: Mutex<usize>,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `seconds` for every probe
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.fixed_duration = Some(seconds);
        self
    }

    /// Fail rendering of the image with this file name
    pub fn failing_image(mut self, name: impl Into<String>) -> Self {
        self.failing_images.push(name.into());
        self
    }

    pub fn renders(&self) -> Vec<(PathBuf, f64)> {
        self.renders.lock().unwrap().clone()
    }

    pub fn concat_count(&self) -> usize {
        *self.concats.lock().unwrap()
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    fn tool_failure(message: &str) -> MediaError {
        MediaError::ToolFailed {
            tool: "ffmpeg".to_string(),
            status: "exit status: 1".to_string(),
            stderr: message.to_string(),
        }
    }

    /// Paths listed in a concat manifest, with quote escapes undone
    fn manifest_entries(manifest: &str) -> Vec<PathBuf> {
        manifest
            .lines()
            .filter_map(|line| line.strip_prefix("file '")?.strip_suffix('\''))
            .map(|path| PathBuf::from(path.replace(r"'\''", "'")))
            .collect()
    }
}

#[async_trait]
impl MediaToolkit for FakeMedia {
    async fn probe_duration(&self, media: &Path) -> Result<f64, MediaError> {
        let content = tokio::fs::read_to_string(media).await?;
        if let Some(seconds) = self.fixed_duration {
            return Ok(seconds);
        }
        let text = content.lines().nth(1).unwrap_or_default();
        Ok(text.split_whitespace().count() as f64 * 0.4)
    }

    async fn render_image_track(
        &self,
        image: &Path,
        duration_secs: f64,
        _settings: &RenderSettings,
        output: &Path,
    ) -> Result<(), MediaError> {
        let name = Self::file_name(image);
        self.renders.lock().unwrap().push((image.to_path_buf(), duration_secs));

        if self.failing_images.contains(&name) {
            return Err(Self::tool_failure("Invalid PNG signature"));
        }

        tokio::fs::write(output, format!("{}|{:.3}", name, duration_secs)).await?;
        Ok(())
    }

    async fn mux(&self, video: &Path, audio: &Path, _audio_bitrate: &str, output: &Path) -> Result<(), MediaError> {
        let track = tokio::fs::read_to_string(video).await?;
        let speech = tokio::fs::read_to_string(audio).await?;

        let image = track.split('|').next().unwrap_or_default();
        let mut speech_lines = speech.lines();
        let voice = speech_lines.next().unwrap_or_default();
        let text = speech_lines.next().unwrap_or_default();

        tokio::fs::write(output, format!("{}|{}|{}", text, image, voice)).await?;
        Ok(())
    }

    async fn concat(&self, manifest: &Path, output: &Path) -> Result<(), MediaError> {
        *self.concats.lock().unwrap() += 1;

        let listing = tokio::fs::read_to_string(manifest).await?;
        let mut joined = String::new();
        for segment in Self::manifest_entries(&listing) {
            joined.push_str(tokio::fs::read_to_string(&segment).await?.trim_end());
            joined.push('\n');
        }

        tokio::fs::write(output, joined).await?;
        Ok(())
    }
}
