/*!
 * Media toolchain integration.
 *
 * - `ffmpeg`: `MediaToolkit` backed by the ffmpeg/ffprobe executables
 * - `clip`: turns one audio file and one image into a muxed segment
 * - `assembler`: joins segments, in order, into the final video
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;

use crate::app_config::VideoConfig;
use crate::errors::MediaError;

/// Fixed parameters of every rendered image track
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    /// Letterbox fill colour
    pub background: String,
    pub pixel_format: String,
    pub video_codec: String,
}

impl From<&VideoConfig> for RenderSettings {
    fn from(config: &VideoConfig) -> Self {
        Self {
            fps: config.fps,
            width: config.width,
            height: config.height,
            background: config.background.clone(),
            pixel_format: config.pixel_format.clone(),
            video_codec: config.video_codec.clone(),
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::from(&VideoConfig::default())
    }
}

/// The encode/decode/mux capabilities the pipeline relies on
#[async_trait]
pub trait MediaToolkit: Send + Sync + Debug {
    /// Duration of a media file in seconds, as reported by its container
    async fn probe_duration(&self, media: &Path) -> Result<f64, MediaError>;

    /// Render `image` as a fixed-frame-rate video track lasting `duration_secs`
    async fn render_image_track(
        &self,
        image: &Path,
        duration_secs: f64,
        settings: &RenderSettings,
        output: &Path,
    ) -> Result<(), MediaError>;

    /// Combine one video and one audio track; the result lasts as long as the shorter one
    async fn mux(&self, video: &Path, audio: &Path, audio_bitrate: &str, output: &Path) -> Result<(), MediaError>;

    /// Stream-copy join of the files listed in a concat manifest
    async fn concat(&self, manifest: &Path, output: &Path) -> Result<(), MediaError>;
}

pub mod assembler;
pub mod clip;
pub mod ffmpeg;

pub use assembler::Assembler;
pub use clip::{ClipBuilder, MIN_DURATION_SECS, SegmentInfo};
pub use ffmpeg::Ffmpeg;
