use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::VideoConfig;
use crate::errors::MediaError;

use super::{MediaToolkit, RenderSettings};

/// Shortest duration a clip may have, in seconds
pub const MIN_DURATION_SECS: f64 = 0.1;

/// A finished segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentInfo {
    pub path: PathBuf,
    /// Measured (floored) audio duration
    pub audio_secs: f64,
    /// Length the image track was rendered at
    pub video_secs: f64,
}

/// Builds one segment from an audio file and an image
#[derive(Debug, Clone)]
pub struct ClipBuilder {
    media: Arc<dyn MediaToolkit>,
    settings: RenderSettings,
    pad_secs: f64,
    audio_bitrate: String,
}

impl ClipBuilder {
    pub fn new(media: Arc<dyn MediaToolkit>, video: &VideoConfig) -> Self {
        Self {
            media,
            settings: RenderSettings::from(video),
            pad_secs: video.pad_secs,
            audio_bitrate: video.audio_bitrate.clone(),
        }
    }

    /// Probe the audio length, never below `MIN_DURATION_SECS`
    pub async fn measure_duration(&self, audio: &Path) -> Result<f64, MediaError> {
        let probed = self.media.probe_duration(audio).await?;
        Ok(probed.max(MIN_DURATION_SECS))
    }

    /// Render the image for the measured duration plus padding, then mux it with the audio
    ///
    /// The padding makes the image track outlast the audio so `-shortest`
    /// never cuts speech. `video_track` is an intermediate file.
    pub async fn build_segment(
        &self,
        audio: &Path,
        image: &Path,
        video_track: &Path,
        output: &Path,
    ) -> Result<SegmentInfo, MediaError> {
        let audio_secs = self.measure_duration(audio).await?;
        let video_secs = audio_secs + self.pad_secs;
        debug!("Audio {:.3}s, rendering {} for {:.3}s", audio_secs, image.display(), video_secs);

        self.media
            .render_image_track(image, video_secs, &self.settings, video_track)
            .await?;
        self.media.mux(video_track, audio, &self.audio_bitrate, output).await?;

        Ok(SegmentInfo {
            path: output.to_path_buf(),
            audio_secs,
            video_secs,
        })
    }
}
