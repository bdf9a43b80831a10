use async_trait::async_trait;
use log::{debug, error};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::errors::MediaError;
use crate::process::{self, CommandOutcome};

use super::{MediaToolkit, RenderSettings};

// Line prefixes of ffmpeg's banner, container metadata and stream listing
const STDERR_NOISE: &[&str] = &[
    "ffmpeg version",
    "ffprobe version",
    "built with",
    "configuration:",
    "lib",
    "Input #",
    "Output #",
    "Metadata:",
    "Duration:",
    "Stream #",
    "Stream mapping:",
    "Press [q]",
    "encoder",
    "major_brand",
    "minor_version",
    "compatible_brands",
    "handler_name",
    "vendor_id",
];

/// `MediaToolkit` driving the ffmpeg and ffprobe executables
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    /// Deadline for one tool invocation
    timeout: Duration,
}

impl Ffmpeg {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            timeout,
        }
    }

    /// Filter graph: scale down to fit, pad to the frame centered, fix the pixel format
    pub fn letterbox_filter(settings: &RenderSettings) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:{bg},format={fmt}",
            w = settings.width,
            h = settings.height,
            bg = settings.background,
            fmt = settings.pixel_format,
        )
    }

    pub fn render_args(image: &Path, duration_secs: f64, settings: &RenderSettings, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-loop".to_string(), "1".to_string(),
            "-t".to_string(), format!("{:.3}", duration_secs),
            "-i".to_string(), image.display().to_string(),
            "-r".to_string(), settings.fps.to_string(),
            "-vf".to_string(), Self::letterbox_filter(settings),
            "-c:v".to_string(), settings.video_codec.clone(),
            "-pix_fmt".to_string(), settings.pixel_format.clone(),
            "-movflags".to_string(), "+faststart".to_string(),
            output.display().to_string(),
        ]
    }

    pub fn mux_args(video: &Path, audio: &Path, audio_bitrate: &str, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(), video.display().to_string(),
            "-i".to_string(), audio.display().to_string(),
            "-c:v".to_string(), "copy".to_string(),
            "-c:a".to_string(), "aac".to_string(),
            "-b:a".to_string(), audio_bitrate.to_string(),
            "-shortest".to_string(),
            "-movflags".to_string(), "+faststart".to_string(),
            output.display().to_string(),
        ]
    }

    pub fn concat_args(manifest: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-f".to_string(), "concat".to_string(),
            "-safe".to_string(), "0".to_string(),
            "-i".to_string(), manifest.display().to_string(),
            "-c".to_string(), "copy".to_string(),
            "-movflags".to_string(), "+faststart".to_string(),
            output.display().to_string(),
        ]
    }

    /// Read `format.duration` from ffprobe's JSON output
    pub fn parse_probe_duration(stdout: &str) -> Result<f64, MediaError> {
        let json: Value = serde_json::from_str(stdout)
            .map_err(|e| MediaError::ProbeParse(format!("invalid JSON: {}", e)))?;

        let duration = json
            .get("format")
            .and_then(|format| format.get("duration"))
            .ok_or_else(|| MediaError::ProbeParse("no format.duration in output".to_string()))?;

        // ffprobe prints the duration as a string
        let seconds = match duration {
            Value::String(text) => text.trim().parse::<f64>().ok(),
            Value::Number(number) => number.as_f64(),
            _ => None,
        };

        match seconds {
            Some(seconds) if seconds.is_finite() => Ok(seconds),
            _ => Err(MediaError::ProbeParse(format!("unusable duration value: {}", duration))),
        }
    }

    /// Strip the banner and stream dump from ffmpeg stderr, keeping the diagnostics
    pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
        let kept = stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !STDERR_NOISE.iter().any(|noise| line.starts_with(noise)))
            .collect::<Vec<_>>();

        if kept.is_empty() {
            return "no diagnostics on stderr".to_string();
        }
        kept.join("\n")
    }

    async fn run(&self, program: &Path, args: Vec<String>) -> Result<Output, MediaError> {
        let tool = program
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| program.display().to_string());
        let command_line = process::describe(&program.display().to_string(), &args);
        debug!("Running {}", command_line);

        let mut command = Command::new(program);
        command.args(&args);

        let result = process::run_with_timeout(command, self.timeout)
            .await
            .map_err(|e| MediaError::Spawn {
                tool: tool.clone(),
                message: e.to_string(),
            })?;

        match result {
            CommandOutcome::TimedOut => Err(MediaError::Timeout {
                tool,
                secs: self.timeout.as_secs(),
            }),
            CommandOutcome::Finished(output) if output.status.success() => Ok(output),
            CommandOutcome::Finished(output) => {
                let stderr = Self::filter_ffmpeg_stderr(&String::from_utf8_lossy(&output.stderr));
                error!("Command failed: {}", command_line);
                error!("{} stderr:\n{}", tool, stderr);
                Err(MediaError::ToolFailed {
                    tool,
                    status: output.status.to_string(),
                    stderr,
                })
            }
        }
    }
}

#[async_trait]
impl MediaToolkit for Ffmpeg {
    async fn probe_duration(&self, media: &Path) -> Result<f64, MediaError> {
        let args = vec![
            "-v".to_string(), "error".to_string(),
            "-show_entries".to_string(), "format=duration".to_string(),
            "-of".to_string(), "json".to_string(),
            media.display().to_string(),
        ];
        let output = self.run(&self.ffprobe, args).await?;
        Self::parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
    }

    async fn render_image_track(
        &self,
        image: &Path,
        duration_secs: f64,
        settings: &RenderSettings,
        output: &Path,
    ) -> Result<(), MediaError> {
        self.run(&self.ffmpeg, Self::render_args(image, duration_secs, settings, output)).await?;
        Ok(())
    }

    async fn mux(&self, video: &Path, audio: &Path, audio_bitrate: &str, output: &Path) -> Result<(), MediaError> {
        self.run(&self.ffmpeg, Self::mux_args(video, audio, audio_bitrate, output)).await?;
        Ok(())
    }

    async fn concat(&self, manifest: &Path, output: &Path) -> Result<(), MediaError> {
        self.run(&self.ffmpeg, Self::concat_args(manifest, output)).await?;
        Ok(())
    }
}
