use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::languages;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Narration language (ISO 639-1)
    #[serde(default = "default_language")]
    pub language: String,

    /// Input and output file names
    #[serde(default)]
    pub files: FileConfig,

    /// Speech synthesis settings
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Video rendering settings
    #[serde(default)]
    pub video: VideoConfig,

    /// External tool names
    #[serde(default)]
    pub tools: ToolConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// File names inside the working directory
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FileConfig {
    /// Script with one spoken line per text line
    #[serde(default = "default_script_file")]
    pub script_file: String,

    /// Final video
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Log of lines whose synthesis failed
    #[serde(default = "default_failure_log")]
    pub failure_log: String,

    /// Image extensions picked up from the working directory (without dot)
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            script_file: default_script_file(),
            output_file: default_output_file(),
            failure_log: default_failure_log(),
            image_extensions: default_image_extensions(),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpeechConfig {
    /// Speaking rate adjustment, e.g. "+0%" or "-10%"
    #[serde(default = "default_adjustment")]
    pub rate: String,

    /// Volume adjustment, e.g. "+0%"
    #[serde(default = "default_adjustment")]
    pub volume: String,

    /// Retries per voice after the first attempt
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Delay after the first failed attempt, in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Extra delay added per further attempt, in milliseconds
    #[serde(default = "default_retry_step_ms")]
    pub retry_step_ms: u64,

    /// How many lines may be synthesized ahead of rendering
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Timeout for one synthesis call, in seconds
    #[serde(default = "default_speech_timeout_secs")]
    pub timeout_secs: u64,

    /// Text-to-speech program
    #[serde(default = "default_engine_program")]
    pub engine_program: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            rate: default_adjustment(),
            volume: default_adjustment(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_step_ms: default_retry_step_ms(),
            concurrent_requests: default_concurrent_requests(),
            timeout_secs: default_speech_timeout_secs(),
            engine_program: default_engine_program(),
        }
    }
}

impl SpeechConfig {
    /// Delay after the first failed attempt
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Per-attempt delay increment
    pub fn retry_step(&self) -> Duration {
        Duration::from_millis(self.retry_step_ms)
    }
}

/// Video rendering configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VideoConfig {
    /// Frames per second of every segment
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Frame width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Frame height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Colour used to fill the letterbox area
    #[serde(default = "default_background")]
    pub background: String,

    /// Seconds added to the image track so audio is never truncated
    #[serde(default = "default_pad_secs")]
    pub pad_secs: f64,

    /// Output pixel format
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Video encoder for the image track
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// AAC bitrate of the muxed audio track
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Timeout for one ffmpeg/ffprobe call, in seconds
    #[serde(default = "default_media_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            width: default_width(),
            height: default_height(),
            background: default_background(),
            pad_secs: default_pad_secs(),
            pixel_format: default_pixel_format(),
            video_codec: default_video_codec(),
            audio_bitrate: default_audio_bitrate(),
            timeout_secs: default_media_timeout_secs(),
        }
    }
}

/// External tool names, resolved next to the program or on PATH
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

// @const: "+0%", "-15%", ...
static ADJUSTMENT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]\d+%$").unwrap());

fn default_language() -> String {
    languages::DEFAULT_LANGUAGE.to_string()
}

fn default_script_file() -> String {
    "script.txt".to_string()
}

fn default_output_file() -> String {
    "output.mp4".to_string()
}

fn default_failure_log() -> String {
    "tts_failed.txt".to_string()
}

fn default_image_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "webp"].iter().map(|ext| ext.to_string()).collect()
}

fn default_adjustment() -> String {
    "+0%".to_string()
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_base_delay_ms() -> u64 {
    600
}

fn default_retry_step_ms() -> u64 {
    800
}

fn default_concurrent_requests() -> usize {
    1
}

fn default_speech_timeout_secs() -> u64 {
    120
}

fn default_engine_program() -> String {
    "edge-tts".to_string()
}

fn default_fps() -> u32 {
    30
}

fn default_width() -> u32 {
    1080
}

fn default_height() -> u32 {
    1920
}

fn default_background() -> String {
    "black".to_string()
}

fn default_pad_secs() -> f64 {
    0.10
}

fn default_pixel_format() -> String {
    "yuv420p".to_string()
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

fn default_media_timeout_secs() -> u64 {
    600
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

impl Config {
    /// Load a configuration file, or write the defaults there if it does not exist yet
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        log::warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        languages::profile(&self.language)?;

        if self.files.image_extensions.is_empty() {
            return Err(anyhow!("At least one image extension is required"));
        }

        if !ADJUSTMENT_REGEX.is_match(&self.speech.rate) {
            return Err(anyhow!("Invalid speech rate '{}', expected e.g. +0% or -10%", self.speech.rate));
        }
        if !ADJUSTMENT_REGEX.is_match(&self.speech.volume) {
            return Err(anyhow!("Invalid speech volume '{}', expected e.g. +0% or -10%", self.speech.volume));
        }
        if self.speech.concurrent_requests == 0 {
            return Err(anyhow!("speech.concurrent_requests must be at least 1"));
        }
        if self.speech.timeout_secs == 0 {
            return Err(anyhow!("speech.timeout_secs must be at least 1"));
        }

        if self.video.fps == 0 {
            return Err(anyhow!("video.fps must be positive"));
        }
        // yuv420p needs even dimensions
        if self.video.width == 0 || self.video.height == 0 || self.video.width % 2 != 0 || self.video.height % 2 != 0 {
            return Err(anyhow!(
                "Invalid frame size {}x{}: both sides must be positive and even",
                self.video.width, self.video.height
            ));
        }
        if !self.video.pad_secs.is_finite() || self.video.pad_secs < 0.0 {
            return Err(anyhow!("video.pad_secs must be zero or positive"));
        }
        if self.video.timeout_secs == 0 {
            return Err(anyhow!("video.timeout_secs must be at least 1"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            language: default_language(),
            files: FileConfig::default(),
            speech: SpeechConfig::default(),
            video: VideoConfig::default(),
            tools: ToolConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
