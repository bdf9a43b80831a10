use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::errors::PipelineError;
use crate::file_utils::FileManager;
use crate::languages;
use crate::media::{Assembler, ClipBuilder, Ffmpeg, MediaToolkit};
use crate::pipeline::{self, FailureLog, PipelineRunner, RunReport};
use crate::speech::edge::EdgeTts;
use crate::speech::{RetryPolicy, SpeechEngine, SpeechParams, Synthesizer, VoiceCatalog, VoiceResolver};
use crate::tools::ToolPaths;
use crate::workspace::Workspace;

// @module: Application controller for narrated video builds

/// The collaborators a run talks to
#[derive(Debug, Clone)]
pub struct Backends {
    pub engine: Arc<dyn SpeechEngine>,
    pub catalog: Arc<dyn VoiceCatalog>,
    pub media: Arc<dyn MediaToolkit>,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Parent of the per-run workspace, the system temp folder when unset
    workspace_root: Option<PathBuf>,
}

impl Controller {
    /// Create a controller with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self {
            config,
            workspace_root: None,
        })
    }

    /// Create run workspaces under `root` instead of the system temp folder
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the video for the script and images in `dir` with the real tools
    ///
    /// ffmpeg, ffprobe and the speech program must be found before anything else happens.
    pub async fn run(&self, dir: &Path) -> Result<RunReport> {
        let tools = ToolPaths::resolve(&self.config)?;

        let edge = Arc::new(EdgeTts::new(
            tools.speech_engine,
            Duration::from_secs(self.config.speech.timeout_secs),
        ));
        let media = Arc::new(Ffmpeg::new(
            tools.ffmpeg,
            tools.ffprobe,
            Duration::from_secs(self.config.video.timeout_secs),
        ));

        let backends = Backends {
            engine: edge.clone(),
            catalog: edge,
            media,
        };
        self.run_with_backends(dir, backends).await
    }

    /// Build the video for the script and images in `dir` with the given collaborators
    pub async fn run_with_backends(&self, dir: &Path, backends: Backends) -> Result<RunReport> {
        let files = &self.config.files;
        let script_path = dir.join(&files.script_file);
        let output_path = dir.join(&files.output_file);

        if !FileManager::file_exists(&script_path) {
            return Err(PipelineError::MissingScript(script_path).into());
        }
        let lines = FileManager::read_script(&script_path)?;
        if lines.is_empty() {
            return Err(PipelineError::EmptyScript(script_path).into());
        }

        let images = FileManager::list_images(dir, &files.image_extensions)
            .with_context(|| format!("Failed to list images in {}", dir.display()))?;
        if images.is_empty() {
            return Err(PipelineError::NoImages(dir.to_path_buf()).into());
        }

        let units = pipeline::pair_work_units(lines, images);
        if units.is_empty() {
            return Err(PipelineError::NoWorkUnits.into());
        }

        let profile = languages::profile(&self.config.language)?;
        let voices = VoiceResolver::new(backends.catalog).resolve(profile).await;
        let language_name = languages::get_language_name(profile.code).unwrap_or_else(|_| profile.code.to_string());

        info!("storyreel: {} ({}), {} lines", language_name, profile.code, units.len());
        info!("Voice: {}", voices.primary);
        match voices.effective_fallback() {
            Some(fallback) => info!("Fallback voice: {}", fallback),
            None => info!("Fallback voice: none"),
        }

        let speech = &self.config.speech;
        let synthesizer = Synthesizer::new(
            backends.engine,
            SpeechParams {
                rate: speech.rate.clone(),
                volume: speech.volume.clone(),
            },
            RetryPolicy::from(speech),
        );
        let clip_builder = ClipBuilder::new(backends.media.clone(), &self.config.video);
        let assembler = Assembler::new(backends.media);
        let failure_log = FailureLog::new(dir.join(&files.failure_log));

        let progress = Self::progress_bar(units.len());
        let runner = PipelineRunner::new(synthesizer, voices.candidates(), clip_builder, assembler, failure_log)
            .with_concurrency(speech.concurrent_requests)
            .with_progress(progress.clone());

        let workspace = match &self.workspace_root {
            Some(root) => Workspace::create_in(root),
            None => Workspace::create(),
        }
        .map_err(PipelineError::Workspace)?;
        let result = runner.run(&units, &workspace, &output_path).await;
        progress.finish_and_clear();

        if let Err(e) = workspace.close() {
            warn!("Failed to remove temporary files: {}", e);
        }

        let report = result?;

        info!("Success: {}", report.output.display());
        info!("Elapsed: {}", Self::format_duration(report.elapsed));
        if report.has_failures() {
            warn!(
                "{} line(s) skipped after speech failures, see {}",
                report.failures.len(),
                runner.failure_log().path().display()
            );
        }

        Ok(report)
    }

    fn progress_bar(total: usize) -> ProgressBar {
        let progress_bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("=>-"));
        progress_bar
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
