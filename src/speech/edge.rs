use async_trait::async_trait;
use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::errors::SpeechError;
use crate::process::{self, CommandOutcome};

use super::{SpeechEngine, SpeechParams, VoiceCatalog, VoiceInfo};

// @const: Short voice names such as "en-US-JennyNeural" or "zh-CN-liaoning-XiaobeiNeural"
static VOICE_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[a-z]{2,3}(?:-[A-Za-z0-9]+)+Neural\b").unwrap()
});

/// Client for the `edge-tts` command line program
///
/// Synthesis writes one MP3 per call via `--write-media`; the catalog is read
/// from `--list-voices`.
#[derive(Debug, Clone)]
pub struct EdgeTts {
    /// Resolved path of the program
    program: PathBuf,
    /// Deadline for one call
    timeout: Duration,
}

impl EdgeTts {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Build the argument list for one synthesis call
    ///
    /// Values are attached with `=` so texts or adjustments that start with `-`
    /// are not mistaken for options.
    pub fn synthesis_args(text: &str, voice: &str, params: &SpeechParams, output: &Path) -> Vec<String> {
        vec![
            format!("--voice={}", voice),
            format!("--rate={}", params.rate),
            format!("--volume={}", params.volume),
            format!("--text={}", text),
            format!("--write-media={}", output.display()),
        ]
    }

    /// Extract voices from `--list-voices` output
    ///
    /// Handles both the tabular listing of newer releases and the older
    /// `ShortName: ...` blocks. The locale is the short name minus its last segment.
    pub fn parse_voice_list(listing: &str) -> Vec<VoiceInfo> {
        let mut voices: Vec<VoiceInfo> = Vec::new();

        for found in VOICE_NAME_REGEX.find_iter(listing) {
            let id = found.as_str();
            if voices.iter().any(|voice| voice.id == id) {
                continue;
            }
            if let Some((locale, _)) = id.rsplit_once('-') {
                voices.push(VoiceInfo::new(id, locale));
            }
        }

        voices
    }
}

#[async_trait]
impl SpeechEngine for EdgeTts {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        params: &SpeechParams,
        output: &Path,
    ) -> Result<(), SpeechError> {
        let args = Self::synthesis_args(text, voice, params, output);
        debug!("Running {}", process::describe(&self.program_name(), &args));

        let mut command = Command::new(&self.program);
        command.args(&args);

        let result = process::run_with_timeout(command, self.timeout)
            .await
            .map_err(|e| SpeechError::Spawn {
                program: self.program_name(),
                message: e.to_string(),
            })?;

        match result {
            CommandOutcome::TimedOut => Err(SpeechError::Timeout(self.timeout.as_secs())),
            CommandOutcome::Finished(output) if output.status.success() => Ok(()),
            CommandOutcome::Finished(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                // Python tracebacks end with the useful line
                let message = stderr
                    .lines()
                    .rev()
                    .find(|line| !line.trim().is_empty())
                    .unwrap_or("no diagnostic output")
                    .trim()
                    .to_string();
                Err(SpeechError::EngineFailed {
                    voice: voice.to_string(),
                    message: format!("{} ({})", message, output.status),
                })
            }
        }
    }
}

#[async_trait]
impl VoiceCatalog for EdgeTts {
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        let mut command = Command::new(&self.program);
        command.arg("--list-voices");

        let result = process::run_with_timeout(command, self.timeout)
            .await
            .map_err(|e| SpeechError::CatalogUnavailable(e.to_string()))?;

        let output = match result {
            CommandOutcome::TimedOut => {
                return Err(SpeechError::CatalogUnavailable(format!(
                    "voice listing timed out after {} seconds",
                    self.timeout.as_secs()
                )));
            }
            CommandOutcome::Finished(output) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Voice listing failed: {}", stderr.trim());
            return Err(SpeechError::CatalogUnavailable(format!("voice listing exited with {}", output.status)));
        }

        let voices = Self::parse_voice_list(&String::from_utf8_lossy(&output.stdout));
        if voices.is_empty() {
            return Err(SpeechError::CatalogUnavailable("voice listing was empty".to_string()));
        }
        Ok(voices)
    }
}
