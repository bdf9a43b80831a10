/*!
 * Speech synthesis with bounded retries and voice fall-through.
 *
 * The retry loop is a small state machine over `(voice_index, attempt)`:
 * every candidate voice gets `max_retries + 1` attempts, with a linearly
 * growing pause after each failure, before the next voice is tried.
 */

use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::SpeechConfig;
use crate::errors::SpeechError;

use super::{SpeechEngine, SpeechParams};

/// How often and how patiently a voice is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries per voice after the first attempt
    pub max_retries: u32,
    /// Pause after the first failure
    pub base_delay: Duration,
    /// Added to the pause for every further failure
    pub step: Duration,
}

impl RetryPolicy {
    /// Policy without any pauses, mostly useful in tests
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            step: Duration::ZERO,
        }
    }

    /// Attempts made per voice
    pub fn attempts_per_voice(&self) -> u32 {
        self.max_retries + 1
    }

    /// Pause after failed attempt `attempt` (0-based) of a voice
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay + self.step * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&SpeechConfig::default())
    }
}

impl From<&SpeechConfig> for RetryPolicy {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            base_delay: config.retry_base_delay(),
            step: config.retry_step(),
        }
    }
}

/// Successful synthesis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesized {
    /// Written audio file
    pub audio: PathBuf,
    /// Voice that produced it
    pub voice: String,
    /// True when the voice is not the first candidate
    pub used_fallback: bool,
    /// Attempts made across all voices, including the successful one
    pub attempts: u32,
}

/// Every voice and every retry failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisFailure {
    /// Description of the most recent error
    pub last_error: String,
    /// Attempts made across all voices
    pub attempts: u32,
}

/// Wraps a speech engine with retry and fallback handling
#[derive(Debug, Clone)]
pub struct Synthesizer {
    engine: Arc<dyn SpeechEngine>,
    params: SpeechParams,
    policy: RetryPolicy,
}

impl Synthesizer {
    pub fn new(engine: Arc<dyn SpeechEngine>, params: SpeechParams, policy: RetryPolicy) -> Self {
        Self { engine, params, policy }
    }

    /// Synthesize `text` into `output`, trying `candidates` strictly in order
    ///
    /// Never fails the caller's batch: exhaustion comes back as a
    /// `SynthesisFailure` carrying the last error for logging.
    pub async fn synthesize(
        &self,
        text: &str,
        candidates: &[String],
        output: &Path,
    ) -> Result<Synthesized, SynthesisFailure> {
        if candidates.is_empty() {
            return Err(SynthesisFailure {
                last_error: "no candidate voices".to_string(),
                attempts: 0,
            });
        }

        let attempts_per_voice = self.policy.attempts_per_voice();
        let total_attempts = attempts_per_voice * candidates.len() as u32;
        let mut last_error = String::new();
        let mut made = 0u32;
        let mut voice_index = 0usize;
        let mut attempt = 0u32;

        while voice_index < candidates.len() {
            let voice = &candidates[voice_index];
            made += 1;

            match self.attempt(text, voice, output).await {
                Ok(()) => {
                    return Ok(Synthesized {
                        audio: output.to_path_buf(),
                        voice: voice.clone(),
                        used_fallback: voice_index > 0,
                        attempts: made,
                    });
                }
                Err(e) => {
                    last_error = e.to_string();
                    debug!("Attempt {}/{} with {} failed: {}", attempt + 1, attempts_per_voice, voice, last_error);
                }
            }

            let delay = self.policy.delay_for(attempt);

            attempt += 1;
            if attempt >= attempts_per_voice {
                if voice_index + 1 < candidates.len() {
                    warn!("Voice {} failed {} times, trying {}", voice, attempts_per_voice, candidates[voice_index + 1]);
                }
                voice_index += 1;
                attempt = 0;
            }

            if made < total_attempts && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        Err(SynthesisFailure {
            last_error,
            attempts: made,
        })
    }

    async fn attempt(&self, text: &str, voice: &str, output: &Path) -> Result<(), SpeechError> {
        // Leftovers of a failed attempt must not pass for this attempt's audio
        match tokio::fs::remove_file(output).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(SpeechError::ClearAudio {
                    path: output.to_path_buf(),
                    source,
                });
            }
        }

        self.engine.synthesize(text, voice, &self.params, output).await?;

        // An engine that "succeeds" without audio is treated as a failed attempt
        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(SpeechError::EmptyAudio(output.to_path_buf())),
        }
    }
}
