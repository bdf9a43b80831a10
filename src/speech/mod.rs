/*!
 * Text-to-speech engines and voice selection.
 *
 * - `edge`: client driving the `edge-tts` command line program
 * - `mock`: scriptable in-process engine and catalog for tests
 * - `resolver`: primary/fallback voice selection per language
 * - `synthesizer`: retry and voice fall-through around an engine
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;

use crate::errors::SpeechError;

/// One voice offered by a speech engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    /// Identifier passed back to the engine, e.g. "en-GB-SoniaNeural"
    pub id: String,
    /// Locale of the voice, e.g. "en-GB"
    pub locale: String,
}

impl VoiceInfo {
    pub fn new(id: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            locale: locale.into(),
        }
    }
}

/// Prosody parameters applied to every synthesis call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechParams {
    /// Rate adjustment, e.g. "+0%"
    pub rate: String,
    /// Volume adjustment, e.g. "+0%"
    pub volume: String,
}

impl Default for SpeechParams {
    fn default() -> Self {
        Self {
            rate: "+0%".to_string(),
            volume: "+0%".to_string(),
        }
    }
}

/// Common trait for all speech engines
///
/// An engine turns text into an audio file using one voice. It is treated as an
/// opaque, possibly remote service with its own failure modes.
#[async_trait]
pub trait SpeechEngine: Send + Sync + Debug {
    /// Synthesize `text` with `voice` into `output`
    ///
    /// # Returns
    /// * `Result<(), SpeechError>` - Ok once the audio file has been written
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        params: &SpeechParams,
        output: &Path,
    ) -> Result<(), SpeechError>;
}

/// Enumerates the voices an engine can speak with
#[async_trait]
pub trait VoiceCatalog: Send + Sync + Debug {
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError>;
}

pub mod edge;
pub mod mock;
pub mod resolver;
pub mod synthesizer;

pub use resolver::{ResolvedVoices, VoiceResolver};
pub use synthesizer::{RetryPolicy, SynthesisFailure, Synthesized, Synthesizer};
