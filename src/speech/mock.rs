/*!
 * Mock speech engine and voice catalog for testing.
 *
 * - `MockEngine::working()` - Always writes an audio file
 * - `MockEngine::failing()` - Always fails with an error
 * - `MockEngine::silent()` - Reports success without writing audio
 *
 * Failures can be narrowed to one voice, to texts containing a marker, or to
 * the first N calls. Failing calls may leave a truncated file behind. The
 * "audio" written is plain text (`voice` and `text` on two lines) so fake
 * media tooling can read it back.
 */

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::SpeechError;

use super::{SpeechEngine, SpeechParams, VoiceCatalog, VoiceInfo};

/// Behavior mode for the mock engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Writes audio for every request
    Working,
    /// Always fails with an error
    Failing,
    /// Returns Ok without writing anything
    Silent,
}

/// Mock engine for exercising retry and fallback behavior
#[derive(Debug)]
pub struct MockEngine {
    behavior: MockBehavior,
    /// Voices that always fail
    failing_voices: Vec<String>,
    /// Texts containing any of these markers always fail
    failing_markers: Vec<String>,
    /// Number of initial calls that fail regardless of input
    fail_first: usize,
    /// Failing calls write a truncated file before erroring
    partial_on_failure: bool,
    request_count: AtomicUsize,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockEngine {
    /// Create a new mock engine with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            failing_voices: Vec::new(),
            failing_markers: Vec::new(),
            fail_first: 0,
            partial_on_failure: false,
            request_count: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn silent() -> Self {
        Self::new(MockBehavior::Silent)
    }

    /// Make every request for `voice` fail
    pub fn failing_voice(mut self, voice: impl Into<String>) -> Self {
        self.failing_voices.push(voice.into());
        self
    }

    /// Make every request whose text contains `marker` fail
    pub fn failing_text(mut self, marker: impl Into<String>) -> Self {
        self.failing_markers.push(marker.into());
        self
    }

    /// Make the first `count` requests fail
    pub fn failing_first(mut self, count: usize) -> Self {
        self.fail_first = count;
        self
    }

    /// Make failing requests leave partial audio at the output path
    pub fn leaving_partial_audio(mut self) -> Self {
        self.partial_on_failure = true;
        self
    }

    /// Number of synthesize calls so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// `(voice, text)` of every call, in call order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechEngine for MockEngine {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        _params: &SpeechParams,
        output: &Path,
    ) -> Result<(), SpeechError> {
        let index = self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((voice.to_string(), text.to_string()));
        }

        let fails = self.behavior == MockBehavior::Failing
            || index < self.fail_first
            || self.failing_voices.iter().any(|v| v == voice)
            || self.failing_markers.iter().any(|m| text.contains(m.as_str()));
        if fails {
            if self.partial_on_failure {
                let _ = tokio::fs::write(output, b"ID3").await;
            }
            return Err(SpeechError::EngineFailed {
                voice: voice.to_string(),
                message: format!("simulated failure on request {}", index + 1),
            });
        }

        if self.behavior == MockBehavior::Silent {
            return Ok(());
        }

        tokio::fs::write(output, format!("{}\n{}", voice, text))
            .await
            .map_err(|e| SpeechError::EngineFailed {
                voice: voice.to_string(),
                message: e.to_string(),
            })
    }
}

/// Static voice catalog
#[derive(Debug, Clone)]
pub struct MockCatalog {
    voices: Option<Vec<VoiceInfo>>,
}

impl MockCatalog {
    pub fn with_voices(voices: Vec<VoiceInfo>) -> Self {
        Self { voices: Some(voices) }
    }

    /// A catalog whose query always fails, like an offline engine
    pub fn unavailable() -> Self {
        Self { voices: None }
    }
}

#[async_trait]
impl VoiceCatalog for MockCatalog {
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        self.voices
            .clone()
            .ok_or_else(|| SpeechError::CatalogUnavailable("mock catalog is offline".to_string()))
    }
}
