/*!
 * Per-line pipeline: synthesize, render, mux, then concatenate.
 *
 * Units are processed in index order. Synthesis may run a bounded number of
 * units ahead (`concurrent_requests`), but its results are consumed through
 * an order-preserving buffer, so rendering and the final join always follow
 * the script order.
 *
 * A line whose synthesis fails on every voice is logged and skipped.
 * A render or mux failure aborts the run.
 */

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use log::{debug, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::errors::{MediaError, PipelineError};
use crate::file_utils::FileManager;
use crate::media::{Assembler, ClipBuilder};
use crate::speech::Synthesizer;
use crate::workspace::Workspace;

/// One script line paired with its image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    /// 0-based position in the script
    pub index: usize,
    pub line: String,
    pub image: PathBuf,
}

impl WorkUnit {
    /// 1-based line number, as shown to users
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Pair lines with images by position; the excess of the longer list is dropped
pub fn pair_work_units(lines: Vec<String>, images: Vec<PathBuf>) -> Vec<WorkUnit> {
    if lines.len() != images.len() {
        warn!(
            "Line/image count mismatch: {} lines, {} images. Using the first {} of each.",
            lines.len(),
            images.len(),
            lines.len().min(images.len())
        );
    }

    lines
        .into_iter()
        .zip(images)
        .enumerate()
        .map(|(index, (line, image))| WorkUnit { index, line, image })
        .collect()
}

/// Lifecycle of a unit within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    Synthesizing,
    Synthesized,
    SynthFailed,
    Rendering,
    Rendered,
    RenderFailed,
    Done,
}

impl UnitState {
    /// Whether moving from `self` to `next` is a legal step
    pub fn can_advance_to(self, next: UnitState) -> bool {
        use UnitState::*;
        matches!(
            (self, next),
            (Pending, Synthesizing)
                | (Synthesizing, Synthesized)
                | (Synthesizing, SynthFailed)
                | (SynthFailed, Done)
                | (Synthesized, Rendering)
                | (Rendering, Rendered)
                | (Rendering, RenderFailed)
                | (Rendered, Done)
        )
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitState::Pending => "pending",
            UnitState::Synthesizing => "synthesizing",
            UnitState::Synthesized => "synthesized",
            UnitState::SynthFailed => "synthesis failed",
            UnitState::Rendering => "rendering",
            UnitState::Rendered => "rendered",
            UnitState::RenderFailed => "render failed",
            UnitState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Current state of every unit in a run
#[derive(Debug, Clone)]
struct UnitTracker {
    states: Vec<UnitState>,
}

impl UnitTracker {
    fn new(count: usize) -> Self {
        Self {
            states: vec![UnitState::Pending; count],
        }
    }

    fn advance(&mut self, index: usize, next: UnitState) {
        if let Some(state) = self.states.get_mut(index) {
            debug_assert!(state.can_advance_to(next), "illegal transition {} -> {}", state, next);
            debug!("Line {}: {} -> {}", index + 1, state, next);
            *state = next;
        }
    }

    fn into_states(self) -> Vec<UnitState> {
        self.states
    }
}

/// A line that could not be synthesized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    /// 1-based
    pub line_number: usize,
    pub text: String,
    pub error: String,
}

impl FailureRecord {
    pub fn to_log_block(&self) -> String {
        format!("Line {}: {}\nError: {}\n\n", self.line_number, self.text, self.error)
    }
}

/// Append-only log of failed lines, owned by one run
#[derive(Debug, Clone)]
pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop the log of a previous run
    pub fn reset(&self) -> Result<(), PipelineError> {
        FileManager::remove_if_exists(&self.path)
            .map(|_| ())
            .map_err(|source| self.io_error(source))
    }

    pub fn append(&self, record: &FailureRecord) -> Result<(), PipelineError> {
        FileManager::append_to_file(&self.path, &record.to_log_block()).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> PipelineError {
        PipelineError::FailureLog {
            path: self.path.clone(),
            source,
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output: PathBuf,
    /// Number of segments joined into the output
    pub segments: usize,
    pub failures: Vec<FailureRecord>,
    /// Final state of every unit, by index
    pub states: Vec<UnitState>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Drives a batch of work units through synthesis, rendering and assembly
pub struct PipelineRunner {
    synthesizer: Synthesizer,
    candidates: Vec<String>,
    clip_builder: ClipBuilder,
    assembler: Assembler,
    failure_log: FailureLog,
    concurrency: usize,
    progress: ProgressBar,
}

impl PipelineRunner {
    pub fn new(
        synthesizer: Synthesizer,
        candidates: Vec<String>,
        clip_builder: ClipBuilder,
        assembler: Assembler,
        failure_log: FailureLog,
    ) -> Self {
        Self {
            synthesizer,
            candidates,
            clip_builder,
            assembler,
            failure_log,
            concurrency: 1,
            progress: ProgressBar::hidden(),
        }
    }

    /// Let synthesis run up to `concurrency` units ahead (minimum 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Report per-unit progress on `progress`
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn failure_log(&self) -> &FailureLog {
        &self.failure_log
    }

    /// Process `units` into `output`, using `workspace` for intermediates
    pub async fn run(&self, units: &[WorkUnit], workspace: &Workspace, output: &Path) -> Result<RunReport, PipelineError> {
        if units.is_empty() {
            return Err(PipelineError::NoWorkUnits);
        }

        let started = Instant::now();
        self.failure_log.reset()?;

        let total = units.len();
        let mut tracker = UnitTracker::new(total);
        let mut segments: Vec<PathBuf> = Vec::with_capacity(total);
        let mut failures: Vec<FailureRecord> = Vec::new();

        self.progress.set_length(total as u64);
        self.progress.set_position(0);

        // Results come back in input order no matter which finishes first
        let synthesized = stream::iter(units.iter().map(|unit| {
            let audio = workspace.audio_path(unit.index);
            async move {
                info!("Line {}/{}: synthesizing speech", unit.number(), total);
                self.synthesizer.synthesize(&unit.line, &self.candidates, &audio).await
            }
        }))
        .buffered(self.concurrency);
        let mut synthesized = std::pin::pin!(synthesized);

        for unit in units {
            let number = unit.number();
            tracker.advance(unit.index, UnitState::Synthesizing);
            self.progress.set_message(format!("line {}: speech", number));

            let Some(result) = synthesized.next().await else {
                break;
            };
            debug!("Line {}/{}: speech ready", number, total);

            match result {
                Ok(speech) => {
                    tracker.advance(unit.index, UnitState::Synthesized);
                    if speech.used_fallback {
                        warn!("Line {}: primary voice failed, used fallback voice {}", number, speech.voice);
                    }

                    tracker.advance(unit.index, UnitState::Rendering);
                    self.progress.set_message(format!("line {}: video", number));

                    let built = self
                        .clip_builder
                        .build_segment(
                            &speech.audio,
                            &unit.image,
                            &workspace.image_track_path(unit.index),
                            &workspace.segment_path(unit.index),
                        )
                        .await;

                    match built {
                        Ok(segment) => {
                            info!(
                                "Line {}/{}: {:.2}s of speech, rendered and muxed with {}",
                                number,
                                total,
                                segment.audio_secs,
                                unit.image.display()
                            );
                            segments.push(segment.path);
                            tracker.advance(unit.index, UnitState::Rendered);
                            tracker.advance(unit.index, UnitState::Done);
                        }
                        Err(source) => {
                            tracker.advance(unit.index, UnitState::RenderFailed);
                            self.progress.abandon_with_message(format!("line {} failed", number));
                            return Err(PipelineError::Render { line: number, source });
                        }
                    }
                }
                Err(failure) => {
                    tracker.advance(unit.index, UnitState::SynthFailed);
                    warn!(
                        "Line {}: speech failed after {} attempts, skipping: {}",
                        number, failure.attempts, failure.last_error
                    );

                    let record = FailureRecord {
                        line_number: number,
                        text: unit.line.clone(),
                        error: failure.last_error,
                    };
                    self.failure_log.append(&record)?;
                    failures.push(record);
                    tracker.advance(unit.index, UnitState::Done);
                }
            }

            self.progress.inc(1);
        }

        if segments.is_empty() {
            self.progress.abandon_with_message("no line could be synthesized");
            return Err(PipelineError::AllUnitsFailed {
                failure_log: self.failure_log.path().to_path_buf(),
            });
        }

        self.progress.set_message("joining segments");
        FileManager::remove_if_exists(output).map_err(|e| PipelineError::Assembly(MediaError::Io(e)))?;
        self.assembler
            .concatenate(&segments, output, &workspace.manifest_path())
            .await
            .map_err(PipelineError::Assembly)?;
        self.progress.finish_with_message("done");

        Ok(RunReport {
            output: output.to_path_buf(),
            segments: segments.len(),
            failures,
            states: tracker.into_states(),
            elapsed: started.elapsed(),
        })
    }
}
