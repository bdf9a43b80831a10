/*!
 * Error types for the storyreel application.
 *
 * Each layer gets its own enum, defined with the thiserror crate:
 * speech synthesis, media tooling, and the pipeline that ties them together.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to the speech engine or its voice catalog
#[derive(Error, Debug)]
pub enum SpeechError {
    /// The engine ran but reported a failure
    #[error("Speech engine failed for voice {voice}: {message}")]
    EngineFailed {
        /// Voice identifier used for the attempt
        voice: String,
        /// Diagnostic text reported by the engine
        message: String,
    },

    /// The engine program could not be started
    #[error("Failed to start speech engine '{program}': {message}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying OS error
        message: String,
    },

    /// The engine did not finish in time
    #[error("Speech engine timed out after {0} seconds")]
    Timeout(u64),

    /// The engine reported success but produced no audio
    #[error("Speech engine produced no audio at {}", .0.display())]
    EmptyAudio(PathBuf),

    /// Audio left by an earlier attempt could not be removed
    #[error("Failed to clear previous audio at {}: {source}", .path.display())]
    ClearAudio {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The voice catalog could not be fetched
    #[error("Voice catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

/// Errors raised by the media toolchain (probe, render, mux, concat)
#[derive(Error, Debug)]
pub enum MediaError {
    /// A tool exited with a non-zero status
    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        /// Tool name, e.g. "ffmpeg"
        tool: String,
        /// Exit status description
        status: String,
        /// Filtered diagnostic output of the tool
        stderr: String,
    },

    /// A tool could not be started
    #[error("Failed to execute {tool}: {message}")]
    Spawn {
        /// Tool name
        tool: String,
        /// Underlying OS error
        message: String,
    },

    /// A tool did not finish in time
    #[error("{tool} timed out after {secs} seconds")]
    Timeout {
        /// Tool name
        tool: String,
        /// Timeout that elapsed
        secs: u64,
    },

    /// Probe output could not be interpreted as a duration
    #[error("Failed to parse probe output: {0}")]
    ProbeParse(String),

    /// Concatenation was requested with nothing to join
    #[error("No segments to concatenate")]
    NoSegments,

    /// Filesystem error around a tool invocation
    #[error("Media I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that stop a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required executable is neither next to the program nor on PATH
    #[error("{0} not found. Put it next to storyreel or add it to PATH.")]
    MissingTool(String),

    /// The script file does not exist
    #[error("Missing script file: {}", .0.display())]
    MissingScript(PathBuf),

    /// The script has no usable lines
    #[error("{} has no usable lines", .0.display())]
    EmptyScript(PathBuf),

    /// No image files were found
    #[error("No images found in {} (1.png, 2.png, ...)", .0.display())]
    NoImages(PathBuf),

    /// Nothing to process after pairing lines with images
    #[error("No usable line/image pairs")]
    NoWorkUnits,

    /// Every line failed speech synthesis
    #[error("All lines failed speech synthesis. Check {}", .failure_log.display())]
    AllUnitsFailed {
        /// Where the failures were recorded
        failure_log: PathBuf,
    },

    /// Rendering or muxing a line failed; the whole run is aborted
    #[error("Rendering line {line} failed: {source}")]
    Render {
        /// 1-based line number
        line: usize,
        /// Underlying media failure
        #[source]
        source: MediaError,
    },

    /// Joining the segments failed
    #[error("Final concatenation failed: {0}")]
    Assembly(#[source] MediaError),

    /// The temporary workspace could not be created or removed
    #[error("Workspace error: {0}")]
    Workspace(#[source] std::io::Error),

    /// The failure log could not be written
    #[error("Failed to write failure log {}: {source}", .path.display())]
    FailureLog {
        /// Failure log path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
