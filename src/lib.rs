/*!
 * # storyreel - narrated vertical videos from a script and a folder of images
 *
 * Every line of `script.txt` is spoken by a neural voice, paired with the
 * image of the same position (`1.png`, `2.png`, ...), held on screen for the
 * length of the speech, and the resulting clips are joined into one video.
 *
 * ## Features
 *
 * - 27 narration languages, each with a curated voice
 * - Fallback voice discovered from the engine's catalog by ranked locale
 * - Bounded retries per voice with a growing pause
 * - Lines that cannot be spoken are skipped and logged, the rest still renders
 * - 1080x1920 letterboxed output, lossless final concatenation
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management
 * - `app_controller`: Startup checks, tool resolution and run summary
 * - `languages`: Supported languages, voices and locales
 * - `file_utils`: Script reading, text cleanup, image discovery
 * - `speech`: Speech engine seam, voice resolution and retrying synthesis:
 *   - `speech::edge`: `edge-tts` command line client
 *   - `speech::mock`: Scriptable engine for tests
 * - `media`: Media toolchain seam, clip building and assembly:
 *   - `media::ffmpeg`: ffmpeg/ffprobe client
 * - `pipeline`: Ordered per-line processing and failure log
 * - `workspace`: Temporary directory owned by one run
 * - `tools`: External executable lookup
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod languages;
pub mod media;
pub mod pipeline;
pub mod process;
pub mod speech;
pub mod tools;
pub mod workspace;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Backends, Controller};
pub use errors::{MediaError, PipelineError, SpeechError};
pub use languages::{get_language_name, supported_codes};
pub use pipeline::{FailureRecord, RunReport, WorkUnit};
