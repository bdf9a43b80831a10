/*!
 * Resolution of the external executables storyreel drives.
 *
 * A tool placed next to the storyreel binary wins over one found on PATH,
 * so a self-contained folder with its own ffmpeg build behaves predictably.
 */

use log::debug;
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::errors::PipelineError;

/// Absolute paths of every external program a run needs
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub speech_engine: PathBuf,
}

impl ToolPaths {
    /// Resolve all tools named in the configuration
    pub fn resolve(config: &Config) -> Result<Self, PipelineError> {
        let program_dir = program_dir();
        let program_dir = program_dir.as_deref();

        Ok(Self {
            ffmpeg: resolve_tool(&config.tools.ffmpeg, program_dir)?,
            ffprobe: resolve_tool(&config.tools.ffprobe, program_dir)?,
            speech_engine: resolve_tool(&config.speech.engine_program, program_dir)?,
        })
    }
}

/// Platform-specific executable file name
pub fn executable_name(name: &str) -> String {
    if cfg!(windows) && Path::new(name).extension().is_none() {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

/// Find `name` in `program_dir` first, then on PATH
pub fn resolve_tool(name: &str, program_dir: Option<&Path>) -> Result<PathBuf, PipelineError> {
    let file_name = executable_name(name);

    if let Some(dir) = program_dir {
        let local = dir.join(&file_name);
        if local.is_file() {
            debug!("Using {} from program folder: {}", name, local.display());
            return Ok(local);
        }
    }

    match which::which(&file_name) {
        Ok(path) => {
            debug!("Using {} from PATH: {}", name, path.display());
            Ok(path)
        }
        Err(_) => Err(PipelineError::MissingTool(file_name)),
    }
}

fn program_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}
