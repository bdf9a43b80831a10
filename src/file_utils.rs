use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

// @const: Control characters that are replaced with a space (tab, LF and CR are kept)
static CONTROL_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F]").unwrap());

// @const: Whitespace runs
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// @const: First integer in a file stem
static NUMBER_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Marker that starts a comment line in the script
pub const COMMENT_MARKER: char = '#';

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Read the script and return its spoken lines, sanitized, in file order
    ///
    /// Blank lines and lines starting with `#` (after leading whitespace) are skipped,
    /// as are lines that end up empty after sanitizing.
    pub fn read_script<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
        let content = Self::read_to_string(path)?;
        Ok(Self::parse_script(&content))
    }

    /// Parse script text into spoken lines
    pub fn parse_script(content: &str) -> Vec<String> {
        content
            .lines()
            .map(|line| line.trim_start_matches('\u{feff}').trim())
            .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
            .map(Self::sanitize_text)
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// Clean up encoding artifacts that trip up speech engines
    pub fn sanitize_text(text: &str) -> String {
        let text = text.replace('\u{feff}', "");
        let text = CONTROL_CHARS.replace_all(&text, " ");
        let text = text
            .replace(['\u{201c}', '\u{201d}'], "\"")
            .replace(['\u{2018}', '\u{2019}'], "'");
        WHITESPACE.replace_all(&text, " ").trim().to_string()
    }

    /// Find image files directly inside `dir`, ordered by the first number in their name
    ///
    /// Files without a number come last, in file-name order.
    pub fn list_images<P: AsRef<Path>>(dir: P, extensions: &[String]) -> Result<Vec<PathBuf>> {
        let mut images = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }
            let matches = path
                .extension()
                .map(|ext| {
                    let ext = ext.to_string_lossy();
                    extensions.iter().any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(&ext))
                })
                .unwrap_or(false);
            if matches {
                images.push(path.to_path_buf());
            }
        }

        // Stable sort keeps file-name order for ties and unnumbered files
        images.sort_by_key(|path| match Self::image_order_key(path) {
            Some(number) => (0, number),
            None => (1, 0),
        });

        Ok(images)
    }

    /// The first integer embedded in a file's stem, if any
    pub fn image_order_key(path: &Path) -> Option<u64> {
        let stem = path.file_stem()?.to_string_lossy();
        NUMBER_TOKEN.find(&stem)?.as_str().parse().ok()
    }

    /// Append content to a text file, creating it if needed
    pub fn append_to_file<P: AsRef<Path>>(path: P, content: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        file.write_all(content.as_bytes())
    }

    /// Remove a file if it exists
    pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> std::io::Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
