//! Effective file locations for a run.
//!
//! Relative paths in the config are anchored to the config file: input and
//! output against the project root (two levels above the config file), the
//! markdown intro against the config file's own directory.

use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::Config;
use crate::error::{ExtractorError, Result};

/// Inserted before the output file extension so runs of this tool do not
/// overwrite outputs produced by other implementations.
pub const OUTPUT_TAG: &str = "rust";

/// Paths given on the command line. Each one replaces the config value verbatim.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub markdown: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub markdown: Option<PathBuf>,
}

impl ResolvedPaths {
    pub fn resolve(config_path: &Path, config: &Config, overrides: &Overrides) -> Result<Self> {
        let input = match given(&overrides.input) {
            Some(path) => path.to_path_buf(),
            None => {
                let file = given(&config.source_file).ok_or(ExtractorError::MissingSetting {
                    setting: "input PDF",
                    flag: "--input",
                    key: "file",
                })?;
                resolve_input(config_path, file)
            }
        };

        let output = match given(&overrides.output) {
            Some(path) => path.to_path_buf(),
            None => {
                let file = given(&config.output_file).ok_or(ExtractorError::MissingSetting {
                    setting: "output PDF",
                    flag: "--output",
                    key: "output",
                })?;
                with_tag(&project_root(config_path).join(file), OUTPUT_TAG)
            }
        };

        let markdown = given(&overrides.markdown).map(Path::to_path_buf).or_else(|| {
            given(&config.append_markdown).map(|md| config_dir(config_path).join(md))
        });

        let resolved = Self {
            input: absolute(&input)?,
            output: absolute(&output)?,
            markdown: markdown.as_deref().map(absolute).transpose()?,
        };
        debug!(?resolved, "Resolved paths");
        Ok(resolved)
    }
}

/// An empty path counts as not given.
fn given(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| !p.as_os_str().is_empty())
}

/// Directory holding the config file; `.` when the path has no parent.
pub fn config_dir(config_path: &Path) -> PathBuf {
    parent_or_current(config_path)
}

/// One level above the config directory.
pub fn project_root(config_path: &Path) -> PathBuf {
    parent_or_current(&config_dir(config_path))
}

fn parent_or_current(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Tries the project root first and the config directory second; when
/// neither exists the project-root path is returned so the caller can
/// report it as missing.
fn resolve_input(config_path: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        return file.to_path_buf();
    }

    let standard = project_root(config_path).join(file);
    if standard.exists() {
        return standard;
    }

    let fallback = config_dir(config_path).join(file);
    if fallback.exists() {
        debug!(path = %fallback.display(), "Input found next to the config file");
        return fallback;
    }

    standard
}

/// `plan.pdf` becomes `plan_<tag>.pdf`; a path without extension gets the tag appended.
pub fn with_tag(path: &Path, tag: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, tag, ext.to_string_lossy()),
        None => format!("{}_{}", stem, tag),
    };
    path.with_file_name(file_name)
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    std::path::absolute(path)
}
