//! Error type for the pdf-extractor library.
//!
//! Every failure that should end a run with exit code 1 is an
//! [`ExtractorError`]. A missing input PDF is deliberately *not* one of them:
//! the binary reports it and exits cleanly.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractorError {
    /// The YAML config file could not be read.
    #[error("Failed to read config file '{}': {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The YAML config file was read but is not a valid configuration.
    #[error("Failed to parse config file '{}': {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Neither the command line nor the config file names a required path.
    #[error("No {setting} given: pass {flag} or set `{key}` in the config file")]
    MissingSetting {
        setting: &'static str,
        flag: &'static str,
        key: &'static str,
    },

    /// An external program is not installed or not on `PATH`.
    #[error("'{program}' is required but was not found. Please install it or check your PATH.")]
    ToolNotFound { program: String },

    /// An external program exists but could not be started.
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Markdown could not be turned into a PDF.
    #[error("Markdown rendering failed: {0}")]
    Render(String),

    /// Selected pages could not be extracted from the input PDF.
    #[error("Page extraction failed: {0}")]
    Extract(String),

    /// Intermediate PDFs could not be merged into the output.
    #[error("PDF merge failed: {0}")]
    Merge(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ExtractorError>;
