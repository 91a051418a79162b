//! # pdf-extractor
//!
//! Extracts selected pages from a PDF, optionally puts a rendered Markdown
//! intro in front of them, and writes the result as a single PDF.
//!
//! Pages and file locations come from a YAML file:
//!
//! ```yaml
//! file: input/plan.pdf
//! output: output/plan.pdf
//! appendFirstPage: intro.md
//! pages:
//!   - name: Warmup
//!     pageIndex: 3
//!   - name: Cooldown
//!     page: 7
//! ```
//!
//! Markdown is rendered to HTML and printed to PDF by a headless browser;
//! page extraction and merging go through `pdftk` or, optionally, `lopdf`.
//!
//! ## Usage
//!
//! ```bash
//! pdf-extractor --yaml resources/config.yaml
//! pdf-extractor -y resources/config.yaml -m intro.md -o out.pdf --toolkit native
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod paths;
pub mod pdf_merger;
pub mod process;
pub mod renderer;
pub mod workspace;

pub use config::{load_config, Config, PageSelector};
pub use error::ExtractorError;
pub use extractor::{Extractor, MergeOutcome};
pub use paths::{Overrides, ResolvedPaths};
pub use pdf_merger::{NativeToolkit, PdfMerger, PdfToolkit, Pdftk};
pub use process::{ExternalProcess, ProcessOutput, SystemProcess};
pub use renderer::{ChromiumRenderer, HtmlRenderer, PdfOptions, ScriptRenderer};
pub use workspace::Workspace;
