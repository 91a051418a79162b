use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::error::Result;
use crate::paths::ResolvedPaths;
use crate::pdf_merger::PdfToolkit;
use crate::renderer::{render_markdown, HtmlRenderer};
use crate::workspace::Workspace;

const MARKDOWN_PDF: &str = "markdown.pdf";
const EXTRACTED_PDF: &str = "extracted.pdf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The output file was written.
    Written(PathBuf),
    /// No markdown and no pages: nothing to write, the output is left untouched.
    Nothing,
}

/// Runs the render, extract and merge steps for one set of resolved paths.
pub struct Extractor {
    renderer: Box<dyn HtmlRenderer>,
    toolkit: Box<dyn PdfToolkit>,
    temp_root: Option<PathBuf>,
}

impl Extractor {
    pub fn new(renderer: Box<dyn HtmlRenderer>, toolkit: Box<dyn PdfToolkit>) -> Self {
        Self {
            renderer,
            toolkit,
            temp_root: None,
        }
    }

    /// Creates the per-run workspace under `root` instead of the system temp dir.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    pub async fn run(&self, paths: &ResolvedPaths, pages: &[u32]) -> Result<MergeOutcome> {
        let workspace = match &self.temp_root {
            Some(root) => Workspace::create_in(root)?,
            None => Workspace::create()?,
        };

        // On error the workspace is dropped here, which removes it.
        let outcome = self.assemble(&workspace, paths, pages).await?;
        workspace.close()?;
        Ok(outcome)
    }

    async fn assemble(
        &self,
        workspace: &Workspace,
        paths: &ResolvedPaths,
        pages: &[u32],
    ) -> Result<MergeOutcome> {
        let mut files_to_merge = Vec::new();

        if let Some(markdown) = &paths.markdown {
            let bytes = render_markdown(markdown, &*self.renderer).await?;
            let markdown_pdf = workspace.file(MARKDOWN_PDF);
            fs::write(&markdown_pdf, bytes).await?;
            files_to_merge.push(markdown_pdf);
        }

        if !pages.is_empty() {
            let extracted = workspace.file(EXTRACTED_PDF);
            self.toolkit.extract(&paths.input, pages, &extracted).await?;
            files_to_merge.push(extracted);
        }

        self.write_output(&files_to_merge, &paths.output).await
    }

    async fn write_output(&self, files: &[PathBuf], output: &Path) -> Result<MergeOutcome> {
        match files {
            [] => {
                warn!(output = %output.display(), "No markdown and no pages selected, nothing written");
                Ok(MergeOutcome::Nothing)
            }
            [single] => {
                fs::copy(single, output).await?;
                info!(source = %single.display(), output = %output.display(), "Copied single PDF to output");
                Ok(MergeOutcome::Written(output.to_path_buf()))
            }
            _ => {
                self.toolkit.merge(files, output).await?;
                Ok(MergeOutcome::Written(output.to_path_buf()))
            }
        }
    }
}
