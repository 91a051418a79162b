use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures_util::StreamExt;
use pulldown_cmark::{html, Options, Parser};
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info};
use url::Url;

#[cfg(test)]
use mockall::automock;

use crate::error::{ExtractorError, Result};
use crate::process::{os_args, ExternalProcess, SystemProcess};

const STYLE: &str = r#"
body { font-family: Helvetica, Arial, sans-serif; margin: 2em; }
h1, h2, h3, h4 { color: #2a4d7c; }
table { border-collapse: collapse; width: 100%; margin-bottom: 1em; }
th, td { border: 1px solid #888; padding: 0.5em; text-align: left; }
th { background: #d5e4f3; }
code { background: #eee; padding: 2px 4px; border-radius: 4px; }
pre { background: #f4f4f4; padding: 1em; border-radius: 4px; }
ul { margin: 1em 0; padding-left: 2em; }
li { margin: 0.5em 0; }
"#;

/// Turns an HTML file on disk into a PDF file on disk.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HtmlRenderer: Send + Sync {
    async fn render_pdf(&self, html_path: &Path, pdf_path: &Path) -> Result<()>;
}

/// Markdown body rendered to an HTML fragment (tables and strikethrough enabled).
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut fragment = String::new();
    html::push_html(&mut fragment, parser);
    fragment
}

/// Full HTML page with the fixed stylesheet around `fragment`.
pub fn html_document(fragment: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        STYLE, fragment
    )
}

/// Renders the markdown file at `markdown_path` and returns the PDF bytes.
///
/// The HTML and PDF scratch files are removed on return, whether rendering
/// succeeded or not.
pub async fn render_markdown(markdown_path: &Path, renderer: &dyn HtmlRenderer) -> Result<Vec<u8>> {
    info!(path = %markdown_path.display(), "Rendering markdown");

    let markdown = fs::read_to_string(markdown_path).await.map_err(|e| {
        error!(error = ?e, path = %markdown_path.display(), "Failed to read markdown file");
        ExtractorError::Render(format!(
            "failed to read markdown file '{}': {}",
            markdown_path.display(),
            e
        ))
    })?;

    let document = html_document(&markdown_to_html(&markdown));

    let html_file = tempfile::Builder::new()
        .prefix("pdf-extractor")
        .suffix(".html")
        .tempfile()?;
    let pdf_file = tempfile::Builder::new()
        .prefix("pdf-extractor")
        .suffix(".pdf")
        .tempfile()?;

    fs::write(html_file.path(), document).await?;
    renderer.render_pdf(html_file.path(), pdf_file.path()).await?;

    let bytes = fs::read(pdf_file.path()).await?;
    if bytes.is_empty() {
        return Err(ExtractorError::Render(format!(
            "renderer produced no output for '{}'",
            markdown_path.display()
        )));
    }

    debug!(size = bytes.len(), "Markdown rendered to PDF");
    Ok(bytes)
}

/// Runs an external script as `<program> <script> <html> <pdf>`.
pub struct ScriptRenderer<P = SystemProcess> {
    process: P,
}

impl ScriptRenderer<SystemProcess> {
    pub fn node(node: impl Into<std::path::PathBuf>, script: impl AsRef<std::ffi::OsStr>) -> Self {
        Self::new(SystemProcess::new(node).with_prefix_arg(script))
    }
}

impl<P: ExternalProcess> ScriptRenderer<P> {
    pub fn new(process: P) -> Self {
        Self { process }
    }
}

#[async_trait]
impl<P: ExternalProcess> HtmlRenderer for ScriptRenderer<P> {
    async fn render_pdf(&self, html_path: &Path, pdf_path: &Path) -> Result<()> {
        let output = self.process.run(&os_args([html_path, pdf_path])).await?;
        if !output.success() {
            error!(summary = %output.failure_summary(), "Render script failed");
            return Err(ExtractorError::Render(output.failure_summary()));
        }
        Ok(())
    }
}

/// Page geometry for [`ChromiumRenderer`], in inches.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub scale: f64,
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
}

impl Default for PdfOptions {
    /// A4 in inches, no page margins; the stylesheet adds its own.
    fn default() -> Self {
        Self {
            scale: 1.0,
            paper_width: 8.27,
            paper_height: 11.69,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
        }
    }
}

/// Prints the HTML with a headless Chromium started in-process.
#[derive(Debug, Clone, Default)]
pub struct ChromiumRenderer {
    pdf_options: PdfOptions,
}

impl ChromiumRenderer {
    pub fn new(pdf_options: PdfOptions) -> Self {
        Self { pdf_options }
    }

    async fn print(&self, browser: &Browser, html_path: &Path, pdf_path: &Path) -> Result<()> {
        let url = Url::from_file_path(html_path).map_err(|_| {
            ExtractorError::Render(format!("'{}' is not an absolute path", html_path.display()))
        })?;

        let page = browser
            .new_page(url.as_str())
            .await
            .map_err(|e| ExtractorError::Render(format!("Failed to open {}: {}", url, e)))?;

        page.wait_for_navigation()
            .await
            .map_err(|e| ExtractorError::Render(format!("Failed to wait for navigation: {}", e)))?;

        let params = PrintToPdfParams {
            scale: Some(self.pdf_options.scale),
            paper_width: Some(self.pdf_options.paper_width),
            paper_height: Some(self.pdf_options.paper_height),
            margin_top: Some(self.pdf_options.margin_top),
            margin_right: Some(self.pdf_options.margin_right),
            margin_bottom: Some(self.pdf_options.margin_bottom),
            margin_left: Some(self.pdf_options.margin_left),
            print_background: Some(true),
            ..Default::default()
        };

        let pdf_data = page
            .pdf(params)
            .await
            .map_err(|e| ExtractorError::Render(format!("Failed to generate PDF: {}", e)))?;

        fs::write(pdf_path, pdf_data).await?;
        Ok(())
    }
}

#[async_trait]
impl HtmlRenderer for ChromiumRenderer {
    async fn render_pdf(&self, html_path: &Path, pdf_path: &Path) -> Result<()> {
        let config = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .build()
            .map_err(|e| ExtractorError::Render(format!("Failed to create browser config: {}", e)))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ExtractorError::Render(format!("Failed to launch browser: {}", e)))?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!("Chrome protocol message ignored: {}", err);
                }
            }
        });

        let result = self.print(&browser, html_path, pdf_path).await;

        browser.close().await.ok();
        handle.abort();

        result
    }
}
