use anyhow::Result;
use clap::{Parser, ValueEnum};
use colored::*;
use pdf_extractor::{
    load_config, ChromiumRenderer, Extractor, HtmlRenderer, NativeToolkit, Overrides, PdfOptions,
    PdfToolkit, Pdftk, ResolvedPaths, ScriptRenderer,
};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-extractor")]
#[command(about = "Extract selected pages from PDF and optionally prepend Markdown intro")]
#[command(version)]
struct Args {
    /// YAML file with page configuration
    #[arg(short = 'y', long = "yaml", default_value = "../resources/config.yaml")]
    yaml: PathBuf,

    /// Input PDF file (overrides `file` from the config)
    #[arg(short = 'i', long = "input")]
    input: Option<OsString>,

    /// Output PDF file (overrides `output` from the config)
    #[arg(short = 'o', long = "output")]
    output: Option<OsString>,

    /// Markdown file to prepend (overrides `appendFirstPage` from the config)
    #[arg(short = 'm', long = "markdown")]
    markdown: Option<OsString>,

    /// How Markdown HTML is printed to PDF
    #[arg(long, value_enum, default_value_t = RendererKind::Script)]
    renderer: RendererKind,

    /// Render script invoked as `<node> <script> <html> <pdf>`
    #[arg(long, env = "PDF_EXTRACTOR_RENDER_SCRIPT", default_value = "../puppeteer_render.js")]
    render_script: PathBuf,

    /// Interpreter for the render script
    #[arg(long, env = "PDF_EXTRACTOR_NODE", default_value = "node")]
    node: PathBuf,

    /// Backend used to extract and merge pages
    #[arg(long, value_enum, default_value_t = ToolkitKind::Pdftk)]
    toolkit: ToolkitKind,

    /// pdftk executable
    #[arg(long, env = "PDF_EXTRACTOR_PDFTK", default_value = "pdftk")]
    pdftk: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RendererKind {
    /// External script (puppeteer)
    Script,
    /// Headless Chromium driven in-process
    Chromium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ToolkitKind {
    /// The pdftk command line tool
    Pdftk,
    /// Built-in lopdf implementation
    Native,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            input: self.input.clone().map(PathBuf::from),
            output: self.output.clone().map(PathBuf::from),
            markdown: self.markdown.clone().map(PathBuf::from),
        }
    }

    fn renderer(&self) -> Box<dyn HtmlRenderer> {
        match self.renderer {
            RendererKind::Script => Box::new(ScriptRenderer::node(&self.node, &self.render_script)),
            RendererKind::Chromium => Box::new(ChromiumRenderer::new(PdfOptions::default())),
        }
    }

    fn toolkit(&self) -> Box<dyn PdfToolkit> {
        match self.toolkit {
            ToolkitKind::Pdftk => Box::new(Pdftk::system(&self.pdftk)),
            ToolkitKind::Native => Box::new(NativeToolkit),
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args.yaml)?;
    let paths = ResolvedPaths::resolve(&args.yaml, &config, &args.overrides())?;

    if !paths.input.exists() {
        eprintln!("{}", format!("Error: '{}' not found.", paths.input.display()).red());
        return Ok(());
    }

    let pages = config.selected_pages();
    info!(?pages, input = %paths.input.display(), "Selected pages");

    let extractor = Extractor::new(args.renderer(), args.toolkit());
    extractor.run(&paths, &pages).await?;

    println!("Saved to: {}", paths.output.display().to_string().green());
    Ok(())
}

fn init_tracing() {
    // chromiumoxide logs every unknown CDP message, keep it quiet
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("pdf_extractor=info,chromiumoxide::conn=off,chromiumoxide::handler=off")
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version also arrive here
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    if let Err(e) = run(args).await {
        error!(error = %e, "Run failed");
        eprintln!("{}", format!("Error: {}", e).red());
        process::exit(1);
    }
}
