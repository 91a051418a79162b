use async_trait::async_trait;
use lopdf::{Document, Object, ObjectId};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info};

#[cfg(test)]
use mockall::automock;

use crate::error::{ExtractorError, Result};
use crate::process::{ExternalProcess, SystemProcess};

/// Page extraction and concatenation of PDF files.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PdfToolkit: Send + Sync {
    /// Writes the given 1-based `pages` of `input`, in order, to `output`.
    async fn extract(&self, input: &Path, pages: &[u32], output: &Path) -> Result<()>;

    /// Concatenates `inputs` in order into `output`.
    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;
}

/// `<input> cat <page>... output <output>`
pub fn extract_args(input: &Path, pages: &[u32], output: &Path) -> Vec<OsString> {
    let mut args = vec![input.as_os_str().to_os_string(), "cat".into()];
    args.extend(pages.iter().map(|p| OsString::from(p.to_string())));
    args.push("output".into());
    args.push(output.as_os_str().to_os_string());
    args
}

/// `<file>... cat output <output>`
pub fn merge_args(inputs: &[PathBuf], output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = inputs.iter().map(|p| p.as_os_str().to_os_string()).collect();
    args.push("cat".into());
    args.push("output".into());
    args.push(output.as_os_str().to_os_string());
    args
}

/// The `pdftk` command line tool.
pub struct Pdftk<P = SystemProcess> {
    process: P,
}

impl Pdftk<SystemProcess> {
    pub fn system(program: impl Into<PathBuf>) -> Self {
        Self::new(SystemProcess::new(program))
    }
}

impl<P: ExternalProcess> Pdftk<P> {
    pub fn new(process: P) -> Self {
        Self { process }
    }
}

#[async_trait]
impl<P: ExternalProcess> PdfToolkit for Pdftk<P> {
    async fn extract(&self, input: &Path, pages: &[u32], output: &Path) -> Result<()> {
        info!(input = %input.display(), ?pages, "Extracting pages with pdftk");
        let result = self.process.run(&extract_args(input, pages, output)).await?;
        if !result.success() {
            error!(summary = %result.failure_summary(), "pdftk extraction failed");
            return Err(ExtractorError::Extract(result.failure_summary()));
        }
        Ok(())
    }

    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        info!(files = inputs.len(), output = %output.display(), "Merging PDFs with pdftk");
        let result = self.process.run(&merge_args(inputs, output)).await?;
        if !result.success() {
            error!(summary = %result.failure_summary(), "pdftk merge failed");
            return Err(ExtractorError::Merge(result.failure_summary()));
        }
        Ok(())
    }
}

/// Extraction and merging done in-process with `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeToolkit;

#[async_trait]
impl PdfToolkit for NativeToolkit {
    async fn extract(&self, input: &Path, pages: &[u32], output: &Path) -> Result<()> {
        info!(input = %input.display(), ?pages, "Extracting pages");

        let data = fs::read(input).await.map_err(|e| {
            ExtractorError::Extract(format!("Failed to read PDF file {}: {}", input.display(), e))
        })?;
        let document = Document::load_mem(&data).map_err(|e| {
            ExtractorError::Extract(format!("Failed to parse PDF file {}: {}", input.display(), e))
        })?;

        let extracted = select_pages(document, pages).map_err(ExtractorError::Extract)?;
        write_document(extracted, output)
            .await
            .map_err(ExtractorError::Extract)
    }

    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        let mut merger = PdfMerger::new();
        for path in inputs {
            merger.add_pdf(path).await?;
        }
        merger.save(output).await
    }
}

/// Collects documents and writes them out as one.
pub struct PdfMerger {
    documents: Vec<(String, Document)>,
}

impl PdfMerger {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
        }
    }

    pub async fn add_pdf(&mut self, path: &Path) -> Result<()> {
        let data = fs::read(path).await.map_err(|e| {
            ExtractorError::Merge(format!("Failed to read PDF file {}: {}", path.display(), e))
        })?;

        let document = Document::load_mem(&data).map_err(|e| {
            ExtractorError::Merge(format!("Failed to parse PDF file {}: {}", path.display(), e))
        })?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.pdf")
            .to_string();

        debug!("Loaded PDF with {} pages from {}", document.get_pages().len(), path.display());
        self.documents.push((filename, document));

        Ok(())
    }

    pub async fn save(self, output_path: &Path) -> Result<()> {
        let count = self.documents.len();
        info!("Starting PDF merge process with {} documents", count);

        let merged = merge_documents(self.documents).map_err(ExtractorError::Merge)?;
        let pages = merged.get_pages().len();

        write_document(merged, output_path)
            .await
            .map_err(ExtractorError::Merge)?;

        info!("Merged {} PDFs ({} pages) into {}", count, pages, output_path.display());
        Ok(())
    }
}

impl Default for PdfMerger {
    fn default() -> Self {
        Self::new()
    }
}

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

fn pages_root(document: &Document) -> std::result::Result<ObjectId, String> {
    document
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| format!("document has no page tree: {}", e))
}

/// Copies inherited attributes onto the page itself so it can be moved
/// directly under another page tree node.
fn flatten_inherited(document: &mut Document, page_id: ObjectId) -> lopdf::Result<()> {
    let page = document.get_dictionary(page_id)?;
    let mut missing: Vec<&[u8]> = INHERITABLE.iter().copied().filter(|key| !page.has(key)).collect();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut inherited = Vec::new();

    while let Some(node_id) = parent {
        if missing.is_empty() {
            break;
        }
        let node = document.get_dictionary(node_id)?;
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                inherited.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    let page = document.get_dictionary_mut(page_id)?;
    for (key, value) in inherited {
        page.set(key, value);
    }
    Ok(())
}

/// Makes `kids` the only pages of the tree rooted at `root`.
fn set_kids(document: &mut Document, root: ObjectId, kids: &[ObjectId]) -> lopdf::Result<()> {
    for &kid in kids {
        document
            .get_dictionary_mut(kid)?
            .set("Parent", Object::Reference(root));
    }

    let pages = document.get_dictionary_mut(root)?;
    pages.set(
        "Kids",
        Object::Array(kids.iter().copied().map(Object::Reference).collect()),
    );
    pages.set("Count", Object::Integer(kids.len() as i64));
    Ok(())
}

/// Keeps only `pages` (1-based) of `document`, in the given order.
pub fn select_pages(mut document: Document, pages: &[u32]) -> std::result::Result<Document, String> {
    let page_ids = document.get_pages();
    let total = page_ids.len();

    let kids = pages
        .iter()
        .map(|page| {
            page_ids
                .get(page)
                .copied()
                .ok_or_else(|| format!("page {} is out of range (document has {} pages)", page, total))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let root = pages_root(&document)?;
    for &kid in &kids {
        flatten_inherited(&mut document, kid).map_err(|e| e.to_string())?;
    }
    set_kids(&mut document, root, &kids).map_err(|e| e.to_string())?;

    document.prune_objects();
    document.renumber_objects();
    debug!("Kept {} of {} pages", kids.len(), total);
    Ok(document)
}

/// Appends the pages of every document, in order, to the first one.
pub fn merge_documents(documents: Vec<(String, Document)>) -> std::result::Result<Document, String> {
    let mut documents = documents.into_iter();
    let (_, mut merged) = documents
        .next()
        .ok_or_else(|| "No PDFs added to merge".to_string())?;

    let root = pages_root(&merged)?;
    let mut all_page_ids: Vec<ObjectId> = merged.get_pages().into_values().collect();
    for &page_id in &all_page_ids {
        flatten_inherited(&mut merged, page_id).map_err(|e| e.to_string())?;
    }
    debug!("First document has {} pages", all_page_ids.len());

    let mut max_id = merged.max_id;

    for (i, (filename, mut document)) in documents.enumerate() {
        debug!(
            "Processing document {}: {} with {} pages",
            i + 2,
            filename,
            document.get_pages().len()
        );

        // Renumber objects to avoid conflicts
        document.renumber_objects_with(max_id + 1);
        max_id = document.max_id;

        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        for &page_id in &page_ids {
            flatten_inherited(&mut document, page_id)
                .map_err(|e| format!("{}: {}", filename, e))?;
        }

        merged.objects.extend(document.objects);
        all_page_ids.extend(page_ids);
    }

    merged.max_id = max_id;
    set_kids(&mut merged, root, &all_page_ids).map_err(|e| e.to_string())?;
    merged.prune_objects();
    merged.renumber_objects();

    info!("Total pages collected: {}", all_page_ids.len());
    Ok(merged)
}

async fn write_document(mut document: Document, output_path: &Path) -> std::result::Result<(), String> {
    let mut data = Vec::new();
    document
        .save_to(&mut data)
        .map_err(|e| format!("Failed to serialize PDF: {}", e))?;

    fs::write(output_path, data)
        .await
        .map_err(|e| format!("Failed to write PDF to {}: {}", output_path.display(), e))
}
