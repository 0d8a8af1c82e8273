//! Document loading.
//!
//! Turns files on disk into [`SourceDocument`]s made of page-level text.
//! PDFs are read page by page with `lopdf`; plain-text files use the
//! form-feed character as a page break.

use crate::types::{Page, SkippedDocument, SourceDocument};
use docchat_core::{AppError, AppResult, LoadPolicy};
use std::path::{Path, PathBuf};

/// Page separator for plain-text documents.
const FORM_FEED: char = '\x0C';

/// Supported document kinds, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "text" => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// Documents that loaded plus those skipped under [`LoadPolicy::SkipAndReport`].
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub documents: Vec<SourceDocument>,
    pub skipped: Vec<SkippedDocument>,
}

/// Identifier recorded on every chunk of a document: its file name.
pub fn source_id_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load a single document.
///
/// # Errors
/// `AppError::Load` when the file is missing, unreadable, of an unsupported
/// type, corrupted, or has no extractable text.
pub fn load_document(path: &Path) -> AppResult<SourceDocument> {
    let document = read_document(path)?;
    if !document.has_text() {
        return Err(AppError::load(
            &document.source_id,
            "document contains no extractable text",
        ));
    }
    Ok(document)
}

fn read_document(path: &Path) -> AppResult<SourceDocument> {
    let source_id = source_id_for(path);

    if !path.is_file() {
        return Err(AppError::load(&source_id, "file not found"));
    }

    let kind = DocumentKind::from_path(path).ok_or_else(|| {
        AppError::load(
            &source_id,
            "unsupported document type (expected .pdf, .txt or .text)",
        )
    })?;

    let pages = match kind {
        DocumentKind::Pdf => load_pdf_pages(path, &source_id)?,
        DocumentKind::PlainText => load_text_pages(path, &source_id)?,
    };

    let document = SourceDocument::new(source_id, pages);
    tracing::debug!(
        source_id = %document.source_id,
        pages = document.pages.len(),
        stage = "load",
        "Loaded document"
    );

    Ok(document)
}

/// Load every path independently, then apply `policy`.
///
/// A failure on one document never stops the others from being read. With
/// [`LoadPolicy::AbortAll`] the first failure (in input order) is returned;
/// with [`LoadPolicy::SkipAndReport`] failures are reported in the outcome.
///
/// A readable document without text is not a failure here: it is kept and
/// contributes no chunks, so a batch of only such documents ends in
/// `AppError::EmptyIndex` at indexing time.
pub fn load_all(paths: &[PathBuf], policy: LoadPolicy) -> AppResult<LoadOutcome> {
    let mut outcome = LoadOutcome::default();
    let mut first_error = None;

    for path in paths {
        match read_document(path) {
            Ok(document) => {
                if !document.has_text() {
                    tracing::warn!(
                        source_id = %document.source_id,
                        stage = "load",
                        "Document contains no extractable text"
                    );
                }
                outcome.documents.push(document);
            }
            Err(err) => {
                tracing::warn!(
                    source_id = %source_id_for(path),
                    stage = err.stage(),
                    error = %err,
                    "Failed to load document"
                );
                outcome.skipped.push(SkippedDocument {
                    source_id: source_id_for(path),
                    reason: load_reason(&err),
                });
                first_error.get_or_insert(err);
            }
        }
    }

    match (policy, first_error) {
        (LoadPolicy::AbortAll, Some(err)) => Err(err),
        _ => Ok(outcome),
    }
}

fn load_reason(err: &AppError) -> String {
    match err {
        AppError::Load { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

fn load_pdf_pages(path: &Path, source_id: &str) -> AppResult<Vec<Page>> {
    let document = lopdf::Document::load(path)
        .map_err(|e| AppError::load(source_id, format!("unreadable PDF: {}", e)))?;

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Err(AppError::load(source_id, "PDF has no pages"));
    }

    let pages = page_numbers
        .iter()
        .enumerate()
        .map(|(index, page_no)| {
            let text = document.extract_text(&[*page_no]).unwrap_or_else(|e| {
                // Image-only or malformed pages contribute no text
                tracing::debug!(source_id, page = index, error = %e, "No text on PDF page");
                String::new()
            });
            Page {
                page_number: index,
                text: normalize_text(&text),
            }
        })
        .collect();

    Ok(pages)
}

fn load_text_pages(path: &Path, source_id: &str) -> AppResult<Vec<Page>> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::load(source_id, format!("unreadable file: {}", e)))?;
    let contents = String::from_utf8(bytes)
        .map_err(|_| AppError::load(source_id, "file is not valid UTF-8 text"))?;

    Ok(split_text_pages(&contents))
}

/// Split plain text into pages on form feeds.
pub fn split_text_pages(contents: &str) -> Vec<Page> {
    normalize_text(contents)
        .split(FORM_FEED)
        .enumerate()
        .map(|(page_number, text)| Page {
            page_number,
            text: text.to_string(),
        })
        .collect()
}

fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n")
}
