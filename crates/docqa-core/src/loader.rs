//! Document loading: text extraction for `.pdf` / `.txt` and chunking.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;
use std::process::Command;

use crate::error::Error;
use crate::splitter::{ChunkingConfig, RecursiveSplitter};
use crate::types::Chunk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    /// Classify by extension (case-insensitive). Content is never inspected.
    pub fn from_path(path: &Path) -> std::result::Result<Self, Error> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "txt" => Ok(Self::Text),
            _ => Err(Error::UnsupportedFileType(if ext.is_empty() {
                path.display().to_string()
            } else {
                format!(".{ext}")
            })),
        }
    }
}

/// Extract the raw text of a document. Image-only PDFs give an empty string.
pub fn load_text(path: &Path) -> Result<String> {
    match DocumentKind::from_path(path)? {
        DocumentKind::Pdf => extract_pdf_text(path),
        DocumentKind::Text => read_text_file(path),
    }
}

/// Load a document and split it into ordered chunks.
pub fn load_and_split(path: &Path, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    let text = load_text(path)?;
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let pieces = RecursiveSplitter::new(*config).split(&text);
    let total_chunks = pieces.len();
    tracing::debug!(source = %source, chars = text.chars().count(), chunks = total_chunks, "split document");
    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(chunk_index, content)| Chunk { content, source: source.clone(), chunk_index, total_chunks })
        .collect())
}

fn read_text_file(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

/// lopdf first; any failure there falls back to poppler's `pdftotext`.
fn extract_pdf_text(path: &Path) -> Result<String> {
    match extract_with_lopdf(path) {
        Ok(text) => Ok(text),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "lopdf extraction failed, falling back to pdftotext");
            extract_with_pdftotext(path).with_context(|| {
                format!("lopdf could not read {} ({e}) and the pdftotext fallback failed", path.display())
            })
        }
    }
}

fn extract_with_lopdf(path: &Path) -> Result<String> {
    let doc = lopdf::Document::load(path)?;
    let mut text = String::new();
    for page_num in doc.get_pages().keys() {
        let page_text = doc
            .extract_text(&[*page_num])
            .map_err(|e| anyhow!("failed to extract text from page {page_num}: {e}"))?;
        text.push_str(&page_text);
    }
    Ok(text)
}

fn extract_with_pdftotext(path: &Path) -> Result<String> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg(path)
        .arg("-")
        .output()
        .map_err(|e| anyhow!("pdftotext command failed: {e} (is poppler installed?)"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("pdftotext failed: {}", stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
