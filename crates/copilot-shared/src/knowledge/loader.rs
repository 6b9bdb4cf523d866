//! Document loader - reads a directory tree of knowledge files.

use html2text::render::text_renderer::TrivialDecorator;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{CopilotError, Result};

/// File extensions picked up by the loader
const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "html", "htm", "pdf"];

/// A loaded source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path relative to the data directory, unique per document
    pub id: String,
    /// File name, reported as the evidence source
    pub source_id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            text: text.into(),
        }
    }
}

/// Load every supported file under `dir`, sorted by path.
///
/// Unreadable files are skipped with a warning; a missing directory is an error.
pub fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    if !dir.is_dir() {
        return Err(CopilotError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("data directory not found: {}", dir.display()),
        )));
    }

    let mut docs = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            debug!("Skipping unsupported file: {}", path.display());
            continue;
        }

        let Some(text) = read_text(path, &ext) else {
            continue;
        };

        if text.trim().is_empty() {
            continue;
        }

        let id = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();
        let source_id = entry.file_name().to_string_lossy().to_string();

        docs.push(Document::new(id, source_id, text));
    }

    Ok(docs)
}

/// Wrap width handed to html2text
const HTML_TEXT_WIDTH: usize = 100;

/// Extract plain text from one file; `None` when it cannot be read or parsed.
fn read_text(path: &Path, ext: &str) -> Option<String> {
    let extracted = match ext {
        "pdf" => pdf_extract::extract_text(path).map_err(|e| e.to_string()),
        "html" | "htm" => fs::read(path)
            .map(|raw| html_to_text(&raw))
            .map_err(|e| e.to_string()),
        _ => fs::read_to_string(path).map_err(|e| e.to_string()),
    };

    match extracted {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            None
        }
    }
}

/// Convert HTML to clean text: entities decoded, markup dropped, blank
/// lines removed.
fn html_to_text(html: &[u8]) -> String {
    let text = html2text::from_read_with_decorator(html, HTML_TEXT_WIDTH, TrivialDecorator::new());

    text.lines()
        .map(|line| {
            line.replace('\u{2011}', "-")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
