//! Source documents for bulk import.
//!
//! A translation is one JSON file named `<translation>.json`:
//!
//! ```json
//! {"books": [{"name": "Genesis", "chapters": [{"chapter": 1, "name": "Genesis 1",
//!   "verses": [{"verse": 1, "name": "Genesis 1:1", "text": "In the beginning..."}]}]}]}
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Error;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BibleDocument {
    #[serde(default)]
    pub books: Vec<BookRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub name: String,
    #[serde(default)]
    pub chapters: Vec<ChapterRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub chapter: i64,
    pub name: String,
    #[serde(default)]
    pub verses: Vec<VerseRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseRecord {
    pub verse: i64,
    pub name: String,
    pub text: String,
}

impl BibleDocument {
    pub fn verse_count(&self) -> usize {
        self.books
            .iter()
            .flat_map(|b| &b.chapters)
            .map(|c| c.verses.len())
            .sum()
    }
}

/// A document found on disk, tagged with the translation it provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub translation: String,
    pub path: PathBuf,
}

/// Lists `*.json` files directly under `data_dir`, sorted by path. The file
/// stem is the translation tag. A missing directory or one without JSON
/// files is `NotFound`; scan failures are `Operation` errors.
pub fn discover_sources(data_dir: &Path) -> crate::error::Result<Vec<SourceFile>> {
    if !data_dir.exists() {
        return Err(Error::NotFound(format!("data directory {}", data_dir.display())));
    }
    let mut sources = Vec::new();
    for entry in walkdir::WalkDir::new(data_dir).max_depth(1) {
        let entry = entry.map_err(|e| Error::Operation(format!("scanning {}: {e}", data_dir.display())))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem() {
            sources.push(SourceFile { translation: stem.to_string_lossy().to_string(), path: path.to_path_buf() });
        }
    }
    if sources.is_empty() {
        return Err(Error::NotFound(format!("JSON source files in {}", data_dir.display())));
    }
    sources.sort_by(|a, b| a.path.cmp(&b.path));
    info!(count = sources.len(), dir = %data_dir.display(), "discovered source documents");
    Ok(sources)
}

pub fn read_document(path: &Path) -> Result<BibleDocument> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON document {}", path.display()))
}
