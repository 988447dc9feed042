//! Turns a data directory into indexable documents.
//!
//! `.txt` files are split into paragraph chunks (long paragraphs are
//! word-windowed with overlap); `.json` files hold pre-extracted chunks
//! (text sections, captioned images, tables) and deserialize directly into
//! [`Document`]s.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::{Document, Metadata};

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
    pub overlap_percent: f32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_tokens: 500, overlap_percent: 0.2 }
    }
}

#[derive(Default)]
pub struct DataProcessor {
    chunking: ChunkingConfig,
}

impl DataProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(chunking: ChunkingConfig) -> Self {
        Self { chunking }
    }

    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<Document>> {
        let files = list_data_files(data_dir);
        if files.is_empty() {
            info!("no .txt or .json files found under {}", data_dir.display());
            return Ok(vec![]);
        }
        let mut all_docs = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            debug!("processing file {}/{}: {}", file_index + 1, files.len(), file_path.display());
            match file_path.extension().and_then(|s| s.to_str()) {
                Some("txt") => {
                    let content = read_file_content(file_path)?;
                    all_docs.extend(self.chunk_text_file(&content, file_path));
                }
                Some("json") => all_docs.extend(load_prepared_documents(file_path)?),
                _ => {}
            }
        }
        info!("processed {} files into {} documents", files.len(), all_docs.len());
        Ok(all_docs)
    }

    fn chunk_text_file(&self, content: &str, file_path: &Path) -> Vec<Document> {
        let title = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let filename = file_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut docs = Vec::new();
        for paragraph in content.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            if count_tokens(paragraph) as usize <= self.chunking.max_tokens {
                docs.push(self.make_text_document(paragraph, &title, &filename));
            } else {
                for piece in self.split_paragraph_with_overlap(paragraph) {
                    docs.push(self.make_text_document(&piece, &title, &filename));
                }
            }
        }
        docs
    }

    fn make_text_document(&self, content: &str, title: &str, filename: &str) -> Document {
        let mut doc = Document::text(content).with_title(title);
        doc.token_count = count_tokens(content);
        doc.metadata = Metadata { filename: Some(filename.to_string()), ..Metadata::default() };
        doc
    }

    fn split_paragraph_with_overlap(&self, paragraph: &str) -> Vec<String> {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        let words_per_chunk = 300;
        let overlap_words = (words_per_chunk as f32 * self.chunking.overlap_percent) as usize;
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + words_per_chunk).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end >= words.len() {
                break;
            }
            start = end - overlap_words;
        }
        chunks
    }
}

/// Word-count heuristic (one token per 0.75 words). The count only feeds
/// display and chunk sizing, so a model tokenizer would be overkill here.
#[must_use]
pub fn count_tokens(text: &str) -> u32 {
    let word_count = text.split_whitespace().count();
    (word_count as f32 / 0.75) as u32
}

/// Load pre-extracted documents from a JSON file holding either one
/// document object or an array of them. Missing token counts are recomputed
/// from the content.
pub fn load_prepared_documents(file_path: &Path) -> Result<Vec<Document>> {
    let raw = fs::read_to_string(file_path)?;
    let mut docs: Vec<Document> = match serde_json::from_str::<Vec<Document>>(&raw) {
        Ok(docs) => docs,
        Err(_) => vec![serde_json::from_str::<Document>(&raw)?],
    };
    for doc in &mut docs {
        if doc.token_count == 0 {
            doc.token_count = count_tokens(&doc.content);
        }
        if doc.metadata.filename.is_none() {
            doc.metadata.filename =
                file_path.file_name().map(|s| s.to_string_lossy().to_string());
        }
    }
    Ok(docs)
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
    }
}

fn list_data_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if matches!(path.extension().and_then(|s| s.to_str()), Some("txt" | "json")) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}
