use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;
use tagscope_core::LineSource;
use tower_lsp::lsp_types::{Position, Url};

/// Lightweight container for open document state
pub struct Document {
    pub content: String,
    pub version: i32,
}

impl Document {
    pub fn new(content: String, version: i32) -> Self {
        Self { content, version }
    }

    pub fn line(&self, index: u32) -> Option<&str> {
        self.content.lines().nth(index as usize)
    }
}

/// Open buffers keyed by URI. Buffers are authoritative; files the
/// editor has not opened are read from disk on demand.
#[derive(Default)]
pub struct DocumentStore {
    docs: DashMap<Url, Arc<Document>>,
}

impl DocumentStore {
    pub fn open(&self, uri: Url, content: String, version: i32) {
        self.docs.insert(uri, Arc::new(Document::new(content, version)));
    }

    pub fn replace(&self, uri: Url, content: String, version: i32) {
        self.docs.insert(uri, Arc::new(Document::new(content, version)));
    }

    pub fn close(&self, uri: &Url) {
        self.docs.remove(uri);
    }

    pub fn get(&self, uri: &Url) -> Option<Arc<Document>> {
        self.docs.get(uri).map(|d| d.value().clone())
    }

    /// The identifier under the cursor, or None when the cursor sits on
    /// whitespace or punctuation.
    pub fn word_at(&self, uri: &Url, position: Position) -> Option<String> {
        let line = self.line_for_uri(uri, position.line)?;
        let byte_col = utf16_col_to_byte_col(&line, position.character as usize);
        word_at_byte_col(&line, byte_col)
    }

    fn line_for_uri(&self, uri: &Url, line: u32) -> Option<String> {
        if let Some(doc) = self.get(uri) {
            return doc.line(line).map(str::to_string);
        }
        let path = uri.to_file_path().ok()?;
        read_line_from_disk(&path, line)
    }
}

impl LineSource for DocumentStore {
    fn line_text(&self, path: &Path, line: u32) -> Option<String> {
        if let Ok(uri) = Url::from_file_path(path) {
            if let Some(doc) = self.get(&uri) {
                return doc.line(line).map(str::to_string);
            }
        }
        read_line_from_disk(path, line)
    }
}

fn read_line_from_disk(path: &Path, line: u32) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    content.lines().nth(line as usize).map(str::to_string)
}

fn utf16_col_to_byte_col(line: &str, utf16_col: usize) -> usize {
    let mut curr_utf16 = 0;
    let mut curr_byte = 0;
    for c in line.chars() {
        if curr_utf16 >= utf16_col {
            break;
        }
        curr_utf16 += c.len_utf16();
        curr_byte += c.len_utf8();
    }
    curr_byte
}

pub fn word_at_byte_col(line: &str, col: usize) -> Option<String> {
    // Identifier characters: alphanumeric + _ + $
    let is_ident = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
    let col = col.min(line.len());

    // The word starts just past the nearest non-identifier character,
    // which may be wider than one byte.
    let start = line[..col]
        .char_indices()
        .rev()
        .find(|&(_, c)| !is_ident(c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);

    let end = line[col..]
        .find(|c| !is_ident(c))
        .map(|i| i + col)
        .unwrap_or(line.len());

    if start < end {
        Some(line[start..end].to_string())
    } else {
        None
    }
}
