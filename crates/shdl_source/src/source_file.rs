//! A single loaded source file with a line-start index.

use crate::file_id::FileId;
use shdl_common::ContentHash;
use std::path::PathBuf;

/// One loaded `.shdl` file.
///
/// Line starts are computed once at load time so diagnostic rendering can
/// binary-search byte offsets into 1-based line/column pairs.
pub struct SourceFile {
    /// The id assigned by the [`SourceDb`](crate::SourceDb).
    pub id: FileId,
    /// Filesystem path, or a synthetic name for in-memory sources.
    pub path: PathBuf,
    /// The full file text.
    pub content: String,
    /// XXH3 hash of `content`.
    pub content_hash: ContentHash,
    /// Byte offset of each line start; always begins with 0.
    line_starts: Vec<u32>,
}

impl SourceFile {
    /// Builds a `SourceFile`, computing line starts and the content hash.
    pub fn new(id: FileId, path: PathBuf, content: String) -> Self {
        let line_starts = line_starts(&content);
        let content_hash = ContentHash::from_bytes(content.as_bytes());
        Self {
            id,
            path,
            content,
            content_hash,
            line_starts,
        }
    }

    /// Converts a byte offset into 1-based `(line, column)` coordinates.
    pub fn line_col(&self, byte_offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line = line_idx as u32 + 1;
        let col = byte_offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Returns the text between two byte offsets.
    pub fn snippet(&self, start: u32, end: u32) -> &str {
        &self.content[start as usize..end as usize]
    }
}

fn line_starts(content: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, byte) in content.bytes().enumerate() {
        if byte == b'\n' {
            starts.push((i + 1) as u32);
        }
    }
    starts
}
