//! Human-readable span coordinates for diagnostic rendering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A [`Span`](crate::Span) resolved to path + 1-based line/column coordinates.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ResolvedSpan {
    /// Path of the file containing the span.
    pub file_path: PathBuf,
    /// 1-based line of the first byte.
    pub start_line: u32,
    /// 1-based column of the first byte.
    pub start_col: u32,
    /// 1-based line of the last byte.
    pub end_line: u32,
    /// 1-based column of the last byte.
    pub end_col: u32,
}

impl fmt::Display for ResolvedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file_path.display(),
            self.start_line,
            self.start_col
        )
    }
}
