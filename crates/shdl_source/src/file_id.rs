//! Opaque identifier for loaded source files.

use serde::{Deserialize, Serialize};

/// Opaque identifier for a source file in the [`SourceDb`](crate::SourceDb).
///
/// Spans refer to their file through a `FileId` rather than a path, so
/// carrying a span around costs twelve bytes regardless of how deep the
/// import tree is.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    /// A sentinel for synthesized spans (flattener-generated instances and
    /// connections that have no single source location).
    pub const DUMMY: FileId = FileId(u32::MAX);

    /// Creates a `FileId` from a raw index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}
