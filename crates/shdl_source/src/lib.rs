//! Source file management and span tracking for diagnostics.
//!
//! The [`SourceDb`] owns the text of every `.shdl` file loaded during a
//! compilation, hands out [`FileId`]s, and resolves [`Span`] byte ranges to
//! human-readable [`ResolvedSpan`] line/column coordinates when diagnostics
//! are rendered.

#![warn(missing_docs)]

pub mod file_id;
pub mod resolved_span;
pub mod source_db;
pub mod source_file;
pub mod span;

pub use file_id::FileId;
pub use resolved_span::ResolvedSpan;
pub use source_db::SourceDb;
pub use source_file::SourceFile;
pub use span::Span;
