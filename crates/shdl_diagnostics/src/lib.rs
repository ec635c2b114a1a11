//! Diagnostic creation, accumulation, and rendering.
//!
//! Compiler stages report user-facing problems as structured [`Diagnostic`]
//! values carrying a [`DiagnosticCode`] from the SHDL taxonomy (`E01xx` lex …
//! `E08xx` constant, `W01xx` warnings), a severity, a primary source span,
//! and optional labels, notes, help text, and fixes. The thread-safe
//! [`DiagnosticSink`] accumulates them; [`TerminalRenderer`] formats them
//! rustc-style against the source database.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod label;
pub mod renderer;
pub mod severity;
pub mod sink;
pub mod suggested_fix;

pub use code::{codes, Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use label::{Label, LabelStyle};
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
pub use suggested_fix::{Replacement, SuggestedFix};
