//! The structured diagnostic value.

use crate::code::DiagnosticCode;
use crate::label::Label;
use crate::severity::Severity;
use crate::suggested_fix::SuggestedFix;
use serde::{Deserialize, Serialize};
use shdl_source::Span;

/// A single problem report: severity, code, message, primary span, and any
/// number of labels, notes, help lines, and an optional fix.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,
    /// Taxonomy code (`E0503`, `W0104`, …).
    pub code: DiagnosticCode,
    /// The main message.
    pub message: String,
    /// Where the problem was detected.
    pub primary_span: Span,
    /// Extra annotated spans.
    pub labels: Vec<Label>,
    /// `note:` footers.
    pub notes: Vec<String>,
    /// `help:` footers.
    pub help: Vec<String>,
    /// A machine-applicable fix, when one exists.
    pub fix: Option<SuggestedFix>,
}

impl Diagnostic {
    /// An error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Error, code, message, span)
    }

    /// A warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Warning, code, message, span)
    }

    fn new(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            primary_span: span,
            labels: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
            fix: None,
        }
    }

    /// Adds a label.
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Adds a note line.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help line.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }

    /// Attaches a suggested fix.
    pub fn with_fix(mut self, fix: SuggestedFix) -> Self {
        self.fix = Some(fix);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::codes;

    #[test]
    fn error_constructor() {
        let d = Diagnostic::error(codes::MULTIPLE_DRIVERS, "two drivers on x.A", Span::DUMMY);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(format!("{}", d.code), "E0503");
        assert_eq!(d.message, "two drivers on x.A");
    }

    #[test]
    fn warning_constructor() {
        let d = Diagnostic::warning(codes::UNUSED_CONSTANT, "constant 'K' never read", Span::DUMMY);
        assert_eq!(d.severity, Severity::Warning);
        assert!(d.labels.is_empty());
    }

    #[test]
    fn builder_chain() {
        let d = Diagnostic::error(codes::WIDTH_MISMATCH, "widths differ", Span::DUMMY)
            .with_label(Label::primary(Span::DUMMY, "4 bits"))
            .with_label(Label::secondary(Span::DUMMY, "8 bits"))
            .with_note("source and destination slices must match")
            .with_help("widen the destination slice");
        assert_eq!(d.labels.len(), 2);
        assert_eq!(d.notes.len(), 1);
        assert_eq!(d.help.len(), 1);
        assert!(d.fix.is_none());
    }

    #[test]
    fn fix_attachment() {
        let fix = SuggestedFix {
            message: "add explicit width".to_string(),
            replacements: vec![],
        };
        let d = Diagnostic::error(codes::CONSTANT_WIDTH, "index past width", Span::DUMMY)
            .with_fix(fix);
        assert_eq!(d.fix.unwrap().message, "add explicit width");
    }
}
