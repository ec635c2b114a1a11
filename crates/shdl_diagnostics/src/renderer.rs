//! Rendering diagnostics for the terminal.

use crate::diagnostic::Diagnostic;
use crate::label::LabelStyle;
use shdl_source::SourceDb;

/// Formats diagnostics into strings for some output target.
pub trait DiagnosticRenderer {
    /// Renders one diagnostic.
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String;
}

/// rustc-style terminal output:
///
/// ```text
/// error[E0503]: signal 'x.A' has multiple drivers
///   --> adder.shdl:14:9
///    |
/// 14 |     B -> x.A;
///    |          ^^^ driven again here
///    |
///    = note: first driven at adder.shdl:12:9
/// ```
pub struct TerminalRenderer {
    /// Emit ANSI colors.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "{}[{}]: {}\n",
            diag.severity, diag.code, diag.message
        ));

        if !diag.primary_span.is_dummy() {
            let resolved = source_db.resolve_span(diag.primary_span);
            out.push_str(&format!("  --> {resolved}\n"));

            let file = source_db.get_file(diag.primary_span.file);
            let (line, col) = file.line_col(diag.primary_span.start);
            let line_num = line.to_string();
            let padding = " ".repeat(line_num.len());
            let line_content = source_line(&file.content, diag.primary_span.start);

            out.push_str(&format!("{padding} |\n"));
            out.push_str(&format!("{line_num} | {line_content}\n"));

            let span_len = (diag.primary_span.end - diag.primary_span.start).max(1) as usize;
            let carets = "^".repeat(span_len);
            let col_padding = " ".repeat((col as usize).saturating_sub(1));
            let primary_msg = diag
                .labels
                .iter()
                .find(|l| l.style == LabelStyle::Primary)
                .map(|l| format!(" {}", l.message))
                .unwrap_or_default();

            out.push_str(&format!("{padding} | {col_padding}{carets}{primary_msg}\n"));
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }

        out
    }
}

/// The full source line containing `byte_offset`.
fn source_line(content: &str, byte_offset: u32) -> &str {
    let offset = byte_offset as usize;
    let start = content[..offset].rfind('\n').map_or(0, |pos| pos + 1);
    let end = content[offset..]
        .find('\n')
        .map_or(content.len(), |pos| offset + pos);
    &content[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::codes;
    use crate::label::Label;
    use shdl_source::Span;

    #[test]
    fn renders_span_and_caret() {
        let mut db = SourceDb::new();
        let file = db.add_source("ha.shdl", "A -> x.Q;\n".to_string());
        let span = Span::new(file, 5, 8);
        let diag = Diagnostic::error(codes::UNKNOWN_PORT, "no port 'Q' on AND", span)
            .with_label(Label::primary(span, "valid ports: A, B, O"));

        let out = TerminalRenderer::new(false).render(&diag, &db);
        assert!(out.contains("error[E0304]: no port 'Q' on AND"));
        assert!(out.contains("--> ha.shdl:1:6"));
        assert!(out.contains("A -> x.Q;"));
        assert!(out.contains("^^^ valid ports: A, B, O"));
    }

    #[test]
    fn renders_notes_and_help() {
        let db = SourceDb::new();
        let diag = Diagnostic::warning(codes::UNUSED_IMPORT, "unused import", Span::DUMMY)
            .with_note("'FullAdder' is imported but never instantiated")
            .with_help("remove the import");
        let out = TerminalRenderer::new(false).render(&diag, &db);
        assert!(out.contains("warning[W0104]: unused import"));
        assert!(out.contains("= note: 'FullAdder'"));
        assert!(out.contains("= help: remove the import"));
    }

    #[test]
    fn dummy_span_has_no_location() {
        let db = SourceDb::new();
        let diag = Diagnostic::error(codes::MODULE_NOT_FOUND, "no module 'gates'", Span::DUMMY);
        let out = TerminalRenderer::new(false).render(&diag, &db);
        assert!(!out.contains("-->"));
    }
}
