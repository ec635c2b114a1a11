//! Front end for Expanded SHDL: tokens, lexer, AST, and parser.
//!
//! [`lexer::lex`] turns source text into spanned [`token::Token`]s, eliding
//! `#`-line and quote-string comments. [`parser::ShdlParser`] is a recursive
//! descent parser producing a [`ast::Module`]; parse errors are reported to
//! the diagnostic sink and recovered at statement boundaries so one pass can
//! surface many problems.

#![warn(missing_docs)]

pub mod ast;
mod decl;
mod expr;
pub mod lexer;
pub mod parser;
pub mod token;

use shdl_common::{Ident, Interner};
use shdl_diagnostics::DiagnosticSink;
use shdl_source::{FileId, SourceDb};

/// Lexes and parses one already-loaded source file into a [`ast::Module`].
///
/// The module's name is the file stem (`full_adder.shdl` → `full_adder`).
pub fn parse_file(
    file: FileId,
    source_db: &SourceDb,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> ast::Module {
    let src = source_db.get_file(file);
    let module_name = src
        .path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("<module>");
    let name = interner.get_or_intern(module_name);
    parse_source(&src.content, name, file, interner, sink)
}

/// Lexes and parses source text under an explicit module name.
pub fn parse_source(
    source: &str,
    name: Ident,
    file: FileId,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> ast::Module {
    let tokens = lexer::lex(source, file, sink);
    let mut parser = parser::ShdlParser::new(tokens, source, file, interner, sink);
    parser.parse_module(name)
}
