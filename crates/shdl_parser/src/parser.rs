//! Core parser infrastructure and top-level SHDL parsing rules.
//!
//! [`ShdlParser`] provides the primitive operations (advance, eat, expect)
//! and statement-boundary error recovery, plus the top-level rules: modules,
//! imports, component headers, and port lists. Body items live in `decl`,
//! signals and arithmetic in `expr`.

use crate::ast::*;
use crate::token::{ShdlToken, Token};
use shdl_common::{Ident, Interner};
use shdl_diagnostics::{codes, Diagnostic, DiagnosticCode, DiagnosticSink};
use shdl_source::{FileId, Span};

/// A recursive descent parser for SHDL source text.
///
/// Consumes a token stream from the lexer and builds a [`Module`]. Errors go
/// to the diagnostic sink; the parser recovers to the next `;` or block
/// boundary and keeps going, so a single pass reports many problems.
pub struct ShdlParser<'src> {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    pub(crate) source: &'src str,
    #[allow(dead_code)]
    file: FileId,
    pub(crate) interner: &'src Interner,
    pub(crate) sink: &'src DiagnosticSink,
}

impl<'src> ShdlParser<'src> {
    /// Creates a parser over `tokens` lexed from `source`.
    pub fn new(
        tokens: Vec<Token>,
        source: &'src str,
        file: FileId,
        interner: &'src Interner,
        sink: &'src DiagnosticSink,
    ) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            file,
            interner,
            sink,
        }
    }

    // ========================================================================
    // Primitive operations
    // ========================================================================

    pub(crate) fn current(&self) -> ShdlToken {
        self.tokens[self.pos].kind
    }

    pub(crate) fn current_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    pub(crate) fn current_text(&self) -> &'src str {
        let span = self.current_span();
        &self.source[span.start as usize..span.end as usize]
    }

    pub(crate) fn at(&self, kind: ShdlToken) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.current() == ShdlToken::Eof
    }

    pub(crate) fn prev_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            self.current_span()
        }
    }

    pub(crate) fn advance(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    /// Consumes the current token if it matches. Returns whether it did.
    pub(crate) fn eat(&mut self, kind: ShdlToken) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a token of the given kind or reports `code`.
    pub(crate) fn expect(&mut self, kind: ShdlToken, code: DiagnosticCode, what: &str) {
        if !self.eat(kind) {
            self.expected(code, what);
        }
    }

    /// Consumes `;`, reporting `E0202` when it is missing.
    pub(crate) fn expect_semicolon(&mut self) {
        if !self.eat(ShdlToken::Semicolon) {
            self.sink.emit(
                Diagnostic::error(codes::MISSING_SEMICOLON, "expected ';'", self.prev_span())
                    .with_help("statements end with a semicolon"),
            );
        }
    }

    /// Consumes and interns an identifier, or reports `E0206` and returns a
    /// placeholder.
    pub(crate) fn expect_ident(&mut self) -> Ident {
        if self.at(ShdlToken::Identifier) {
            let ident = self.interner.get_or_intern(self.current_text());
            self.advance();
            ident
        } else {
            self.expected(codes::EXPECTED_IDENTIFIER, "identifier");
            self.interner.get_or_intern("<missing>")
        }
    }

    /// Consumes an integer literal, converting decimal / `0x` / `0b` forms.
    /// Reports `E0201` and returns 0 when the current token is not a number.
    pub(crate) fn expect_int(&mut self) -> u64 {
        if !self.at(ShdlToken::IntLiteral) {
            self.expected(codes::UNEXPECTED_TOKEN, "integer literal");
            return 0;
        }
        let text = self.current_text();
        let value = parse_int_text(text).unwrap_or_else(|| {
            self.error(
                codes::UNEXPECTED_TOKEN,
                &format!("integer literal '{text}' does not fit in 64 bits"),
            );
            0
        });
        self.advance();
        value
    }

    // ========================================================================
    // Error handling and recovery
    // ========================================================================

    pub(crate) fn error(&self, code: DiagnosticCode, msg: &str) {
        self.sink
            .emit(Diagnostic::error(code, msg, self.current_span()));
    }

    pub(crate) fn expected(&self, code: DiagnosticCode, what: &str) {
        let found = if self.at_eof() {
            "end of file".to_string()
        } else {
            format!("'{}'", self.current_text())
        };
        self.error(code, &format!("expected {what}, found {found}"));
    }

    /// Skips to just past the next `;`, or stops before `}` / end of file.
    pub(crate) fn recover_to_semicolon(&mut self) {
        while !self.at_eof()
            && !self.at(ShdlToken::Semicolon)
            && !self.at(ShdlToken::RightBrace)
        {
            self.advance();
        }
        self.eat(ShdlToken::Semicolon);
    }

    // ========================================================================
    // Top-level parsing
    // ========================================================================

    /// Parses a complete module under the given (filename-derived) name.
    pub fn parse_module(&mut self, name: Ident) -> Module {
        let start = self.current_span();
        let mut imports = Vec::new();
        let mut components = Vec::new();

        while !self.at_eof() {
            match self.current() {
                ShdlToken::Use => imports.push(self.parse_import()),
                ShdlToken::Component => components.push(self.parse_component()),
                _ => {
                    self.expected(codes::EXPECTED_ITEM, "'use' or 'component'");
                    self.advance();
                }
            }
        }

        let span = start.merge(self.prev_span());
        Module {
            name,
            imports,
            components,
            span,
        }
    }

    /// `use module::{A, B};`
    fn parse_import(&mut self) -> Import {
        let start = self.current_span();
        self.expect(ShdlToken::Use, codes::EXPECTED_ITEM, "'use'");
        let module = self.expect_ident();
        self.expect(ShdlToken::ColonColon, codes::UNEXPECTED_TOKEN, "'::'");
        self.expect(ShdlToken::LeftBrace, codes::UNEXPECTED_TOKEN, "'{'");

        let mut components = Vec::new();
        components.push(self.expect_ident());
        while self.eat(ShdlToken::Comma) {
            components.push(self.expect_ident());
        }

        self.expect(ShdlToken::RightBrace, codes::UNEXPECTED_TOKEN, "'}'");
        self.expect_semicolon();

        Import {
            module,
            components,
            span: start.merge(self.prev_span()),
        }
    }

    /// `component Name(ins) -> (outs) { body }`
    fn parse_component(&mut self) -> ComponentDecl {
        let start = self.current_span();
        self.expect(ShdlToken::Component, codes::EXPECTED_ITEM, "'component'");
        let name = self.expect_ident();

        self.expect(ShdlToken::LeftParen, codes::UNEXPECTED_TOKEN, "'('");
        let inputs = self.parse_port_list();
        self.expect(ShdlToken::RightParen, codes::UNEXPECTED_TOKEN, "')'");

        if !self.eat(ShdlToken::Arrow) {
            self.sink.emit(
                Diagnostic::error(
                    codes::MISSING_ARROW,
                    "expected '->' between input and output port lists",
                    self.current_span(),
                )
                .with_help("a component header reads (inputs) -> (outputs)"),
            );
        }

        self.expect(ShdlToken::LeftParen, codes::UNEXPECTED_TOKEN, "'('");
        let outputs = self.parse_port_list();
        self.expect(ShdlToken::RightParen, codes::UNEXPECTED_TOKEN, "')'");

        self.expect(ShdlToken::LeftBrace, codes::UNEXPECTED_TOKEN, "'{'");
        let (items, connects) = self.parse_component_body();
        self.expect(ShdlToken::RightBrace, codes::UNEXPECTED_TOKEN, "'}'");

        ComponentDecl {
            name,
            inputs,
            outputs,
            items,
            connects,
            span: start.merge(self.prev_span()),
        }
    }

    /// Body: declarations, constants, generators, and one `connect` block.
    fn parse_component_body(&mut self) -> (Vec<BodyItem>, Vec<ConnectItem>) {
        let mut items = Vec::new();
        let mut connects: Vec<ConnectItem> = Vec::new();
        let mut saw_connect = false;

        while !self.at(ShdlToken::RightBrace) && !self.at_eof() {
            match self.current() {
                ShdlToken::Connect => {
                    if saw_connect {
                        self.error(
                            codes::UNEXPECTED_TOKEN,
                            "a component may contain only one connect block",
                        );
                    }
                    saw_connect = true;
                    connects.extend(self.parse_connect_block());
                }
                ShdlToken::Greater => {
                    if let Some(gen) = self.parse_generator(false) {
                        items.push(BodyItem::Generator(gen));
                    }
                }
                ShdlToken::Identifier => {
                    if let Some(item) = self.parse_decl_item() {
                        items.push(item);
                    }
                }
                _ => {
                    self.expected(
                        codes::UNEXPECTED_TOKEN,
                        "an instance declaration, constant, generator, or connect block",
                    );
                    self.recover_to_semicolon();
                }
            }
        }

        (items, connects)
    }

    /// `( port {, port} )` contents — the parens belong to the caller.
    fn parse_port_list(&mut self) -> Vec<PortDecl> {
        let mut ports = Vec::new();
        if self.at(ShdlToken::RightParen) {
            return ports;
        }
        ports.push(self.parse_port());
        while self.eat(ShdlToken::Comma) {
            ports.push(self.parse_port());
        }
        ports
    }

    /// `Name` or `Name[W]` with W ≥ 1.
    fn parse_port(&mut self) -> PortDecl {
        let start = self.current_span();
        let name = self.expect_ident();
        let mut width = 1u32;

        if self.eat(ShdlToken::LeftBracket) {
            let w_span = self.current_span();
            let w = self.expect_int();
            if w == 0 || w > u32::MAX as u64 {
                self.sink.emit(Diagnostic::error(
                    codes::INVALID_PORT_WIDTH,
                    format!("port width must be a positive integer, got {w}"),
                    w_span,
                ));
            } else {
                width = w as u32;
            }
            self.expect(ShdlToken::RightBracket, codes::UNEXPECTED_TOKEN, "']'");
        }

        PortDecl {
            name,
            width,
            span: start.merge(self.prev_span()),
        }
    }
}

/// Converts decimal / `0x` / `0b` literal text to a value.
///
/// The lexer has already validated the digit runs; `None` here means the
/// value overflows 64 bits.
pub(crate) fn parse_int_text(text: &str) -> Option<u64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        u64::from_str_radix(bin, 2).ok()
    } else {
        text.parse().ok()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::lexer;

    pub(crate) fn parse(source: &str) -> (Module, Vec<Diagnostic>, Interner) {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let file = FileId::from_raw(0);
        let tokens = lexer::lex(source, file, &sink);
        let name = interner.get_or_intern("test");
        let mut parser = ShdlParser::new(tokens, source, file, &interner, &sink);
        let module = parser.parse_module(name);
        (module, sink.take_all(), interner)
    }

    pub(crate) fn parse_ok(source: &str) -> (Module, Interner) {
        let (module, errors, interner) = parse(source);
        assert!(
            errors.is_empty(),
            "unexpected diagnostics: {:?}",
            errors.iter().map(|e| &e.message).collect::<Vec<_>>()
        );
        (module, interner)
    }

    #[test]
    fn empty_module() {
        let (module, _) = parse_ok("");
        assert!(module.imports.is_empty());
        assert!(module.components.is_empty());
    }

    #[test]
    fn import_statement() {
        let (module, interner) = parse_ok("use gates::{FullAdder, HalfAdder};");
        assert_eq!(module.imports.len(), 1);
        let imp = &module.imports[0];
        assert_eq!(interner.resolve(imp.module), "gates");
        let names: Vec<_> = imp
            .components
            .iter()
            .map(|c| interner.resolve(*c))
            .collect();
        assert_eq!(names, vec!["FullAdder", "HalfAdder"]);
    }

    #[test]
    fn minimal_component() {
        let (module, interner) = parse_ok("component Empty() -> () {}");
        assert_eq!(module.components.len(), 1);
        let c = &module.components[0];
        assert_eq!(interner.resolve(c.name), "Empty");
        assert!(c.inputs.is_empty() && c.outputs.is_empty());
        assert!(c.items.is_empty() && c.connects.is_empty());
    }

    #[test]
    fn ports_with_widths() {
        let (module, interner) = parse_ok("component Add(A[16], B[16], Cin) -> (Sum[16], Cout) {}");
        let c = &module.components[0];
        assert_eq!(c.inputs.len(), 3);
        assert_eq!(c.inputs[0].width, 16);
        assert_eq!(c.inputs[2].width, 1);
        assert_eq!(c.outputs[0].width, 16);
        assert_eq!(interner.resolve(c.outputs[1].name), "Cout");
    }

    #[test]
    fn half_adder_body() {
        let (module, interner) = parse_ok(
            "component HA(A, B) -> (Sum, Carry) {
                x: XOR;
                a: AND;
                connect {
                    A -> x.A;
                    B -> x.B;
                    A -> a.A;
                    B -> a.B;
                    x.O -> Sum;
                    a.O -> Carry;
                }
            }",
        );
        let c = &module.components[0];
        assert_eq!(c.items.len(), 2);
        assert_eq!(c.connects.len(), 6);
        match &c.items[0] {
            BodyItem::Instance(inst) => {
                assert_eq!(inst.name.as_plain(), Some("x"));
                assert_eq!(interner.resolve(inst.ty), "XOR");
            }
            other => panic!("expected instance, got {other:?}"),
        }
    }

    #[test]
    fn zero_port_width_rejected() {
        let (module, errors, _) = parse("component C(A[0]) -> () {}");
        assert_eq!(module.components[0].inputs[0].width, 1);
        assert!(errors.iter().any(|e| format!("{}", e.code) == "E0209"));
    }

    #[test]
    fn missing_arrow_reported() {
        let (module, errors, _) = parse("component C(A) (B) {}");
        assert_eq!(module.components.len(), 1);
        assert!(errors.iter().any(|e| format!("{}", e.code) == "E0210"));
    }

    #[test]
    fn missing_semicolon_recovers() {
        let (module, errors, _) = parse(
            "component C(A) -> (B) {
                x: AND
                y: OR;
            }",
        );
        let c = &module.components[0];
        assert!(errors.iter().any(|e| format!("{}", e.code) == "E0202"));
        // Both instances survive.
        assert_eq!(c.items.len(), 2);
    }

    #[test]
    fn garbage_at_top_level_recovers() {
        let (module, errors, _) = parse("; component C() -> () {}");
        assert_eq!(module.components.len(), 1);
        assert!(errors.iter().any(|e| format!("{}", e.code) == "E0215"));
    }

    #[test]
    fn two_components() {
        let (module, _) = parse_ok(
            "component A() -> () {}
             component B() -> () {}",
        );
        assert_eq!(module.components.len(), 2);
    }

    #[test]
    fn duplicate_connect_block_reported() {
        let (module, errors, _) = parse(
            "component C(A) -> (B) {
                connect { A -> B; }
                connect { A -> B; }
            }",
        );
        assert!(errors
            .iter()
            .any(|e| e.message.contains("only one connect block")));
        // Both blocks' statements are kept for further analysis.
        assert_eq!(module.components[0].connects.len(), 2);
    }

    #[test]
    fn hex_and_binary_int_text() {
        assert_eq!(parse_int_text("42"), Some(42));
        assert_eq!(parse_int_text("0xFF"), Some(255));
        assert_eq!(parse_int_text("0b1010"), Some(10));
        assert_eq!(parse_int_text("99999999999999999999999"), None);
    }
}
