//! Parsing of component-body declarations: instances, constants, generators,
//! and the connect block.

use crate::ast::*;
use crate::parser::ShdlParser;
use crate::token::ShdlToken;
use shdl_diagnostics::{codes, Diagnostic};

impl ShdlParser<'_> {
    /// One declaration item: `name: Type;`, `NAME = v;`, or `NAME[w] = v;`.
    ///
    /// The name is parsed first (it may carry `{expr}` template parts), then
    /// the following token decides between instance and constant.
    pub(crate) fn parse_decl_item(&mut self) -> Option<BodyItem> {
        let start = self.current_span();
        let name = self.parse_template_name()?;

        match self.current() {
            ShdlToken::Colon => {
                self.advance();
                let ty = self.expect_ident();
                self.expect_semicolon();
                Some(BodyItem::Instance(InstanceDecl {
                    name,
                    ty,
                    span: start.merge(self.prev_span()),
                }))
            }
            ShdlToken::Equals | ShdlToken::LeftBracket => {
                let mut width = None;
                if self.eat(ShdlToken::LeftBracket) {
                    let w_span = self.current_span();
                    let w = self.expect_int();
                    if w == 0 || w > 64 {
                        self.sink.emit(Diagnostic::error(
                            codes::INVALID_PORT_WIDTH,
                            format!("constant width must be between 1 and 64, got {w}"),
                            w_span,
                        ));
                    } else {
                        width = Some(w as u32);
                    }
                    self.expect(ShdlToken::RightBracket, codes::UNEXPECTED_TOKEN, "']'");
                }
                if !self.eat(ShdlToken::Equals) {
                    self.expected(codes::UNEXPECTED_TOKEN, "'='");
                    self.recover_to_semicolon();
                    return None;
                }
                let value = self.expect_int();
                self.expect_semicolon();
                Some(BodyItem::Constant(ConstantDecl {
                    name,
                    width,
                    value,
                    span: start.merge(self.prev_span()),
                }))
            }
            _ => {
                self.expected(codes::UNEXPECTED_TOKEN, "':', '=' or '[' after identifier");
                self.recover_to_semicolon();
                None
            }
        }
    }

    /// `connect { connection | generator … }`
    pub(crate) fn parse_connect_block(&mut self) -> Vec<ConnectItem> {
        self.expect(ShdlToken::Connect, codes::UNEXPECTED_TOKEN, "'connect'");
        self.expect(ShdlToken::LeftBrace, codes::UNEXPECTED_TOKEN, "'{'");

        let mut items = Vec::new();
        while !self.at(ShdlToken::RightBrace) && !self.at_eof() {
            if self.at(ShdlToken::Greater) {
                if let Some(gen) = self.parse_generator(true) {
                    items.push(ConnectItem::Generator(gen));
                }
            } else if let Some(conn) = self.parse_connection() {
                items.push(ConnectItem::Connection(conn));
            }
        }

        self.expect(ShdlToken::RightBrace, codes::UNEXPECTED_TOKEN, "'}'");
        items
    }

    /// `>v[R]{ … }` — declarations outside connect, connections inside.
    pub(crate) fn parse_generator(&mut self, in_connect: bool) -> Option<Generator> {
        let start = self.current_span();
        self.expect(ShdlToken::Greater, codes::INVALID_GENERATOR_SYNTAX, "'>'");
        let var_span = self.current_span();
        let var = self.expect_ident();

        if !self.eat(ShdlToken::LeftBracket) {
            self.expected(
                codes::INVALID_GENERATOR_SYNTAX,
                "'[' after generator variable",
            );
            self.recover_to_semicolon();
            return None;
        }
        let ranges = self.parse_range_list();
        self.expect(
            ShdlToken::RightBracket,
            codes::INVALID_GENERATOR_SYNTAX,
            "']'",
        );

        if !self.eat(ShdlToken::LeftBrace) {
            self.expected(codes::INVALID_GENERATOR_SYNTAX, "'{' opening generator body");
            self.recover_to_semicolon();
            return None;
        }

        let body = if in_connect {
            let mut items = Vec::new();
            while !self.at(ShdlToken::RightBrace) && !self.at_eof() {
                if self.at(ShdlToken::Greater) {
                    if let Some(gen) = self.parse_generator(true) {
                        items.push(ConnectItem::Generator(gen));
                    }
                } else if let Some(conn) = self.parse_connection() {
                    items.push(ConnectItem::Connection(conn));
                }
            }
            GeneratorBody::Connects(items)
        } else {
            let mut items = Vec::new();
            while !self.at(ShdlToken::RightBrace) && !self.at_eof() {
                if self.at(ShdlToken::Greater) {
                    if let Some(gen) = self.parse_generator(false) {
                        items.push(BodyItem::Generator(gen));
                    }
                } else if self.at(ShdlToken::Identifier) {
                    if let Some(item) = self.parse_decl_item() {
                        items.push(item);
                    }
                } else {
                    self.expected(
                        codes::INVALID_GENERATOR_SYNTAX,
                        "an instance or constant declaration",
                    );
                    self.recover_to_semicolon();
                }
            }
            GeneratorBody::Decls(items)
        };

        self.expect(
            ShdlToken::RightBrace,
            codes::INVALID_GENERATOR_SYNTAX,
            "'}' closing generator body",
        );

        Some(Generator {
            var,
            var_span,
            ranges,
            body,
            span: start.merge(self.prev_span()),
        })
    }

    /// `range {, range}` inside a generator header.
    fn parse_range_list(&mut self) -> Vec<RangeItem> {
        let mut ranges = Vec::new();
        ranges.push(self.parse_range_item());
        while self.eat(ShdlToken::Comma) {
            ranges.push(self.parse_range_item());
        }
        ranges
    }

    /// One range item: `k`, `a:b`, `a:`, or `:b`. Bounds are 1-based, so a
    /// zero anywhere is rejected.
    fn parse_range_item(&mut self) -> RangeItem {
        let start_span = self.current_span();

        if self.eat(ShdlToken::Colon) {
            let end = self.expect_positive_range_bound();
            return RangeItem::To {
                end,
                span: start_span.merge(self.prev_span()),
            };
        }

        let first = self.expect_positive_range_bound();

        if self.eat(ShdlToken::Colon) {
            if self.at(ShdlToken::IntLiteral) {
                let end = self.expect_positive_range_bound();
                RangeItem::Closed {
                    start: first,
                    end,
                    span: start_span.merge(self.prev_span()),
                }
            } else {
                RangeItem::From {
                    start: first,
                    span: start_span.merge(self.prev_span()),
                }
            }
        } else {
            RangeItem::Single {
                value: first,
                span: start_span.merge(self.prev_span()),
            }
        }
    }

    fn expect_positive_range_bound(&mut self) -> u64 {
        let span = self.current_span();
        let value = self.expect_int();
        if value == 0 {
            self.sink.emit(Diagnostic::error(
                codes::INVALID_GENERATOR_SYNTAX,
                "generator range bounds are 1-based and must be positive",
                span,
            ));
            return 1;
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tests::{parse, parse_ok};

    #[test]
    fn constant_declarations() {
        let (module, _) = parse_ok(
            "component C() -> () {
                FIVE = 5;
                MASK[8] = 0xFF;
                PATTERN = 0b1010;
            }",
        );
        let c = &module.components[0];
        assert_eq!(c.items.len(), 3);
        match (&c.items[0], &c.items[1], &c.items[2]) {
            (BodyItem::Constant(five), BodyItem::Constant(mask), BodyItem::Constant(pattern)) => {
                assert_eq!(five.value, 5);
                assert_eq!(five.width, None);
                assert_eq!(mask.value, 255);
                assert_eq!(mask.width, Some(8));
                assert_eq!(pattern.value, 10);
            }
            other => panic!("expected three constants, got {other:?}"),
        }
    }

    #[test]
    fn generator_with_simple_range() {
        let (module, interner) = parse_ok(
            "component C() -> () {
                >i[3]{ g{i}: AND; }
            }",
        );
        let c = &module.components[0];
        match &c.items[0] {
            BodyItem::Generator(gen) => {
                assert_eq!(interner.resolve(gen.var), "i");
                assert!(matches!(gen.ranges[0], RangeItem::Single { value: 3, .. }));
                match &gen.body {
                    GeneratorBody::Decls(items) => {
                        assert_eq!(items.len(), 1);
                        match &items[0] {
                            BodyItem::Instance(inst) => {
                                assert!(inst.name.is_templated());
                                assert_eq!(interner.resolve(inst.ty), "AND");
                            }
                            other => panic!("expected instance, got {other:?}"),
                        }
                    }
                    _ => panic!("expected decl body"),
                }
            }
            other => panic!("expected generator, got {other:?}"),
        }
    }

    #[test]
    fn generator_multi_range() {
        let (module, _) = parse_ok(
            "component C() -> () {
                >k[1:4, 8, 12:]{ g{k}: OR; }
            }",
        );
        match &module.components[0].items[0] {
            BodyItem::Generator(gen) => {
                assert_eq!(gen.ranges.len(), 3);
                assert!(matches!(
                    gen.ranges[0],
                    RangeItem::Closed {
                        start: 1,
                        end: 4,
                        ..
                    }
                ));
                assert!(matches!(gen.ranges[1], RangeItem::Single { value: 8, .. }));
                assert!(matches!(gen.ranges[2], RangeItem::From { start: 12, .. }));
            }
            other => panic!("expected generator, got {other:?}"),
        }
    }

    #[test]
    fn nested_generator_in_connect() {
        let (module, _) = parse_ok(
            "component C(In[4]) -> (Out[4]) {
                connect {
                    >i[4]{
                        In[{i}] -> Out[{i}];
                    }
                }
            }",
        );
        match &module.components[0].connects[0] {
            ConnectItem::Generator(gen) => match &gen.body {
                GeneratorBody::Connects(items) => assert_eq!(items.len(), 1),
                _ => panic!("expected connect body"),
            },
            other => panic!("expected generator, got {other:?}"),
        }
    }

    #[test]
    fn zero_range_bound_rejected() {
        let (_, errors, _) = parse(
            "component C() -> () {
                >i[0]{ g{i}: AND; }
            }",
        );
        assert!(errors.iter().any(|e| format!("{}", e.code) == "E0214"));
    }

    #[test]
    fn equals_in_instance_context() {
        let (_, errors, _) = parse(
            "component C() -> () {
                x: = AND;
            }",
        );
        assert!(!errors.is_empty());
    }

    #[test]
    fn templated_constant_in_generator_body() {
        let (module, _) = parse_ok(
            "component C() -> () {
                >i[2]{ K{i} = 7; }
            }",
        );
        match &module.components[0].items[0] {
            BodyItem::Generator(gen) => match &gen.body {
                GeneratorBody::Decls(items) => {
                    match &items[0] {
                        BodyItem::Constant(c) => {
                            assert!(c.name.is_templated());
                            assert_eq!(c.value, 7);
                        }
                        other => panic!("expected constant, got {other:?}"),
                    }
                }
                _ => panic!("expected decl body"),
            },
            other => panic!("expected generator, got {other:?}"),
        }
    }

    #[test]
    fn nested_decl_generator() {
        let (module, _) = parse_ok(
            "component C() -> () {
                >i[2]{
                    >j[2]{
                        cell{i}_{j}: AND;
                    }
                }
            }",
        );
        match &module.components[0].items[0] {
            BodyItem::Generator(outer) => match &outer.body {
                GeneratorBody::Decls(items) => {
                    assert!(matches!(items[0], BodyItem::Generator(_)));
                }
                _ => panic!("expected decl body"),
            },
            other => panic!("expected generator, got {other:?}"),
        }
    }
}
