//! Parsing of signals, template names, index expressions, connections, and
//! the integer arithmetic allowed inside generator bodies.

use crate::ast::*;
use crate::parser::ShdlParser;
use crate::token::ShdlToken;
use shdl_diagnostics::codes;

impl ShdlParser<'_> {
    /// A name with optional `{expr}` template parts: `g`, `g{i}`,
    /// `cell{i+1}_{j}`.
    pub(crate) fn parse_template_name(&mut self) -> Option<TemplateName> {
        let start = self.current_span();
        if !self.at(ShdlToken::Identifier) {
            self.expected(codes::EXPECTED_IDENTIFIER, "identifier");
            self.recover_to_semicolon();
            return None;
        }
        let mut parts = vec![NamePart::Text(self.current_text().to_string())];
        self.advance();

        while self.at(ShdlToken::LeftBrace) {
            self.advance();
            let expr = self.parse_arith_expr();
            self.expect(ShdlToken::RightBrace, codes::UNEXPECTED_TOKEN, "'}'");
            parts.push(NamePart::Expr(expr));
            // Trailing text continues the same name: cell{i}_{j} → "_" between exprs.
            if self.at(ShdlToken::Identifier) {
                parts.push(NamePart::Text(self.current_text().to_string()));
                self.advance();
            }
        }

        Some(TemplateName {
            parts,
            span: start.merge(self.prev_span()),
        })
    }

    /// A signal reference: `Name`, `Name[idx]`, `inst.Port`, `inst.Port[idx]`,
    /// with slices `[:n]`, `[n:]`, `[a:b]` allowed in the index position.
    pub(crate) fn parse_signal(&mut self) -> Option<SignalRef> {
        let start = self.current_span();
        let first = self.parse_template_name()?;

        let (instance, name) = if self.eat(ShdlToken::Dot) {
            let port = self.parse_template_name()?;
            (Some(first), port)
        } else {
            (None, first)
        };

        let index = if self.eat(ShdlToken::LeftBracket) {
            let idx = self.parse_index_expr();
            self.expect(ShdlToken::RightBracket, codes::UNEXPECTED_TOKEN, "']'");
            Some(idx)
        } else {
            None
        };

        Some(SignalRef {
            instance,
            name,
            index,
            span: start.merge(self.prev_span()),
        })
    }

    /// `src -> dst;`
    pub(crate) fn parse_connection(&mut self) -> Option<Connection> {
        let start = self.current_span();
        let source = self.parse_signal()?;

        if !self.eat(ShdlToken::Arrow) {
            self.expected(codes::UNEXPECTED_TOKEN, "'->'");
            self.recover_to_semicolon();
            return None;
        }

        let dest = self.parse_signal()?;
        self.expect_semicolon();

        Some(Connection {
            source,
            dest,
            span: start.merge(self.prev_span()),
        })
    }

    /// The inside of `[...]` on a signal: a single index or a slice.
    fn parse_index_expr(&mut self) -> IndexExpr {
        let start = self.current_span();

        // [:end]
        if self.eat(ShdlToken::Colon) {
            let end = self.parse_arith_expr();
            return IndexExpr {
                start: None,
                end: Some(end),
                is_slice: true,
                span: start.merge(self.prev_span()),
            };
        }

        let first = self.parse_arith_expr();

        if self.eat(ShdlToken::Colon) {
            if self.at(ShdlToken::RightBracket) {
                // [start:]
                IndexExpr {
                    start: Some(first),
                    end: None,
                    is_slice: true,
                    span: start.merge(self.prev_span()),
                }
            } else {
                // [start:end]
                let end = self.parse_arith_expr();
                IndexExpr {
                    start: Some(first),
                    end: Some(end),
                    is_slice: true,
                    span: start.merge(self.prev_span()),
                }
            }
        } else {
            IndexExpr {
                start: Some(first),
                end: None,
                is_slice: false,
                span: start.merge(self.prev_span()),
            }
        }
    }

    /// Integer arithmetic with the usual precedence: `+ -` over `* /`.
    pub(crate) fn parse_arith_expr(&mut self) -> ArithExpr {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> ArithExpr {
        let mut lhs = self.parse_multiplicative();
        loop {
            let op = match self.current() {
                ShdlToken::Plus => BinOp::Add,
                ShdlToken::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative();
            let span = lhs.span().merge(rhs.span());
            lhs = ArithExpr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        lhs
    }

    fn parse_multiplicative(&mut self) -> ArithExpr {
        let mut lhs = self.parse_primary();
        loop {
            let op = match self.current() {
                ShdlToken::Star => BinOp::Mul,
                ShdlToken::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_primary();
            let span = lhs.span().merge(rhs.span());
            lhs = ArithExpr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        lhs
    }

    fn parse_primary(&mut self) -> ArithExpr {
        let span = self.current_span();
        match self.current() {
            ShdlToken::IntLiteral => {
                let value = self.expect_int();
                ArithExpr::Number {
                    value: value as i64,
                    span,
                }
            }
            ShdlToken::Identifier => {
                let name = self.interner.get_or_intern(self.current_text());
                self.advance();
                ArithExpr::Var { name, span }
            }
            ShdlToken::LeftBrace => {
                self.advance();
                let expr = self.parse_additive();
                self.expect(ShdlToken::RightBrace, codes::UNEXPECTED_TOKEN, "'}'");
                expr
            }
            _ => {
                self.expected(
                    codes::UNEXPECTED_TOKEN,
                    "a number, variable, or '{expression}'",
                );
                ArithExpr::Number { value: 0, span }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tests::{parse, parse_ok};

    fn first_connection(source: &str) -> Connection {
        let (module, _) = parse_ok(source);
        match &module.components[0].connects[0] {
            ConnectItem::Connection(c) => c.clone(),
            other => panic!("expected connection, got {other:?}"),
        }
    }

    #[test]
    fn simple_connection() {
        let c = first_connection(
            "component C(A) -> (B) { connect { A -> B; } }",
        );
        assert_eq!(c.source.name.as_plain(), Some("A"));
        assert_eq!(c.dest.name.as_plain(), Some("B"));
        assert!(c.source.instance.is_none());
        assert!(c.source.index.is_none());
    }

    #[test]
    fn instance_port_reference() {
        let c = first_connection(
            "component C(A) -> (B) { x: AND; connect { x.O -> B; } }",
        );
        assert_eq!(c.source.instance.as_ref().unwrap().as_plain(), Some("x"));
        assert_eq!(c.source.name.as_plain(), Some("O"));
    }

    #[test]
    fn indexed_reference() {
        let c = first_connection(
            "component C(In[8]) -> (B) { connect { In[3] -> B; } }",
        );
        let idx = c.source.index.unwrap();
        assert!(!idx.is_slice);
        assert!(matches!(
            idx.start,
            Some(ArithExpr::Number { value: 3, .. })
        ));
    }

    #[test]
    fn slice_forms() {
        let c = first_connection(
            "component C(In[8]) -> (Out[8]) { connect { In[:4] -> Out[:4]; } }",
        );
        let idx = c.source.index.unwrap();
        assert!(idx.is_slice);
        assert!(idx.start.is_none());
        assert!(matches!(idx.end, Some(ArithExpr::Number { value: 4, .. })));

        let c = first_connection(
            "component C(In[8]) -> (Out[8]) { connect { In[5:] -> Out[5:]; } }",
        );
        let idx = c.source.index.unwrap();
        assert!(idx.is_slice);
        assert!(matches!(
            idx.start,
            Some(ArithExpr::Number { value: 5, .. })
        ));
        assert!(idx.end.is_none());

        let c = first_connection(
            "component C(In[8]) -> (Out[8]) { connect { In[2:7] -> Out[2:7]; } }",
        );
        let idx = c.source.index.unwrap();
        assert!(idx.is_slice);
        assert!(matches!(idx.end, Some(ArithExpr::Number { value: 7, .. })));
    }

    #[test]
    fn arithmetic_index_with_precedence() {
        let (module, interner) = parse_ok(
            "component C(In[8]) -> (B) { connect { >i[4]{ In[{i*2+1}] -> B; } } }",
        );
        match &module.components[0].connects[0] {
            ConnectItem::Generator(gen) => match &gen.body {
                GeneratorBody::Connects(items) => match &items[0] {
                    ConnectItem::Connection(conn) => {
                        let idx = conn.source.index.as_ref().unwrap();
                        match idx.start.as_ref().unwrap() {
                            ArithExpr::Binary { op: BinOp::Add, lhs, .. } => {
                                // i*2 binds tighter than +1.
                                match lhs.as_ref() {
                                    ArithExpr::Binary { op: BinOp::Mul, lhs, .. } => {
                                        match lhs.as_ref() {
                                            ArithExpr::Var { name, .. } => {
                                                assert_eq!(interner.resolve(*name), "i");
                                            }
                                            other => panic!("expected var, got {other:?}"),
                                        }
                                    }
                                    other => panic!("expected mul, got {other:?}"),
                                }
                            }
                            other => panic!("expected add at top, got {other:?}"),
                        }
                    }
                    other => panic!("expected connection, got {other:?}"),
                },
                _ => panic!("expected connect body"),
            },
            other => panic!("expected generator, got {other:?}"),
        }
    }

    #[test]
    fn templated_signal_names() {
        let (module, _) = parse_ok(
            "component C(A) -> (B) {
                connect {
                    >i[3]{ A -> g{i}.A; }
                }
            }",
        );
        match &module.components[0].connects[0] {
            ConnectItem::Generator(gen) => match &gen.body {
                GeneratorBody::Connects(items) => match &items[0] {
                    ConnectItem::Connection(conn) => {
                        assert!(conn.dest.instance.as_ref().unwrap().is_templated());
                        assert_eq!(conn.dest.name.as_plain(), Some("A"));
                    }
                    other => panic!("expected connection, got {other:?}"),
                },
                _ => panic!("expected connect body"),
            },
            other => panic!("expected generator, got {other:?}"),
        }
    }

    #[test]
    fn missing_arrow_in_connection_recovers() {
        let (module, errors, _) = parse(
            "component C(A) -> (B) {
                connect {
                    A B;
                    A -> B;
                }
            }",
        );
        assert!(!errors.is_empty());
        // The good connection survives recovery.
        assert_eq!(module.components[0].connects.len(), 1);
    }
}
