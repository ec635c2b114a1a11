//! Evaluation of generator arithmetic over 64-bit signed integers.

use std::collections::HashMap;

use shdl_common::{Ident, Interner};
use shdl_diagnostics::{codes, Diagnostic, DiagnosticSink};
use shdl_parser::ast::{ArithExpr, BinOp};

/// Generator-variable bindings in effect for one unrolled iteration.
pub(crate) type Bindings = HashMap<Ident, i64>;

/// Evaluates an expression under the given bindings.
///
/// Reports `E0603` for unbound variables and `E0604` for division by zero;
/// both return `None` so the caller can drop the offending item and keep
/// going.
pub(crate) fn eval_expr(
    expr: &ArithExpr,
    bindings: &Bindings,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> Option<i64> {
    match expr {
        ArithExpr::Number { value, .. } => Some(*value),
        ArithExpr::Var { name, span } => match bindings.get(name) {
            Some(value) => Some(*value),
            None => {
                sink.emit(
                    Diagnostic::error(
                        codes::UNDEFINED_VARIABLE,
                        format!(
                            "no enclosing generator binds variable '{}'",
                            interner.resolve(*name)
                        ),
                        *span,
                    )
                    .with_help("generator variables are introduced with '>v[range]{ ... }'"),
                );
                None
            }
        },
        ArithExpr::Binary { op, lhs, rhs, span } => {
            let l = eval_expr(lhs, bindings, interner, sink)?;
            let r = eval_expr(rhs, bindings, interner, sink)?;
            match op {
                BinOp::Add => Some(l.wrapping_add(r)),
                BinOp::Sub => Some(l.wrapping_sub(r)),
                BinOp::Mul => Some(l.wrapping_mul(r)),
                BinOp::Div => {
                    if r == 0 {
                        sink.emit(Diagnostic::error(
                            codes::DIVISION_BY_ZERO,
                            "division by zero in generator expression",
                            *span,
                        ));
                        None
                    } else {
                        Some(l / r)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shdl_source::Span;

    fn num(value: i64) -> ArithExpr {
        ArithExpr::Number {
            value,
            span: Span::DUMMY,
        }
    }

    fn var(interner: &Interner, name: &str) -> ArithExpr {
        ArithExpr::Var {
            name: interner.get_or_intern(name),
            span: Span::DUMMY,
        }
    }

    fn bin(op: BinOp, lhs: ArithExpr, rhs: ArithExpr) -> ArithExpr {
        ArithExpr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            span: Span::DUMMY,
        }
    }

    #[test]
    fn literals_and_variables() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let mut bindings = Bindings::new();
        bindings.insert(interner.get_or_intern("i"), 3);

        assert_eq!(eval_expr(&num(7), &bindings, &interner, &sink), Some(7));
        assert_eq!(
            eval_expr(&var(&interner, "i"), &bindings, &interner, &sink),
            Some(3)
        );
    }

    #[test]
    fn arithmetic() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let mut bindings = Bindings::new();
        bindings.insert(interner.get_or_intern("i"), 5);

        // i*2 - 1
        let expr = bin(
            BinOp::Sub,
            bin(BinOp::Mul, var(&interner, "i"), num(2)),
            num(1),
        );
        assert_eq!(eval_expr(&expr, &bindings, &interner, &sink), Some(9));

        // i/2
        let expr = bin(BinOp::Div, var(&interner, "i"), num(2));
        assert_eq!(eval_expr(&expr, &bindings, &interner, &sink), Some(2));
    }

    #[test]
    fn unbound_variable_is_e0603() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let result = eval_expr(&var(&interner, "k"), &Bindings::new(), &interner, &sink);
        assert_eq!(result, None);
        assert_eq!(format!("{}", sink.diagnostics()[0].code), "E0603");
    }

    #[test]
    fn division_by_zero_is_e0604() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let expr = bin(BinOp::Div, num(4), num(0));
        assert_eq!(eval_expr(&expr, &Bindings::new(), &interner, &sink), None);
        assert_eq!(format!("{}", sink.diagnostics()[0].code), "E0604");
    }

    #[test]
    fn negative_intermediate_values() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let expr = bin(BinOp::Add, bin(BinOp::Sub, num(1), num(5)), num(10));
        assert_eq!(eval_expr(&expr, &Bindings::new(), &interner, &sink), Some(6));
    }
}
