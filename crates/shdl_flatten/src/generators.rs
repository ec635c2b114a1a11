//! Phase 2 — generator expansion.
//!
//! Unrolls every `>v[R]{ … }` innermost-first: ranges evaluate to explicit
//! integer sequences, each emitted body copy binds the loop variable, and the
//! binding substitutes into template names (`g{i}` → `g3`) and into index
//! arithmetic. After this phase no generator syntax remains and every name
//! is a plain ident.

use crate::eval::{eval_expr, Bindings};
use crate::flat::{FlatConnection, FlatConstant, FlatIndex, FlatInstance, FlatItem, FlatSignal};
use crate::Flattener;
use shdl_common::Ident;
use shdl_diagnostics::{codes, Diagnostic};
use shdl_parser::ast::{
    BodyItem, ComponentDecl, ConnectItem, Generator, GeneratorBody, IndexExpr, RangeItem,
    SignalRef, TemplateName,
};
use std::collections::HashSet;

impl Flattener<'_> {
    /// Expands all generators in a component, producing ordered body items
    /// and connections with rendered names and evaluated indices.
    pub(crate) fn expand_generators(
        &mut self,
        decl: &ComponentDecl,
    ) -> (Vec<FlatItem>, Vec<FlatConnection>) {
        // Names a generator variable must not shadow: ports and (plain)
        // constant names of this component.
        let mut shadow_names: HashSet<Ident> = HashSet::new();
        for port in decl.inputs.iter().chain(&decl.outputs) {
            shadow_names.insert(port.name);
        }
        collect_constant_names(&decl.items, &mut shadow_names, self);

        let mut items = Vec::new();
        let bindings = Bindings::new();
        for item in &decl.items {
            self.expand_body_item(item, &bindings, &shadow_names, &mut items);
        }

        let mut connections = Vec::new();
        for item in &decl.connects {
            self.expand_connect_item(item, &bindings, &shadow_names, &mut connections);
        }

        (items, connections)
    }

    fn expand_body_item(
        &mut self,
        item: &BodyItem,
        bindings: &Bindings,
        shadow_names: &HashSet<Ident>,
        out: &mut Vec<FlatItem>,
    ) {
        match item {
            BodyItem::Instance(inst) => {
                if let Some(name) = self.render_name(&inst.name, bindings) {
                    out.push(FlatItem::Instance(FlatInstance {
                        name,
                        ty: inst.ty,
                        span: inst.span,
                    }));
                }
            }
            BodyItem::Constant(c) => {
                if let Some(name) = self.render_name(&c.name, bindings) {
                    out.push(FlatItem::Constant(FlatConstant {
                        name,
                        width: c.width,
                        value: c.value,
                        span: c.span,
                    }));
                }
            }
            BodyItem::Generator(gen) => {
                let Some(values) = self.generator_values(gen, bindings, shadow_names) else {
                    return;
                };
                for value in values {
                    let mut inner = bindings.clone();
                    inner.insert(gen.var, value as i64);
                    if let GeneratorBody::Decls(body) = &gen.body {
                        for item in body {
                            self.expand_body_item(item, &inner, shadow_names, out);
                        }
                    }
                }
            }
        }
    }

    fn expand_connect_item(
        &mut self,
        item: &ConnectItem,
        bindings: &Bindings,
        shadow_names: &HashSet<Ident>,
        out: &mut Vec<FlatConnection>,
    ) {
        match item {
            ConnectItem::Connection(conn) => {
                let source = self.render_signal(&conn.source, bindings);
                let dest = self.render_signal(&conn.dest, bindings);
                if let (Some(source), Some(dest)) = (source, dest) {
                    out.push(FlatConnection {
                        source,
                        dest,
                        span: conn.span,
                    });
                }
            }
            ConnectItem::Generator(gen) => {
                let Some(values) = self.generator_values(gen, bindings, shadow_names) else {
                    return;
                };
                for value in values {
                    let mut inner = bindings.clone();
                    inner.insert(gen.var, value as i64);
                    if let GeneratorBody::Connects(body) = &gen.body {
                        for item in body {
                            self.expand_connect_item(item, &inner, shadow_names, out);
                        }
                    }
                }
            }
        }
    }

    /// Checks shadowing rules and expands the range list, or `None` when the
    /// generator must be skipped entirely.
    fn generator_values(
        &mut self,
        gen: &Generator,
        bindings: &Bindings,
        shadow_names: &HashSet<Ident>,
    ) -> Option<Vec<u64>> {
        if bindings.contains_key(&gen.var) {
            self.sink.emit(Diagnostic::error(
                codes::VARIABLE_SHADOWING,
                format!(
                    "generator variable '{}' shadows an enclosing generator variable",
                    self.interner.resolve(gen.var)
                ),
                gen.var_span,
            ));
            return None;
        }
        if shadow_names.contains(&gen.var) {
            self.sink.emit(Diagnostic::warning(
                codes::SHADOWS_DECLARATION,
                format!(
                    "generator variable '{}' shadows a port or constant of this component",
                    self.interner.resolve(gen.var)
                ),
                gen.var_span,
            ));
        }
        Some(self.expand_ranges(&gen.ranges))
    }

    /// Evaluates a range list into its explicit value sequence, in order.
    ///
    /// `[k]` as the sole item means `1..=k`; a bare `k` inside a multi-item
    /// list is the singleton `k`. Open-ended items have no width context in
    /// a generator header and are rejected.
    pub(crate) fn expand_ranges(&mut self, ranges: &[RangeItem]) -> Vec<u64> {
        if let [RangeItem::Single { value, .. }] = ranges {
            return (1..=*value).collect();
        }

        let mut values = Vec::new();
        for item in ranges {
            match item {
                RangeItem::Single { value, .. } => values.push(*value),
                RangeItem::Closed { start, end, span } => {
                    if start > end {
                        self.sink.emit(Diagnostic::error(
                            codes::INVALID_RANGE,
                            format!("range {start}:{end} is empty"),
                            *span,
                        ));
                    } else {
                        values.extend(*start..=*end);
                    }
                }
                RangeItem::From { span, .. } => {
                    self.sink.emit(
                        Diagnostic::error(
                            codes::INVALID_RANGE,
                            "open-ended range has no width to adopt in a generator header",
                            *span,
                        )
                        .with_help("write an explicit upper bound, e.g. '4:16'"),
                    );
                }
                RangeItem::To { end, .. } => values.extend(1..=*end),
            }
        }
        values
    }

    /// Renders a template name under the given bindings: `cell{i+1}_{j}`
    /// with i=2, j=4 becomes `cell3_4`.
    pub(crate) fn render_name(
        &mut self,
        name: &TemplateName,
        bindings: &Bindings,
    ) -> Option<Ident> {
        use shdl_parser::ast::NamePart;

        let mut rendered = String::new();
        for part in &name.parts {
            match part {
                NamePart::Text(text) => rendered.push_str(text),
                NamePart::Expr(expr) => {
                    let value = eval_expr(expr, bindings, self.interner, self.sink)?;
                    rendered.push_str(&value.to_string());
                }
            }
        }
        Some(self.interner.get_or_intern(&rendered))
    }

    /// Renders a signal reference: names substituted, index arithmetic
    /// evaluated.
    fn render_signal(&mut self, sig: &SignalRef, bindings: &Bindings) -> Option<FlatSignal> {
        let instance = match &sig.instance {
            Some(name) => Some(self.render_name(name, bindings)?),
            None => None,
        };
        let name = self.render_name(&sig.name, bindings)?;
        let index = match &sig.index {
            Some(idx) => Some(self.eval_index(idx, bindings)?),
            None => None,
        };
        Some(FlatSignal {
            instance,
            name,
            index,
            span: sig.span,
        })
    }

    fn eval_index(&mut self, idx: &IndexExpr, bindings: &Bindings) -> Option<FlatIndex> {
        if idx.is_slice {
            let start = match &idx.start {
                Some(expr) => Some(eval_expr(expr, bindings, self.interner, self.sink)?),
                None => None,
            };
            let end = match &idx.end {
                Some(expr) => Some(eval_expr(expr, bindings, self.interner, self.sink)?),
                None => None,
            };
            Some(FlatIndex::Slice { start, end })
        } else {
            let expr = idx.start.as_ref()?;
            Some(FlatIndex::Bit(eval_expr(
                expr,
                bindings,
                self.interner,
                self.sink,
            )?))
        }
    }
}

/// Collects plain constant names (including those nested in generators) for
/// the shadowing check.
fn collect_constant_names(items: &[BodyItem], out: &mut HashSet<Ident>, fl: &Flattener<'_>) {
    for item in items {
        match item {
            BodyItem::Constant(c) => {
                if let Some(plain) = c.name.as_plain() {
                    out.insert(fl.interner.get_or_intern(plain));
                }
            }
            BodyItem::Generator(gen) => {
                if let GeneratorBody::Decls(body) = &gen.body {
                    collect_constant_names(body, out, fl);
                }
            }
            BodyItem::Instance(_) => {}
        }
    }
}
