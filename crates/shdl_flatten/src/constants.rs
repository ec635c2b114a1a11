//! Phase 4 — constant materialization.
//!
//! Each named constant becomes one `__VCC__` or `__GND__` instance per bit,
//! named `{constant}_bit{n}`, and every reference `C[n]` rewrites to
//! `C_bitn.O`. After this phase no named constants remain.

use crate::flat::{FlatConnection, FlatInstance, FlatItem, FlatSignal};
use crate::Flattener;
use shdl_common::Ident;
use shdl_diagnostics::{codes, Diagnostic};
use shdl_source::Span;
use std::collections::HashMap;

/// The width a constant occupies: explicit if declared, else
/// `⌈log₂(value+1)⌉` with zero taking one bit.
pub(crate) fn constant_width(value: u64, explicit: Option<u32>) -> u32 {
    match explicit {
        Some(w) => w,
        None => {
            if value == 0 {
                1
            } else {
                64 - value.leading_zeros()
            }
        }
    }
}

impl Flattener<'_> {
    /// Computes the width of every constant in the item list, reporting
    /// duplicates and overflow. Used both for slice resolution (phase 3)
    /// and materialization (phase 4).
    pub(crate) fn constant_widths(&mut self, items: &[FlatItem]) -> HashMap<Ident, u32> {
        let mut widths = HashMap::new();
        for item in items {
            if let FlatItem::Constant(c) = item {
                if widths.contains_key(&c.name) {
                    self.sink.emit(Diagnostic::error(
                        codes::DUPLICATE_CONSTANT,
                        format!(
                            "constant '{}' is declared more than once",
                            self.interner.resolve(c.name)
                        ),
                        c.span,
                    ));
                    continue;
                }
                if let Some(w) = c.width {
                    if w < 64 && c.value >> w != 0 {
                        self.sink.emit(
                            Diagnostic::error(
                                codes::CONSTANT_OVERFLOW,
                                format!(
                                    "value {} does not fit in {w} bits",
                                    c.value
                                ),
                                c.span,
                            )
                            .with_note(format!("{} bits are required", constant_width(c.value, None))),
                        );
                    }
                } else if c.value == 0 {
                    self.sink.emit(
                        Diagnostic::warning(
                            codes::IMPLICIT_WIDTH,
                            format!(
                                "constant '{}' is zero and gets an inferred width of 1",
                                self.interner.resolve(c.name)
                            ),
                            c.span,
                        )
                        .with_help("declare an explicit width if more bits are wanted"),
                    );
                }
                widths.insert(c.name, constant_width(c.value, c.width));
            }
        }
        widths
    }

    /// Replaces constants with per-bit source instances and rewrites every
    /// reference to them. Instance order follows the declaration order of
    /// the item list.
    pub(crate) fn materialize_constants(
        &mut self,
        items: Vec<FlatItem>,
        connections: Vec<FlatConnection>,
        widths: &HashMap<Ident, u32>,
    ) -> (Vec<FlatInstance>, Vec<FlatConnection>) {
        let vcc = self.interner.get_or_intern("__VCC__");
        let gnd = self.interner.get_or_intern("__GND__");
        let pin_o = self.interner.get_or_intern("O");

        let mut instances = Vec::new();
        let mut values: HashMap<Ident, (u64, u32, Span)> = HashMap::new();
        let mut decl_order = Vec::new();

        for item in items {
            match item {
                FlatItem::Instance(inst) => instances.push(inst),
                FlatItem::Constant(c) => {
                    if values.contains_key(&c.name) {
                        // Duplicate already reported by constant_widths.
                        continue;
                    }
                    let width = widths.get(&c.name).copied().unwrap_or(1);
                    for bit in 1..=width {
                        let bit_value = (c.value >> (bit - 1)) & 1;
                        let kind = if bit_value == 1 { vcc } else { gnd };
                        let name = self
                            .interner
                            .get_or_intern(&format!("{}_bit{bit}", self.interner.resolve(c.name)));
                        instances.push(FlatInstance {
                            name,
                            ty: kind,
                            span: c.span,
                        });
                    }
                    values.insert(c.name, (c.value, width, c.span));
                    decl_order.push((c.name, c.span));
                }
            }
        }

        let mut referenced: std::collections::HashSet<Ident> = std::collections::HashSet::new();
        let mut rewritten = Vec::new();
        for conn in connections {
            for side in [&conn.source, &conn.dest] {
                if side.instance.is_none() && values.contains_key(&side.name) {
                    referenced.insert(side.name);
                }
            }
            let source = self.rewrite_constant_ref(conn.source, &values, pin_o);
            let dest = self.rewrite_constant_ref(conn.dest, &values, pin_o);
            if let (Some(source), Some(dest)) = (source, dest) {
                rewritten.push(FlatConnection {
                    source,
                    dest,
                    span: conn.span,
                });
            }
        }

        for (name, span) in decl_order {
            if !referenced.contains(&name) {
                self.sink.emit(Diagnostic::warning(
                    codes::UNUSED_CONSTANT,
                    format!(
                        "constant '{}' is never referenced",
                        self.interner.resolve(name)
                    ),
                    span,
                ));
            }
        }

        (instances, rewritten)
    }

    fn rewrite_constant_ref(
        &mut self,
        sig: FlatSignal,
        values: &HashMap<Ident, (u64, u32, Span)>,
        pin_o: Ident,
    ) -> Option<FlatSignal> {
        if sig.instance.is_some() {
            return Some(sig);
        }
        let Some(&(_, width, _)) = values.get(&sig.name) else {
            return Some(sig);
        };

        let bit = sig.bit();
        if bit < 1 || bit as u64 > width as u64 {
            self.sink.emit(
                Diagnostic::error(
                    codes::CONSTANT_WIDTH,
                    format!(
                        "constant '{}' has {width} bit(s); bit [{bit}] does not exist",
                        self.interner.resolve(sig.name)
                    ),
                    sig.span,
                )
                .with_help("declare an explicit width, e.g. 'C[8] = …;'"),
            );
            return None;
        }

        let instance = self
            .interner
            .get_or_intern(&format!("{}_bit{bit}", self.interner.resolve(sig.name)));
        Some(FlatSignal {
            instance: Some(instance),
            name: pin_o,
            index: None,
            span: sig.span,
        })
    }
}
