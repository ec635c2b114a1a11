//! The five-phase flattener: Expanded SHDL → Base SHDL.
//!
//! Phase 1 is module resolution (the [`ComponentRegistry`] handed in by the
//! caller); phases 2–5 live here:
//!
//! 2. **Generator expansion** — `>v[R]{…}` unrolled, template names rendered,
//!    index arithmetic evaluated ([`generators`]).
//! 3. **Expander expansion** — bit slices unfolded into per-bit connections
//!    ([`slices`]).
//! 4. **Constant materialization** — named constants become `__VCC__` /
//!    `__GND__` instances ([`constants`]).
//! 5. **Hierarchy flattening** — user-component instances inlined
//!    recursively under `name_` prefixes ([`hierarchy`]).
//!
//! The output is a [`BaseComponent`]: primitives plus single-bit connections,
//! in an order determined purely by the source, so flattening the same design
//! twice yields identical IR.

#![warn(missing_docs)]

mod constants;
mod eval;
mod flat;
mod generators;
mod hierarchy;
mod slices;

use std::collections::{HashMap, HashSet};

use flat::{ExpandedComponent, FlatIndex, FlatItem, FlatSignal};
use hierarchy::InlinedBody;
use shdl_common::{Ident, Interner};
use shdl_diagnostics::{codes, Diagnostic, DiagnosticSink, Label};
use shdl_ir::{BaseComponent, BaseInstance, BitConnection, BitRef, Port, PrimitiveKind};
use shdl_parser::ast::ComponentDecl;
use shdl_resolve::ComponentRegistry;
use shdl_source::Span;

/// Flattens components from a resolved registry down to Base SHDL.
pub struct Flattener<'a> {
    pub(crate) registry: &'a ComponentRegistry,
    pub(crate) interner: &'a Interner,
    pub(crate) sink: &'a DiagnosticSink,
    /// Components on the current instantiation path, for recursion detection.
    pub(crate) visiting: Vec<Ident>,
    /// Every user component resolved so far (for unused-import warnings).
    pub(crate) used: HashSet<Ident>,
}

impl<'a> Flattener<'a> {
    /// Creates a flattener over a resolved registry.
    pub fn new(
        registry: &'a ComponentRegistry,
        interner: &'a Interner,
        sink: &'a DiagnosticSink,
    ) -> Self {
        Self {
            registry,
            interner,
            sink,
            visiting: Vec::new(),
            used: HashSet::new(),
        }
    }

    /// Flattens the named entry component through all phases.
    ///
    /// Returns `None` only when the entry itself cannot be found; other
    /// problems surface as diagnostics while flattening continues, so one run
    /// reports as much as possible.
    pub fn flatten(&mut self, entry: Ident) -> Option<BaseComponent> {
        let registry = self.registry;
        let Some(decl) = registry.get(entry) else {
            self.sink.emit(Diagnostic::error(
                codes::UNKNOWN_COMPONENT,
                format!(
                    "component '{}' is not defined",
                    self.interner.resolve(entry)
                ),
                Span::DUMMY,
            ));
            return None;
        };

        self.visiting.push(entry);
        let expanded = self.expand_phases(decl);
        let body = self.flatten_body(&expanded, "");
        self.visiting.pop();

        Some(self.to_base(&expanded, body))
    }

    /// Component types resolved during flattening.
    pub fn used_components(&self) -> &HashSet<Ident> {
        &self.used
    }

    /// Phases 2–4 for one component.
    pub(crate) fn expand_phases(&mut self, decl: &ComponentDecl) -> ExpandedComponent {
        let (items, connections) = self.expand_generators(decl);
        self.check_duplicate_instances(&items);

        let const_widths = self.constant_widths(&items);
        let instance_types: HashMap<Ident, Ident> = items
            .iter()
            .filter_map(|item| match item {
                FlatItem::Instance(inst) => Some((inst.name, inst.ty)),
                FlatItem::Constant(_) => None,
            })
            .collect();

        let env = slices::WidthEnv {
            decl,
            constants: &const_widths,
            instance_types: &instance_types,
        };
        let connections = self.expand_slices(connections, &env);
        let (instances, connections) =
            self.materialize_constants(items, connections, &const_widths);

        ExpandedComponent {
            name: decl.name,
            inputs: decl.inputs.clone(),
            outputs: decl.outputs.clone(),
            instances,
            connections,
        }
    }

    fn check_duplicate_instances(&mut self, items: &[FlatItem]) {
        let mut seen: HashMap<Ident, Span> = HashMap::new();
        for item in items {
            if let FlatItem::Instance(inst) = item {
                if let Some(&first) = seen.get(&inst.name) {
                    self.sink.emit(
                        Diagnostic::error(
                            codes::DUPLICATE_INSTANCE,
                            format!(
                                "instance '{}' is declared more than once",
                                self.interner.resolve(inst.name)
                            ),
                            inst.span,
                        )
                        .with_label(Label::secondary(first, "first declared here")),
                    );
                } else {
                    seen.insert(inst.name, inst.span);
                }
            }
        }
    }

    /// Converts a flattened body into the Base IR.
    fn to_base(&mut self, expanded: &ExpandedComponent, body: InlinedBody) -> BaseComponent {
        let to_port = |p: &shdl_parser::ast::PortDecl| Port {
            name: p.name,
            width: p.width,
            span: p.span,
        };
        let mut comp = BaseComponent::new(
            expanded.name,
            expanded.inputs.iter().map(to_port).collect(),
            expanded.outputs.iter().map(to_port).collect(),
        );

        for inst in body.instances {
            // Non-primitives were reported and dropped in phase 5.
            if let Some(kind) = PrimitiveKind::from_name(self.interner.resolve(inst.ty)) {
                comp.instances.alloc(BaseInstance {
                    name: inst.name,
                    kind,
                    span: inst.span,
                });
            }
        }

        for conn in body.connections {
            let source = self.to_bit_ref(&conn.source);
            let dest = self.to_bit_ref(&conn.dest);
            if let (Some(source), Some(dest)) = (source, dest) {
                comp.connections.push(BitConnection {
                    source,
                    dest,
                    span: conn.span,
                });
            }
        }

        comp
    }

    fn to_bit_ref(&mut self, sig: &FlatSignal) -> Option<BitRef> {
        match sig.instance {
            Some(instance) => {
                if let Some(FlatIndex::Bit(n)) = sig.index {
                    if n > 1 {
                        self.sink.emit(Diagnostic::error(
                            codes::INDEX_OUT_OF_RANGE,
                            format!(
                                "primitive pins are single-bit; [{n}] is out of range"
                            ),
                            sig.span,
                        ));
                        return None;
                    }
                }
                Some(BitRef::Pin {
                    instance,
                    pin: sig.name,
                })
            }
            None => {
                let bit = sig.bit();
                if bit < 1 {
                    return None;
                }
                Some(BitRef::PortBit {
                    port: sig.name,
                    bit: bit as u32,
                })
            }
        }
    }
}
