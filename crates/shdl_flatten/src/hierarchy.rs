//! Phase 5 — hierarchy flattening.
//!
//! Inlines every user-component instance depth-first: sub-component
//! primitives and internal wiring land in the parent under a `name_` prefix,
//! references to the instance's input ports fan out to the pins they fed
//! inside the sub-component, and references to its output ports chase down to
//! the primitive pin that drove them (through wire-throughs if needed).

use crate::flat::{ExpandedComponent, FlatConnection, FlatInstance, FlatSignal};
use crate::Flattener;
use shdl_common::Ident;
use shdl_diagnostics::{codes, Diagnostic};
use shdl_ir::PrimitiveKind;
use shdl_parser::ast::ComponentDecl;
use std::collections::{HashMap, HashSet};

/// The result of flattening one component body: primitives and single-bit
/// connections only. Connections may still reference this component's own
/// ports; everything else is a primitive pin.
pub(crate) struct InlinedBody {
    pub instances: Vec<FlatInstance>,
    pub connections: Vec<FlatConnection>,
}

/// Port wiring of one inlined instance, keyed by `(port, 1-based bit)`.
struct SubInfo {
    /// Input port bit → the pins it fed inside the sub-component.
    input_map: HashMap<(Ident, u32), Vec<FlatSignal>>,
    /// Output port bit → the pin that drove it inside the sub-component.
    output_map: HashMap<(Ident, u32), FlatSignal>,
    /// Output port bit → the input port bit wired straight through to it.
    wire_through: HashMap<(Ident, u32), (Ident, u32)>,
    /// Declared input port widths, for existence and range checks.
    input_widths: HashMap<Ident, u32>,
    /// Declared output port widths.
    output_widths: HashMap<Ident, u32>,
}

impl SubInfo {
    fn from_decl(decl: &ComponentDecl) -> Self {
        Self {
            input_map: HashMap::new(),
            output_map: HashMap::new(),
            wire_through: HashMap::new(),
            input_widths: decl.inputs.iter().map(|p| (p.name, p.width)).collect(),
            output_widths: decl.outputs.iter().map(|p| (p.name, p.width)).collect(),
        }
    }
}

impl Flattener<'_> {
    /// Flattens a component body, prefixing every inlined name with `prefix`.
    pub(crate) fn flatten_body(&mut self, comp: &ExpandedComponent, prefix: &str) -> InlinedBody {
        let registry = self.registry;
        let mut instances = Vec::new();
        let mut connections = Vec::new();
        let mut prim_names: HashMap<Ident, Ident> = HashMap::new();
        let mut inlined: HashMap<Ident, SubInfo> = HashMap::new();

        for inst in &comp.instances {
            let ty_text = self.interner.resolve(inst.ty);
            if PrimitiveKind::from_name(ty_text).is_some() {
                let new_name = self.prefixed(prefix, inst.name);
                prim_names.insert(inst.name, new_name);
                instances.push(FlatInstance {
                    name: new_name,
                    ty: inst.ty,
                    span: inst.span,
                });
                continue;
            }

            let Some(sub_decl) = registry.get(inst.ty) else {
                self.sink.emit(
                    Diagnostic::error(
                        codes::UNKNOWN_COMPONENT,
                        format!("unknown component type '{ty_text}'"),
                        inst.span,
                    )
                    .with_help("import it with 'use module::{…};' or check the spelling"),
                );
                continue;
            };
            self.used.insert(inst.ty);

            if self.visiting.contains(&inst.ty) {
                self.sink.emit(Diagnostic::error(
                    codes::UNKNOWN_COMPONENT,
                    format!("component '{ty_text}' instantiates itself (directly or through a cycle)"),
                    inst.span,
                ));
                continue;
            }

            self.visiting.push(inst.ty);
            let sub_expanded = self.expand_phases(sub_decl);
            let sub_prefix = format!("{prefix}{}_", self.interner.resolve(inst.name));
            let sub_body = self.flatten_body(&sub_expanded, &sub_prefix);
            self.visiting.pop();

            instances.extend(sub_body.instances);

            let mut info = SubInfo::from_decl(sub_decl);
            for conn in sub_body.connections {
                let src_is_port = conn.source.instance.is_none();
                let dst_is_port = conn.dest.instance.is_none();
                match (src_is_port, dst_is_port) {
                    (true, true) => {
                        // Wire-through: input port straight to output port.
                        if info.input_widths.contains_key(&conn.source.name)
                            && info.output_widths.contains_key(&conn.dest.name)
                        {
                            info.wire_through.insert(
                                (conn.dest.name, conn.dest.bit() as u32),
                                (conn.source.name, conn.source.bit() as u32),
                            );
                        }
                    }
                    (true, false) => {
                        info.input_map
                            .entry((conn.source.name, conn.source.bit() as u32))
                            .or_default()
                            .push(conn.dest);
                    }
                    (false, true) => {
                        info.output_map
                            .insert((conn.dest.name, conn.dest.bit() as u32), conn.source);
                    }
                    (false, false) => connections.push(conn),
                }
            }
            inlined.insert(inst.name, info);
        }

        // Who drives each inlined instance's input bits, in parent terms.
        // Needed to chase wire-throughs from the consumer side.
        let mut parent_driver: HashMap<(Ident, Ident, u32), FlatSignal> = HashMap::new();
        for conn in &comp.connections {
            if let Some(inst) = conn.dest.instance {
                parent_driver.insert(
                    (inst, conn.dest.name, conn.dest.bit() as u32),
                    conn.source.clone(),
                );
            }
        }

        for conn in &comp.connections {
            let mut visited = HashSet::new();
            let Some(source) =
                self.resolve_source(&conn.source, &inlined, &prim_names, &parent_driver, &mut visited)
            else {
                continue;
            };
            for dest in self.expand_dest(&conn.dest, &inlined, &prim_names) {
                connections.push(FlatConnection {
                    source: source.clone(),
                    dest,
                    span: conn.span,
                });
            }
        }

        InlinedBody {
            instances,
            connections,
        }
    }

    fn prefixed(&self, prefix: &str, name: Ident) -> Ident {
        if prefix.is_empty() {
            name
        } else {
            self.interner
                .get_or_intern(&format!("{prefix}{}", self.interner.resolve(name)))
        }
    }

    /// Resolves a connection source to something that exists after inlining:
    /// a primitive pin or a port bit of the current component.
    ///
    /// `None` drops the connection; the analyzer will report the resulting
    /// undriven sink if one matters.
    fn resolve_source(
        &mut self,
        sig: &FlatSignal,
        inlined: &HashMap<Ident, SubInfo>,
        prim_names: &HashMap<Ident, Ident>,
        parent_driver: &HashMap<(Ident, Ident, u32), FlatSignal>,
        visited: &mut HashSet<(Ident, Ident, u32)>,
    ) -> Option<FlatSignal> {
        let Some(inst) = sig.instance else {
            return Some(sig.clone());
        };

        if let Some(info) = inlined.get(&inst) {
            let bit = sig.bit() as u32;
            let key = (sig.name, bit);

            if let Some(pin) = info.output_map.get(&key) {
                return Some(pin.clone());
            }
            if let Some(&(in_port, in_bit)) = info.wire_through.get(&key) {
                if !visited.insert((inst, in_port, in_bit)) {
                    return None;
                }
                let upstream = parent_driver.get(&(inst, in_port, in_bit))?.clone();
                return self.resolve_source(&upstream, inlined, prim_names, parent_driver, visited);
            }
            if let Some(&w) = info.output_widths.get(&sig.name) {
                if bit > w {
                    self.sink.emit(Diagnostic::error(
                        codes::INDEX_OUT_OF_RANGE,
                        format!(
                            "bit [{bit}] is out of range for port '{}' ({w} bit(s))",
                            self.interner.resolve(sig.name)
                        ),
                        sig.span,
                    ));
                }
                // In range but undriven inside the sub-component: drop here,
                // the analyzer flags the sink this used to feed.
                return None;
            }
            if info.input_widths.contains_key(&sig.name) {
                self.sink.emit(Diagnostic::error(
                    codes::INVALID_CONNECTION,
                    format!(
                        "'{}.{}' is an input port and cannot be read from outside",
                        self.interner.resolve(inst),
                        self.interner.resolve(sig.name)
                    ),
                    sig.span,
                ));
                return None;
            }
            self.unknown_port(inst, sig);
            return None;
        }

        if let Some(&new_name) = prim_names.get(&inst) {
            return Some(FlatSignal {
                instance: Some(new_name),
                ..sig.clone()
            });
        }

        self.unknown_instance(inst, sig);
        None
    }

    /// Expands a connection destination into the pins it reaches after
    /// inlining (an input port of a sub-component fans out).
    fn expand_dest(
        &mut self,
        sig: &FlatSignal,
        inlined: &HashMap<Ident, SubInfo>,
        prim_names: &HashMap<Ident, Ident>,
    ) -> Vec<FlatSignal> {
        let Some(inst) = sig.instance else {
            return vec![sig.clone()];
        };

        if let Some(info) = inlined.get(&inst) {
            let bit = sig.bit() as u32;
            if let Some(dests) = info.input_map.get(&(sig.name, bit)) {
                return dests.clone();
            }
            if let Some(&w) = info.input_widths.get(&sig.name) {
                if bit > w {
                    self.sink.emit(Diagnostic::error(
                        codes::INDEX_OUT_OF_RANGE,
                        format!(
                            "bit [{bit}] is out of range for port '{}' ({w} bit(s))",
                            self.interner.resolve(sig.name)
                        ),
                        sig.span,
                    ));
                }
                // The input exists but feeds nothing inside the sub-component.
                return Vec::new();
            }
            if info.output_widths.contains_key(&sig.name) {
                self.sink.emit(Diagnostic::error(
                    codes::INVALID_CONNECTION,
                    format!(
                        "'{}.{}' is an output port and cannot be driven from outside",
                        self.interner.resolve(inst),
                        self.interner.resolve(sig.name)
                    ),
                    sig.span,
                ));
                return Vec::new();
            }
            self.unknown_port(inst, sig);
            return Vec::new();
        }

        if let Some(&new_name) = prim_names.get(&inst) {
            return vec![FlatSignal {
                instance: Some(new_name),
                ..sig.clone()
            }];
        }

        self.unknown_instance(inst, sig);
        Vec::new()
    }

    fn unknown_port(&self, inst: Ident, sig: &FlatSignal) {
        self.sink.emit(Diagnostic::error(
            codes::UNKNOWN_PORT,
            format!(
                "instance '{}' has no port named '{}'",
                self.interner.resolve(inst),
                self.interner.resolve(sig.name)
            ),
            sig.span,
        ));
    }

    fn unknown_instance(&self, inst: Ident, sig: &FlatSignal) {
        self.sink.emit(Diagnostic::error(
            codes::UNKNOWN_INSTANCE,
            format!("unknown instance '{}'", self.interner.resolve(inst)),
            sig.span,
        ));
    }
}
