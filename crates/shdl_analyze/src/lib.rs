//! Semantic analysis of Base SHDL.
//!
//! Builds the **driver map** — every sink (primitive input pin, output port
//! bit) mapped to its unique source — and checks the wiring rules: exactly
//! one driver per sink, all references resolving to real declarations with
//! in-range bit indices, and direction discipline at both the component
//! boundary and primitive pins. Combinational feedback is detected and
//! recorded, never rejected: cross-coupled gates are how SHDL expresses
//! state.
//!
//! The [`AnalyzedComponent`] this produces is the only input codegen and the
//! interpreter need.

#![warn(missing_docs)]

mod drivers;
mod feedback;

use std::collections::HashMap;

use shdl_common::{Ident, Interner};
use shdl_diagnostics::{codes, Diagnostic, DiagnosticSink, Label};
use shdl_ir::{BaseComponent, BitRef, InstanceId, PrimitiveKind};

pub use drivers::DriverMap;
pub use feedback::feedback_instances;

/// A Base component together with its validated driver map.
pub struct AnalyzedComponent {
    /// The component, unchanged.
    pub component: BaseComponent,
    /// Sink → unique source. Complete when no errors were emitted.
    pub drivers: DriverMap,
    /// Instances on a combinational cycle (latches and their kin).
    pub feedback: Vec<InstanceId>,
}

impl AnalyzedComponent {
    /// The unique driver of a sink, if the analysis found one.
    pub fn driver_of(&self, sink: &BitRef) -> Option<&BitRef> {
        self.drivers.get(sink)
    }
}

/// Runs all checks over a flattened component.
///
/// Every problem is reported through the sink; callers gate on
/// `sink.has_errors()` before handing the result to codegen.
pub fn analyze(
    component: BaseComponent,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> AnalyzedComponent {
    let analyzer = Analyzer {
        component: &component,
        interner,
        sink,
        instances: index_instances(&component, interner, sink),
    };

    let drivers = analyzer.build_driver_map();
    analyzer.check_unconnected_inputs(&drivers);
    analyzer.check_undriven_outputs(&drivers);
    analyzer.warn_unread_outputs(&drivers);
    analyzer.warn_unused_inputs();

    let feedback = feedback_instances(&component);

    AnalyzedComponent {
        component,
        drivers,
        feedback,
    }
}

struct Analyzer<'a> {
    component: &'a BaseComponent,
    interner: &'a Interner,
    sink: &'a DiagnosticSink,
    /// Instance name → (id, kind).
    instances: HashMap<Ident, (InstanceId, PrimitiveKind)>,
}

fn index_instances(
    component: &BaseComponent,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> HashMap<Ident, (InstanceId, PrimitiveKind)> {
    let mut map = HashMap::new();
    for (id, inst) in component.instances.iter() {
        if map.insert(inst.name, (id, inst.kind)).is_some() {
            sink.emit(Diagnostic::error(
                codes::DUPLICATE_INSTANCE,
                format!(
                    "instance '{}' is declared more than once",
                    interner.resolve(inst.name)
                ),
                inst.span,
            ));
        }
    }
    map
}

impl Analyzer<'_> {
    fn build_driver_map(&self) -> DriverMap {
        let mut drivers = DriverMap::new();
        for conn in &self.component.connections {
            let src_ok = self.check_source(&conn.source, conn.span);
            let dst_ok = self.check_dest(&conn.dest, conn.span);
            if !(src_ok && dst_ok) {
                continue;
            }
            if let Some(first_span) = drivers.insert(conn.dest, conn.source, conn.span) {
                self.sink.emit(
                    Diagnostic::error(
                        codes::MULTIPLE_DRIVERS,
                        format!(
                            "'{}' has more than one driver",
                            self.fmt_ref(&conn.dest)
                        ),
                        conn.span,
                    )
                    .with_label(Label::secondary(first_span, "first driven here"))
                    .with_note("every primitive input and output bit must have exactly one source"),
                );
            }
        }
        drivers
    }

    /// A source must be an input-port bit or a primitive output pin.
    fn check_source(&self, source: &BitRef, span: shdl_source::Span) -> bool {
        match source {
            BitRef::PortBit { port, bit } => {
                if let Some(p) = self.component.input(*port) {
                    self.check_bit_range(*port, *bit, p.width, span)
                } else if self.component.output(*port).is_some() {
                    self.sink.emit(Diagnostic::error(
                        codes::READ_FROM_OUTPUT,
                        format!(
                            "output port '{}' cannot be used as a source",
                            self.interner.resolve(*port)
                        ),
                        span,
                    ));
                    false
                } else {
                    self.unknown_port(*port, span);
                    false
                }
            }
            BitRef::Pin { instance, pin } => {
                let Some((_, kind)) = self.lookup_instance(*instance, span) else {
                    return false;
                };
                if self.interner.resolve(*pin) == "O" {
                    true
                } else if kind.input_pins().contains(&self.interner.resolve(*pin)) {
                    self.sink.emit(Diagnostic::error(
                        codes::INVALID_CONNECTION,
                        format!(
                            "'{}' is an input pin and cannot be used as a source",
                            self.fmt_ref(source)
                        ),
                        span,
                    ));
                    false
                } else {
                    self.bad_pin(*instance, *pin, kind, span);
                    false
                }
            }
        }
    }

    /// A destination must be an output-port bit or a primitive input pin.
    fn check_dest(&self, dest: &BitRef, span: shdl_source::Span) -> bool {
        match dest {
            BitRef::PortBit { port, bit } => {
                if let Some(p) = self.component.output(*port) {
                    self.check_bit_range(*port, *bit, p.width, span)
                } else if self.component.input(*port).is_some() {
                    self.sink.emit(Diagnostic::error(
                        codes::WRITE_TO_INPUT,
                        format!(
                            "input port '{}' cannot be used as a destination",
                            self.interner.resolve(*port)
                        ),
                        span,
                    ));
                    false
                } else {
                    self.unknown_port(*port, span);
                    false
                }
            }
            BitRef::Pin { instance, pin } => {
                let Some((_, kind)) = self.lookup_instance(*instance, span) else {
                    return false;
                };
                if kind.input_pins().contains(&self.interner.resolve(*pin)) {
                    true
                } else if self.interner.resolve(*pin) == "O" {
                    self.sink.emit(Diagnostic::error(
                        codes::INVALID_CONNECTION,
                        format!("'{}' is an output pin and cannot be driven", self.fmt_ref(dest)),
                        span,
                    ));
                    false
                } else {
                    self.bad_pin(*instance, *pin, kind, span);
                    false
                }
            }
        }
    }

    fn check_bit_range(&self, port: Ident, bit: u32, width: u32, span: shdl_source::Span) -> bool {
        if bit < 1 || bit > width {
            self.sink.emit(Diagnostic::error(
                codes::INDEX_OUT_OF_RANGE,
                format!(
                    "bit index {bit} is out of range for port '{}' (valid range: 1-{width})",
                    self.interner.resolve(port)
                ),
                span,
            ));
            return false;
        }
        true
    }

    fn lookup_instance(
        &self,
        name: Ident,
        span: shdl_source::Span,
    ) -> Option<(InstanceId, PrimitiveKind)> {
        match self.instances.get(&name) {
            Some(&entry) => Some(entry),
            None => {
                self.sink.emit(Diagnostic::error(
                    codes::UNKNOWN_INSTANCE,
                    format!("unknown instance '{}'", self.interner.resolve(name)),
                    span,
                ));
                None
            }
        }
    }

    fn unknown_port(&self, port: Ident, span: shdl_source::Span) {
        self.sink.emit(Diagnostic::error(
            codes::UNKNOWN_PORT,
            format!("unknown port '{}'", self.interner.resolve(port)),
            span,
        ));
    }

    fn bad_pin(&self, instance: Ident, pin: Ident, kind: PrimitiveKind, span: shdl_source::Span) {
        let valid: Vec<&str> = kind
            .input_pins()
            .iter()
            .copied()
            .chain(std::iter::once("O"))
            .collect();
        self.sink.emit(Diagnostic::error(
            codes::UNKNOWN_PORT,
            format!(
                "primitive '{}' ({}) has no pin '{}' (valid pins: {})",
                self.interner.resolve(instance),
                kind,
                self.interner.resolve(pin),
                valid.join(", ")
            ),
            span,
        ));
    }

    /// Every input pin of every gate needs exactly one driver (`E0501` when
    /// it has none; multiples were caught while building the map).
    fn check_unconnected_inputs(&self, drivers: &DriverMap) {
        for inst in self.component.instances.values() {
            for pin_name in inst.kind.input_pins() {
                let pin = self.interner.get_or_intern(pin_name);
                let sink_ref = BitRef::Pin {
                    instance: inst.name,
                    pin,
                };
                if drivers.get(&sink_ref).is_none() {
                    self.sink.emit(
                        Diagnostic::error(
                            codes::UNCONNECTED_INPUT,
                            format!(
                                "input '{}.{pin_name}' is not connected",
                                self.interner.resolve(inst.name)
                            ),
                            inst.span,
                        )
                        .with_note("every primitive input must have exactly one driver"),
                    );
                }
            }
        }
    }

    /// Every declared output bit needs a driver (`E0502`).
    fn check_undriven_outputs(&self, drivers: &DriverMap) {
        for port in &self.component.outputs {
            for bit in 1..=port.width {
                let sink_ref = BitRef::PortBit {
                    port: port.name,
                    bit,
                };
                if drivers.get(&sink_ref).is_none() {
                    self.sink.emit(Diagnostic::error(
                        codes::UNDRIVEN_OUTPUT,
                        format!(
                            "output '{}[{bit}]' is never driven",
                            self.interner.resolve(port.name)
                        ),
                        port.span,
                    ));
                }
            }
        }
    }

    /// `W0107` for gate outputs that feed nothing.
    fn warn_unread_outputs(&self, drivers: &DriverMap) {
        for inst in self.component.instances.values() {
            if inst.kind.is_constant() {
                continue;
            }
            let o = self.interner.get_or_intern("O");
            let source = BitRef::Pin {
                instance: inst.name,
                pin: o,
            };
            if !drivers.reads(&source) {
                self.sink.emit(Diagnostic::warning(
                    codes::UNREAD_OUTPUT,
                    format!(
                        "output of '{}' is never read",
                        self.interner.resolve(inst.name)
                    ),
                    inst.span,
                ));
            }
        }
    }

    /// `W0101` for input ports no bit of which is read.
    fn warn_unused_inputs(&self) {
        use std::collections::HashSet;
        let mut read_ports: HashSet<Ident> = HashSet::new();
        for conn in &self.component.connections {
            if let BitRef::PortBit { port, .. } = conn.source {
                read_ports.insert(port);
            }
        }
        for port in &self.component.inputs {
            if !read_ports.contains(&port.name) {
                self.sink.emit(Diagnostic::warning(
                    codes::UNUSED_PORT,
                    format!(
                        "input port '{}' is never used",
                        self.interner.resolve(port.name)
                    ),
                    port.span,
                ));
            }
        }
    }

    fn fmt_ref(&self, bit_ref: &BitRef) -> String {
        match bit_ref {
            BitRef::PortBit { port, bit } => {
                format!("{}[{bit}]", self.interner.resolve(*port))
            }
            BitRef::Pin { instance, pin } => format!(
                "{}.{}",
                self.interner.resolve(*instance),
                self.interner.resolve(*pin)
            ),
        }
    }
}
