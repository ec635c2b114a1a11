//! The flat component: ports, primitive instances, single-bit connections.

use crate::arena::Arena;
use crate::ids::InstanceId;
use crate::primitive::PrimitiveKind;
use serde::{Deserialize, Serialize};
use shdl_common::{Ident, Interner};
use shdl_source::Span;

/// A component port in the Base IR. Widths survive flattening; bit indices
/// are 1-based, bit 1 being the LSB.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Port {
    /// Port name.
    pub name: Ident,
    /// Width in bits, at least 1.
    pub width: u32,
    /// Span of the original declaration.
    pub span: Span,
}

/// A primitive instance. Names are globally unique within the component and
/// encode their origin path (`fa2_ha1_x`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BaseInstance {
    /// Flattened instance name.
    pub name: Ident,
    /// The primitive this instance is.
    pub kind: PrimitiveKind,
    /// Span of the pre-expansion declaration.
    pub span: Span,
}

/// One end of a single-bit connection.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BitRef {
    /// A bit of a component port (`In[3]`; `bit` is 1-based).
    PortBit {
        /// The port.
        port: Ident,
        /// The 1-based bit index.
        bit: u32,
    },
    /// A primitive pin (`fa1_x.O`).
    Pin {
        /// The instance, by flattened name.
        instance: Ident,
        /// The pin: `A`, `B`, or `O`.
        pin: Ident,
    },
}

/// A single-bit connection `source -> dest`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BitConnection {
    /// The driving end.
    pub source: BitRef,
    /// The driven end.
    pub dest: BitRef,
    /// Span of the pre-expansion connection statement.
    pub span: Span,
}

/// A fully flattened component: the original port lists plus primitives and
/// single-bit wires. This is the only structure the analyzer and code
/// generator ever see.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BaseComponent {
    /// Component name.
    pub name: Ident,
    /// Input ports, in declaration order.
    pub inputs: Vec<Port>,
    /// Output ports, in declaration order.
    pub outputs: Vec<Port>,
    /// Primitive instances, in deterministic flattening order.
    pub instances: Arena<InstanceId, BaseInstance>,
    /// Single-bit connections, in deterministic flattening order.
    pub connections: Vec<BitConnection>,
}

impl BaseComponent {
    /// Creates an empty component with the given ports.
    pub fn new(name: Ident, inputs: Vec<Port>, outputs: Vec<Port>) -> Self {
        Self {
            name,
            inputs,
            outputs,
            instances: Arena::new(),
            connections: Vec::new(),
        }
    }

    /// Finds an instance by its flattened name.
    pub fn find_instance(&self, name: Ident) -> Option<InstanceId> {
        self.instances
            .iter()
            .find(|(_, inst)| inst.name == name)
            .map(|(id, _)| id)
    }

    /// Finds an input port by name.
    pub fn input(&self, name: Ident) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Finds an output port by name.
    pub fn output(&self, name: Ident) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Formats the component as Base SHDL source text.
    ///
    /// The layout matches what `shdlc --emit-base` prints: the header, one
    /// instance per line, then the connect block.
    pub fn to_base_shdl(&self, interner: &Interner) -> String {
        let mut out = String::new();

        let fmt_ports = |ports: &[Port]| {
            ports
                .iter()
                .map(|p| {
                    if p.width == 1 {
                        interner.resolve(p.name).to_string()
                    } else {
                        format!("{}[{}]", interner.resolve(p.name), p.width)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ")
        };

        out.push_str(&format!(
            "component {}({}) -> ({}) {{\n",
            interner.resolve(self.name),
            fmt_ports(&self.inputs),
            fmt_ports(&self.outputs),
        ));

        for inst in self.instances.values() {
            out.push_str(&format!(
                "    {}: {};\n",
                interner.resolve(inst.name),
                inst.kind
            ));
        }

        if !self.connections.is_empty() {
            out.push_str("\n    connect {\n");
            for conn in &self.connections {
                out.push_str(&format!(
                    "        {} -> {};\n",
                    self.fmt_bit_ref(&conn.source, interner),
                    self.fmt_bit_ref(&conn.dest, interner)
                ));
            }
            out.push_str("    }\n");
        }

        out.push_str("}\n");
        out
    }

    fn fmt_bit_ref(&self, bit_ref: &BitRef, interner: &Interner) -> String {
        match bit_ref {
            BitRef::PortBit { port, bit } => {
                let width = self
                    .input(*port)
                    .or_else(|| self.output(*port))
                    .map(|p| p.width)
                    .unwrap_or(1);
                if width == 1 {
                    interner.resolve(*port).to_string()
                } else {
                    format!("{}[{}]", interner.resolve(*port), bit)
                }
            }
            BitRef::Pin { instance, pin } => {
                format!("{}.{}", interner.resolve(*instance), interner.resolve(*pin))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_adder(interner: &Interner) -> BaseComponent {
        let mut comp = BaseComponent::new(
            interner.get_or_intern("HA"),
            vec![
                Port {
                    name: interner.get_or_intern("A"),
                    width: 1,
                    span: Span::DUMMY,
                },
                Port {
                    name: interner.get_or_intern("B"),
                    width: 1,
                    span: Span::DUMMY,
                },
            ],
            vec![
                Port {
                    name: interner.get_or_intern("Sum"),
                    width: 1,
                    span: Span::DUMMY,
                },
                Port {
                    name: interner.get_or_intern("Carry"),
                    width: 1,
                    span: Span::DUMMY,
                },
            ],
        );
        comp.instances.alloc(BaseInstance {
            name: interner.get_or_intern("x"),
            kind: PrimitiveKind::Xor,
            span: Span::DUMMY,
        });
        comp.instances.alloc(BaseInstance {
            name: interner.get_or_intern("a"),
            kind: PrimitiveKind::And,
            span: Span::DUMMY,
        });
        let pin = |inst: &str, pin: &str| BitRef::Pin {
            instance: interner.get_or_intern(inst),
            pin: interner.get_or_intern(pin),
        };
        let port = |name: &str| BitRef::PortBit {
            port: interner.get_or_intern(name),
            bit: 1,
        };
        for (src, dst) in [
            (port("A"), pin("x", "A")),
            (port("B"), pin("x", "B")),
            (port("A"), pin("a", "A")),
            (port("B"), pin("a", "B")),
            (pin("x", "O"), port("Sum")),
            (pin("a", "O"), port("Carry")),
        ] {
            comp.connections.push(BitConnection {
                source: src,
                dest: dst,
                span: Span::DUMMY,
            });
        }
        comp
    }

    #[test]
    fn find_instance_by_name() {
        let interner = Interner::new();
        let comp = half_adder(&interner);
        let x = interner.get_or_intern("x");
        assert!(comp.find_instance(x).is_some());
        assert!(comp
            .find_instance(interner.get_or_intern("missing"))
            .is_none());
    }

    #[test]
    fn port_lookup() {
        let interner = Interner::new();
        let comp = half_adder(&interner);
        assert!(comp.input(interner.get_or_intern("A")).is_some());
        assert!(comp.output(interner.get_or_intern("Sum")).is_some());
        assert!(comp.input(interner.get_or_intern("Sum")).is_none());
    }

    #[test]
    fn base_shdl_formatting() {
        let interner = Interner::new();
        let comp = half_adder(&interner);
        let text = comp.to_base_shdl(&interner);
        assert!(text.starts_with("component HA(A, B) -> (Sum, Carry) {"));
        assert!(text.contains("    x: XOR;\n"));
        assert!(text.contains("    a: AND;\n"));
        assert!(text.contains("        A -> x.A;\n"));
        assert!(text.contains("        x.O -> Sum;\n"));
        assert!(text.trim_end().ends_with('}'));
    }

    #[test]
    fn multi_bit_ports_keep_indices() {
        let interner = Interner::new();
        let mut comp = BaseComponent::new(
            interner.get_or_intern("Buf"),
            vec![Port {
                name: interner.get_or_intern("In"),
                width: 4,
                span: Span::DUMMY,
            }],
            vec![Port {
                name: interner.get_or_intern("Out"),
                width: 4,
                span: Span::DUMMY,
            }],
        );
        comp.connections.push(BitConnection {
            source: BitRef::PortBit {
                port: interner.get_or_intern("In"),
                bit: 3,
            },
            dest: BitRef::PortBit {
                port: interner.get_or_intern("Out"),
                bit: 3,
            },
            span: Span::DUMMY,
        });
        let text = comp.to_base_shdl(&interner);
        assert!(text.contains("In[3] -> Out[3];"));
        assert!(text.contains("In[4]"));
    }

    #[test]
    fn serde_roundtrip() {
        let interner = Interner::new();
        let comp = half_adder(&interner);
        let json = serde_json::to_string(&comp).unwrap();
        let back: BaseComponent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.instances.len(), 2);
        assert_eq!(back.connections.len(), 6);
    }
}
