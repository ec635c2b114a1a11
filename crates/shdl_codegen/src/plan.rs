//! The kernel plan: everything the emitter (and the in-process interpreter)
//! needs, precomputed from the analyzed component.
//!
//! Building the plan resolves every driver to a [`SourceBit`], groups gather
//! contributions into per-source masks, and fixes the canonical emission
//! order. The C emitter and `shdl_sim` both consume this structure, which is
//! what keeps the interpreter cycle-accurate against the compiled artifact.

use shdl_analyze::AnalyzedComponent;
use shdl_common::{InternalError, Interner, ShdlResult};
use shdl_ir::{BitRef, PrimitiveKind};

use crate::lanes::LaneMap;

/// Where one bit of kernel input comes from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SourceBit {
    /// Bit `bit` (1-based) of the input port at declaration index `port`.
    Input {
        /// Index into [`KernelPlan::inputs`].
        port: usize,
        /// 1-based bit index.
        bit: u32,
    },
    /// A lane of a state word from the previous cycle.
    Gate {
        /// The state word's kind.
        kind: PrimitiveKind,
        /// The chunk index.
        chunk: u32,
        /// The lane within the chunk.
        lane: u32,
    },
    /// A constant (VCC / GND lane).
    Const(bool),
}

/// One gather line: deposit `source` into every lane of `mask`.
#[derive(Clone, Debug)]
pub struct Gather {
    /// The bit being deposited.
    pub source: SourceBit,
    /// The lanes receiving it.
    pub mask: u64,
}

/// The evaluation plan for one `(kind, chunk)` state word.
#[derive(Clone, Debug)]
pub struct ChunkPlan {
    /// The gate kind.
    pub kind: PrimitiveKind,
    /// The chunk index within the kind.
    pub chunk: u32,
    /// Mask of occupied lanes.
    pub active_mask: u64,
    /// Gathers for the A input vector.
    pub a: Vec<Gather>,
    /// Gathers for the B input vector (empty for NOT).
    pub b: Vec<Gather>,
}

/// A port's resolved name and width.
#[derive(Clone, Debug)]
pub struct PortInfo {
    /// The port name as written in source.
    pub name: String,
    /// Width in bits.
    pub width: u32,
}

/// The full kernel plan for one component.
pub struct KernelPlan {
    /// The component name.
    pub name: String,
    /// Input ports in declaration order.
    pub inputs: Vec<PortInfo>,
    /// Output ports in declaration order.
    pub outputs: Vec<PortInfo>,
    /// State-word plans in canonical kind order, then chunk order.
    pub chunks: Vec<ChunkPlan>,
    /// Per output port, per bit (index 0 is bit 1): the bit's source.
    pub output_bits: Vec<Vec<SourceBit>>,
}

impl KernelPlan {
    /// The internal introspection names, one per state word (`XOR_O_0`, …).
    pub fn state_word_names(&self) -> Vec<String> {
        self.chunks
            .iter()
            .map(|c| format!("{}_O_{}", c.kind.state_name(), c.chunk))
            .collect()
    }
}

/// Builds the plan. The component must have passed analysis with no errors;
/// a missing driver here is an internal invariant violation, not a user
/// error.
pub fn build_plan(analyzed: &AnalyzedComponent, interner: &Interner) -> ShdlResult<KernelPlan> {
    let component = &analyzed.component;
    let lanes = LaneMap::build(component);

    let inputs: Vec<PortInfo> = component
        .inputs
        .iter()
        .map(|p| PortInfo {
            name: interner.resolve(p.name).to_string(),
            width: p.width,
        })
        .collect();
    let outputs: Vec<PortInfo> = component
        .outputs
        .iter()
        .map(|p| PortInfo {
            name: interner.resolve(p.name).to_string(),
            width: p.width,
        })
        .collect();

    let source_bit = |bit_ref: &BitRef| -> ShdlResult<SourceBit> {
        match bit_ref {
            BitRef::PortBit { port, bit } => {
                let idx = component
                    .inputs
                    .iter()
                    .position(|p| p.name == *port)
                    .ok_or_else(|| {
                        InternalError::new("driver references a non-input port after analysis")
                    })?;
                Ok(SourceBit::Input {
                    port: idx,
                    bit: *bit,
                })
            }
            BitRef::Pin { instance, pin: _ } => {
                let id = component.find_instance(*instance).ok_or_else(|| {
                    InternalError::new("driver references an unknown instance after analysis")
                })?;
                let lane = lanes
                    .lane(id)
                    .ok_or_else(|| InternalError::new("instance missing from the lane map"))?;
                Ok(match lane.kind {
                    PrimitiveKind::Vcc => SourceBit::Const(true),
                    PrimitiveKind::Gnd => SourceBit::Const(false),
                    kind => SourceBit::Gate {
                        kind,
                        chunk: lane.chunk,
                        lane: lane.lane,
                    },
                })
            }
        }
    };

    let mut chunks = Vec::new();
    for kind in PrimitiveKind::ALL {
        if !kind.has_state_word() {
            continue;
        }
        for chunk in 0..lanes.chunk_count(kind) {
            let mut plan = ChunkPlan {
                kind,
                chunk,
                active_mask: lanes.active_mask(kind, chunk),
                a: Vec::new(),
                b: Vec::new(),
            };
            let ids = lanes.instances_of(kind);
            let start = chunk as usize * 64;
            let end = (start + 64).min(ids.len());
            for &id in &ids[start..end] {
                let inst = component.instances.get(id);
                let lane = lanes
                    .lane(id)
                    .ok_or_else(|| InternalError::new("instance missing from the lane map"))?;
                for (pin_idx, pin_name) in kind.input_pins().iter().enumerate() {
                    let pin = interner.get_or_intern(pin_name);
                    let sink_ref = BitRef::Pin {
                        instance: inst.name,
                        pin,
                    };
                    let driver = analyzed.driver_of(&sink_ref).ok_or_else(|| {
                        InternalError::new(format!(
                            "no driver for {}.{pin_name} after clean analysis",
                            interner.resolve(inst.name)
                        ))
                    })?;
                    let source = source_bit(driver)?;
                    let gathers = if pin_idx == 0 { &mut plan.a } else { &mut plan.b };
                    deposit(gathers, source, 1u64 << lane.lane);
                }
            }
            chunks.push(plan);
        }
    }

    let mut output_bits = Vec::new();
    for port in &component.outputs {
        let mut bits = Vec::new();
        for bit in 1..=port.width {
            let sink_ref = BitRef::PortBit {
                port: port.name,
                bit,
            };
            let driver = analyzed.driver_of(&sink_ref).ok_or_else(|| {
                InternalError::new(format!(
                    "no driver for output {}[{bit}] after clean analysis",
                    interner.resolve(port.name)
                ))
            })?;
            bits.push(source_bit(driver)?);
        }
        output_bits.push(bits);
    }

    Ok(KernelPlan {
        name: interner.resolve(component.name).to_string(),
        inputs,
        outputs,
        chunks,
        output_bits,
    })
}

/// Merges a contribution into the gather list, keeping one entry per
/// distinct source in first-appearance (lane) order.
fn deposit(gathers: &mut Vec<Gather>, source: SourceBit, lane_mask: u64) {
    // A GND lane contributes nothing to an OR of masked bits.
    if source == SourceBit::Const(false) {
        return;
    }
    for g in gathers.iter_mut() {
        if g.source == source {
            g.mask |= lane_mask;
            return;
        }
    }
    gathers.push(Gather {
        source,
        mask: lane_mask,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use shdl_analyze::analyze;
    use shdl_diagnostics::DiagnosticSink;
    use shdl_ir::{BaseComponent, BaseInstance, BitConnection, Port};
    use shdl_source::Span;

    fn analyzed_half_adder() -> (AnalyzedComponent, Interner) {
        let interner = Interner::new();
        let port = |name: &str| Port {
            name: interner.get_or_intern(name),
            width: 1,
            span: Span::DUMMY,
        };
        let mut comp = BaseComponent::new(
            interner.get_or_intern("HA"),
            vec![port("A"), port("B")],
            vec![port("Sum"), port("Carry")],
        );
        for (name, kind) in [("x", PrimitiveKind::Xor), ("a", PrimitiveKind::And)] {
            comp.instances.alloc(BaseInstance {
                name: interner.get_or_intern(name),
                kind,
                span: Span::DUMMY,
            });
        }
        let pin = |inst: &str, p: &str| BitRef::Pin {
            instance: interner.get_or_intern(inst),
            pin: interner.get_or_intern(p),
        };
        let pb = |name: &str| BitRef::PortBit {
            port: interner.get_or_intern(name),
            bit: 1,
        };
        for (s, d) in [
            (pb("A"), pin("x", "A")),
            (pb("B"), pin("x", "B")),
            (pb("A"), pin("a", "A")),
            (pb("B"), pin("a", "B")),
            (pin("x", "O"), pb("Sum")),
            (pin("a", "O"), pb("Carry")),
        ] {
            comp.connections.push(BitConnection {
                source: s,
                dest: d,
                span: Span::DUMMY,
            });
        }
        let sink = DiagnosticSink::new();
        let analyzed = analyze(comp, &interner, &sink);
        assert!(!sink.has_errors());
        (analyzed, interner)
    }

    #[test]
    fn half_adder_plan_shape() {
        let (analyzed, interner) = analyzed_half_adder();
        let plan = build_plan(&analyzed, &interner).unwrap();

        assert_eq!(plan.name, "HA");
        assert_eq!(plan.inputs.len(), 2);
        assert_eq!(plan.outputs.len(), 2);
        // One XOR chunk and one AND chunk, XOR first (canonical order).
        assert_eq!(plan.chunks.len(), 2);
        assert_eq!(plan.chunks[0].kind, PrimitiveKind::Xor);
        assert_eq!(plan.chunks[1].kind, PrimitiveKind::And);
        assert_eq!(plan.chunks[0].active_mask, 1);

        // Sum comes from the XOR lane, Carry from the AND lane.
        assert_eq!(
            plan.output_bits[0][0],
            SourceBit::Gate {
                kind: PrimitiveKind::Xor,
                chunk: 0,
                lane: 0
            }
        );
        assert_eq!(
            plan.output_bits[1][0],
            SourceBit::Gate {
                kind: PrimitiveKind::And,
                chunk: 0,
                lane: 0
            }
        );
    }

    #[test]
    fn gathers_reference_input_bits() {
        let (analyzed, interner) = analyzed_half_adder();
        let plan = build_plan(&analyzed, &interner).unwrap();
        let xor = &plan.chunks[0];
        assert_eq!(xor.a.len(), 1);
        assert_eq!(xor.a[0].source, SourceBit::Input { port: 0, bit: 1 });
        assert_eq!(xor.a[0].mask, 1);
        assert_eq!(xor.b[0].source, SourceBit::Input { port: 1, bit: 1 });
    }

    #[test]
    fn state_word_names() {
        let (analyzed, interner) = analyzed_half_adder();
        let plan = build_plan(&analyzed, &interner).unwrap();
        assert_eq!(plan.state_word_names(), vec!["XOR_O_0", "AND_O_0"]);
    }
}
