//! An in-process simulator over the same [`KernelPlan`] the C emitter
//! consumes.
//!
//! The interpreter executes the identical bit-packed model: one 64-bit word
//! per `(kind, chunk)`, branchless gather of driver bits into lane vectors,
//! a pure `tick` from previous state plus cached inputs, and the two-phase
//! `current` / `pending` shell with dirty-output tracking. Because both
//! backends derive from one plan, a design behaves the same here as in the
//! compiled shared object — which is what lets the test suite exercise
//! semantics without a host C toolchain.

#![warn(missing_docs)]

use std::collections::HashMap;

use shdl_analyze::AnalyzedComponent;
use shdl_codegen::{build_plan, KernelPlan, SourceBit};
use shdl_common::{Interner, ShdlResult};
use shdl_ir::PrimitiveKind;

/// A simulator instance for one component.
///
/// The API mirrors the emitted C ABI, with unknown signal names surfacing as
/// `None` / `false` instead of stderr messages.
pub struct Simulator {
    plan: KernelPlan,
    /// Committed state, one word per plan chunk.
    current: Vec<u64>,
    /// Speculative next state from `eval`.
    pending: Vec<u64>,
    /// Cached input words, one per input port.
    inputs: Vec<u64>,
    /// Cached output words, one per output port.
    outputs: Vec<u64>,
    pending_valid: bool,
    outputs_valid: bool,
    /// `(kind, chunk)` → index into the state vectors.
    word_index: HashMap<(PrimitiveKind, u32), usize>,
}

impl Simulator {
    /// Builds a simulator from an analyzed component.
    pub fn new(analyzed: &AnalyzedComponent, interner: &Interner) -> ShdlResult<Self> {
        Ok(Self::from_plan(build_plan(analyzed, interner)?))
    }

    /// Builds a simulator from an existing kernel plan.
    pub fn from_plan(plan: KernelPlan) -> Self {
        let word_index = plan
            .chunks
            .iter()
            .enumerate()
            .map(|(i, c)| ((c.kind, c.chunk), i))
            .collect();
        let n_chunks = plan.chunks.len();
        let n_inputs = plan.inputs.len();
        let n_outputs = plan.outputs.len();
        Self {
            plan,
            current: vec![0; n_chunks],
            pending: vec![0; n_chunks],
            inputs: vec![0; n_inputs],
            outputs: vec![0; n_outputs],
            pending_valid: false,
            outputs_valid: false,
            word_index,
        }
    }

    /// Zeroes the state and the cached inputs.
    pub fn reset(&mut self) {
        self.current.fill(0);
        self.pending.fill(0);
        self.inputs.fill(0);
        self.outputs.fill(0);
        self.pending_valid = false;
        self.outputs_valid = false;
    }

    /// Writes an input port, masked to its width. Returns `false` for an
    /// unknown name.
    pub fn poke(&mut self, name: &str, value: u64) -> bool {
        let Some(idx) = self.plan.inputs.iter().position(|p| p.name == name) else {
            return false;
        };
        self.inputs[idx] = value & width_mask(self.plan.inputs[idx].width);
        self.outputs_valid = false;
        self.pending_valid = false;
        true
    }

    /// Reads an input port, output port, or internal `KIND_O_c` word.
    /// Returns `None` for an unknown name.
    pub fn peek(&mut self, name: &str) -> Option<u64> {
        if let Some(idx) = self.plan.inputs.iter().position(|p| p.name == name) {
            return Some(self.inputs[idx]);
        }

        self.ensure_outputs();

        if let Some(idx) = self.plan.outputs.iter().position(|p| p.name == name) {
            return Some(self.outputs[idx]);
        }

        let visible = if self.pending_valid {
            &self.pending
        } else {
            &self.current
        };
        self.plan
            .state_word_names()
            .iter()
            .position(|w| w == name)
            .map(|idx| visible[idx])
    }

    /// Advances `cycles` ticks, committing each computed state. Zero or
    /// negative counts only refresh the cached outputs.
    pub fn step(&mut self, cycles: i32) {
        if cycles <= 0 {
            self.ensure_outputs();
            return;
        }
        for _ in 0..cycles {
            self.current = self.tick(&self.current);
        }
        self.pending_valid = false;
        self.refresh_outputs(false);
        self.outputs_valid = true;
    }

    /// Computes the pending next state without committing it.
    pub fn eval(&mut self) {
        self.compute_pending();
    }

    /// One pure next-state computation from `state` and the cached inputs.
    fn tick(&self, state: &[u64]) -> Vec<u64> {
        let mut next = state.to_vec();
        for (i, chunk) in self.plan.chunks.iter().enumerate() {
            let mut a = 0u64;
            for g in &chunk.a {
                a |= self.broadcast(state, &g.source) & g.mask;
            }
            next[i] = match chunk.kind {
                PrimitiveKind::Not => !a & chunk.active_mask,
                kind => {
                    let mut b = 0u64;
                    for g in &chunk.b {
                        b |= self.broadcast(state, &g.source) & g.mask;
                    }
                    let value = match kind {
                        PrimitiveKind::And => a & b,
                        PrimitiveKind::Or => a | b,
                        PrimitiveKind::Xor => a ^ b,
                        _ => unreachable!("constant kinds carry no state word"),
                    };
                    value & chunk.active_mask
                }
            };
        }
        next
    }

    /// The branchless deposit: a source bit broadcast to all-ones or
    /// all-zeros, to be masked to its lanes.
    fn broadcast(&self, state: &[u64], source: &SourceBit) -> u64 {
        let bit = self.source_bit(state, source);
        0u64.wrapping_sub(bit)
    }

    fn source_bit(&self, state: &[u64], source: &SourceBit) -> u64 {
        match source {
            SourceBit::Input { port, bit } => (self.inputs[*port] >> (bit - 1)) & 1,
            SourceBit::Gate { kind, chunk, lane } => {
                let idx = self.word_index[&(*kind, *chunk)];
                (state[idx] >> lane) & 1
            }
            SourceBit::Const(value) => *value as u64,
        }
    }

    fn compute_pending(&mut self) {
        self.pending = self.tick(&self.current);
        self.refresh_outputs(true);
        self.pending_valid = true;
        self.outputs_valid = true;
    }

    fn ensure_outputs(&mut self) {
        if !self.outputs_valid {
            self.compute_pending();
        }
    }

    fn refresh_outputs(&mut self, from_pending: bool) {
        let state = if from_pending {
            &self.pending
        } else {
            &self.current
        };
        for (out_idx, bits) in self.plan.output_bits.iter().enumerate() {
            let mut word = 0u64;
            for (i, source) in bits.iter().enumerate() {
                word |= self.source_bit(state, source) << i;
            }
            self.outputs[out_idx] = word;
        }
    }
}

fn width_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shdl_diagnostics::DiagnosticSink;
    use shdl_resolve::ComponentRegistry;
    use shdl_source::{FileId, SourceDb};

    /// Full pipeline: parse, flatten the last component, analyze, simulate.
    fn simulator(source: &str) -> Simulator {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let mut db = SourceDb::new();
        let _file = db.add_source("test.shdl", source.to_string());
        let module = shdl_parser::parse_source(
            source,
            interner.get_or_intern("test"),
            FileId::from_raw(0),
            &interner,
            &sink,
        );
        let mut registry = ComponentRegistry::new();
        for decl in &module.components {
            registry.add(decl.clone(), &interner, &sink);
        }
        let entry = module.components.last().unwrap().name;
        let mut flattener = shdl_flatten::Flattener::new(&registry, &interner, &sink);
        let base = flattener.flatten(entry).expect("flatten failed");
        let analyzed = shdl_analyze::analyze(base, &interner, &sink);
        assert!(
            !sink.has_errors(),
            "pipeline errors: {:?}",
            sink.diagnostics()
        );
        Simulator::new(&analyzed, &interner).unwrap()
    }

    const HALF_ADDER: &str = "component HA(A, B) -> (Sum, Carry) {
        x: XOR;
        a: AND;
        connect {
            A -> x.A;
            B -> x.B;
            A -> a.A;
            B -> a.B;
            x.O -> Sum;
            a.O -> Carry;
        }
    }";

    const FULL_ADDER: &str = "component FA(A, B, Cin) -> (Sum, Cout) {
        x1: XOR;
        x2: XOR;
        a1: AND;
        a2: AND;
        o1: OR;
        connect {
            A -> x1.A;
            B -> x1.B;
            x1.O -> x2.A;
            Cin -> x2.B;
            x2.O -> Sum;
            x1.O -> a1.A;
            Cin -> a1.B;
            A -> a2.A;
            B -> a2.B;
            a1.O -> o1.A;
            a2.O -> o1.B;
            o1.O -> Cout;
        }
    }";

    #[test]
    fn half_adder_truth_table() {
        let mut sim = simulator(HALF_ADDER);
        for (a, b) in [(0u64, 0u64), (0, 1), (1, 0), (1, 1)] {
            sim.reset();
            assert!(sim.poke("A", a));
            assert!(sim.poke("B", b));
            sim.step(1);
            assert_eq!(sim.peek("Sum"), Some(a ^ b), "Sum for A={a} B={b}");
            assert_eq!(sim.peek("Carry"), Some(a & b), "Carry for A={a} B={b}");
        }
    }

    fn ripple_adder_source() -> String {
        format!(
            "{FULL_ADDER}
            component Add4(A[4], B[4], Cin) -> (Sum[4], Cout) {{
                fa1: FA; fa2: FA; fa3: FA; fa4: FA;
                connect {{
                    A[1] -> fa1.A; B[1] -> fa1.B; Cin -> fa1.Cin;
                    A[2] -> fa2.A; B[2] -> fa2.B; fa1.Cout -> fa2.Cin;
                    A[3] -> fa3.A; B[3] -> fa3.B; fa2.Cout -> fa3.Cin;
                    A[4] -> fa4.A; B[4] -> fa4.B; fa3.Cout -> fa4.Cin;
                    fa1.Sum -> Sum[1];
                    fa2.Sum -> Sum[2];
                    fa3.Sum -> Sum[3];
                    fa4.Sum -> Sum[4];
                    fa4.Cout -> Cout;
                }}
            }}"
        )
    }

    #[test]
    fn ripple_adder_sums_after_settling() {
        let mut sim = simulator(&ripple_adder_source());

        sim.reset();
        sim.poke("A", 0b0011);
        sim.poke("B", 0b0101);
        sim.poke("Cin", 0);
        sim.step(12);
        assert_eq!(sim.peek("Sum"), Some(0b1000));
        assert_eq!(sim.peek("Cout"), Some(0));

        sim.reset();
        sim.poke("A", 0b1111);
        sim.poke("B", 0b0001);
        sim.poke("Cin", 0);
        sim.step(12);
        assert_eq!(sim.peek("Sum"), Some(0b0000));
        assert_eq!(sim.peek("Cout"), Some(1));
    }

    #[test]
    fn outputs_stable_once_settled() {
        let mut sim = simulator(&ripple_adder_source());
        sim.reset();
        sim.poke("A", 0b1010);
        sim.poke("B", 0b0110);
        sim.step(12);
        let sum = sim.peek("Sum");
        let cout = sim.peek("Cout");
        for _ in 0..5 {
            sim.step(1);
            assert_eq!(sim.peek("Sum"), sum);
            assert_eq!(sim.peek("Cout"), cout);
        }
    }

    #[test]
    fn constants_appear_after_reset_without_pokes() {
        let mut sim = simulator(
            "component K() -> (o1, o2, o3, o4) {
                C[4] = 0b1010;
                connect {
                    C[1] -> o1;
                    C[2] -> o2;
                    C[3] -> o3;
                    C[4] -> o4;
                }
            }",
        );
        sim.reset();
        assert_eq!(sim.peek("o1"), Some(0));
        assert_eq!(sim.peek("o2"), Some(1));
        assert_eq!(sim.peek("o3"), Some(0));
        assert_eq!(sim.peek("o4"), Some(1));
    }

    #[test]
    fn nor_latch_holds_state() {
        // Two cross-coupled NORs, each built from OR + NOT.
        let mut sim = simulator(
            "component Latch(S, R) -> (Q) {
                or1: OR; n1: NOT;
                or2: OR; n2: NOT;
                connect {
                    R -> or1.A;
                    n2.O -> or1.B;
                    or1.O -> n1.A;
                    S -> or2.A;
                    n1.O -> or2.B;
                    or2.O -> n2.A;
                    n1.O -> Q;
                }
            }",
        );

        // Pulse S: Q latches high and stays after S drops.
        sim.reset();
        sim.poke("S", 1);
        sim.poke("R", 0);
        sim.step(6);
        sim.poke("S", 0);
        sim.step(1);
        assert_eq!(sim.peek("Q"), Some(1));
        sim.step(10);
        assert_eq!(sim.peek("Q"), Some(1));

        // Pulse R: Q latches low and stays after R drops.
        sim.poke("R", 1);
        sim.step(6);
        sim.poke("R", 0);
        sim.step(1);
        assert_eq!(sim.peek("Q"), Some(0));
        sim.step(10);
        assert_eq!(sim.peek("Q"), Some(0));
    }

    #[test]
    fn poke_masks_to_port_width() {
        let mut sim = simulator(&ripple_adder_source());
        sim.reset();
        sim.poke("A", 0xFF);
        sim.step(0);
        assert_eq!(sim.peek("A"), Some(0xF));
    }

    #[test]
    fn eval_does_not_commit_state() {
        let mut sim = simulator(HALF_ADDER);
        sim.reset();
        sim.poke("A", 1);
        sim.poke("B", 0);
        sim.eval();
        assert_eq!(sim.peek("Sum"), Some(1));
        // The committed state is still the reset state: stepping from it
        // computes the same value, but the pending result must not have
        // advanced the latch-free pipeline twice.
        sim.step(1);
        assert_eq!(sim.peek("Sum"), Some(1));
    }

    #[test]
    fn internal_chunk_words_are_peekable() {
        let mut sim = simulator(HALF_ADDER);
        sim.reset();
        sim.poke("A", 1);
        sim.poke("B", 1);
        sim.step(1);
        // One XOR in lane 0: 1^1 = 0. One AND in lane 0: 1&1 = 1.
        assert_eq!(sim.peek("XOR_O_0"), Some(0));
        assert_eq!(sim.peek("AND_O_0"), Some(1));
    }

    #[test]
    fn unused_lanes_read_zero() {
        let mut sim = simulator(HALF_ADDER);
        sim.reset();
        sim.poke("A", 1);
        sim.poke("B", 1);
        for _ in 0..4 {
            sim.step(1);
            let and_word = sim.peek("AND_O_0").unwrap();
            assert_eq!(and_word & !1, 0, "inactive AND lanes must stay zero");
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut sim = simulator(HALF_ADDER);
        assert!(!sim.poke("Nope", 1));
        assert_eq!(sim.peek("Nope"), None);
    }

    #[test]
    fn vcc_feeds_gates_directly() {
        let mut sim = simulator(
            "component T(A) -> (Y) {
                ONE = 1;
                a: AND;
                connect {
                    A -> a.A;
                    ONE[1] -> a.B;
                    a.O -> Y;
                }
            }",
        );
        sim.reset();
        sim.poke("A", 1);
        sim.step(1);
        assert_eq!(sim.peek("Y"), Some(1));
        sim.poke("A", 0);
        sim.step(1);
        assert_eq!(sim.peek("Y"), Some(0));
    }
}
