//! The C emitter: a [`KernelPlan`] rendered as a self-contained simulator.
//!
//! The emitted file packs up to 64 same-kind gates into one 64-bit word and
//! evaluates each kind with a single bitwise operation per chunk. Next state
//! is computed from the previous state and the cached inputs (two-phase
//! update), which gives every gate a one-cycle propagation delay — the
//! simulator's only temporal model.
//!
//! Emission order is canonical throughout: identical plans produce
//! byte-identical files.

use crate::plan::{ChunkPlan, Gather, KernelPlan, SourceBit};
use crate::writer::CodeWriter;
use shdl_ir::PrimitiveKind;

/// Renders the complete C source for a kernel plan.
pub fn emit_c(plan: &KernelPlan) -> String {
    let mut w = CodeWriter::new();

    emit_header(&mut w, plan);
    emit_state_struct(&mut w, plan);
    emit_tick(&mut w, plan);
    emit_extract_functions(&mut w, plan);
    emit_dut_context(&mut w, plan);
    emit_refresh_outputs(&mut w, plan);
    emit_api(&mut w, plan);

    w.finish()
}

fn emit_header(w: &mut CodeWriter, plan: &KernelPlan) {
    w.line("/*");
    w.line(&format!(" * Bit-packed simulator for {}", plan.name));
    w.line(" *");
    w.line(" * Generated by shdlc. Do not edit.");
    w.line(" * Up to 64 gates of one kind evaluate per bitwise operation;");
    w.line(" * state commits happen once per step, giving each gate a");
    w.line(" * one-cycle propagation delay.");
    w.line(" */");
    w.blank();
    w.line("#include <stdint.h>");
    w.line("#include <stdio.h>");
    w.line("#include <string.h>");
    w.blank();
}

fn emit_state_struct(w: &mut CodeWriter, plan: &KernelPlan) {
    w.line("/* Packed gate outputs, one word per (kind, chunk). */");
    w.line("typedef struct {");
    w.indent();
    if plan.chunks.is_empty() {
        w.line("uint64_t reserved_;");
    }
    for chunk in &plan.chunks {
        w.line(&format!("uint64_t {};", word_name(chunk)));
    }
    w.unindent();
    w.line("} State;");
    w.blank();
}

fn word_name(chunk: &ChunkPlan) -> String {
    format!("{}_O_{}", chunk.kind.state_name(), chunk.chunk)
}

/// The branchless deposit of one bit into a lane mask:
/// `((uint64_t)-(bit)) & mask` broadcasts 0/1 to all-zeros/all-ones.
fn gather_expr(source: &SourceBit, plan: &KernelPlan) -> String {
    match source {
        SourceBit::Input { port, bit } => {
            let name = &plan.inputs[*port].name;
            format!("((uint64_t)-( (({name} >> {}) & 1u) ))", bit - 1)
        }
        SourceBit::Gate { kind, chunk, lane } => {
            format!(
                "((uint64_t)-( ((s.{}_O_{chunk} >> {lane}) & 1u) ))",
                kind.state_name()
            )
        }
        SourceBit::Const(_) => unreachable!("constant gathers emit their mask directly"),
    }
}

fn emit_gathers(w: &mut CodeWriter, vec_name: &str, gathers: &[Gather], plan: &KernelPlan) {
    w.line(&format!("uint64_t {vec_name} = 0ull;"));
    for g in gathers {
        match g.source {
            SourceBit::Const(true) => {
                w.line(&format!("{vec_name} |= 0x{:016x}ull;", g.mask));
            }
            SourceBit::Const(false) => {}
            _ => {
                w.line(&format!(
                    "{vec_name} |= {} & 0x{:016x}ull;",
                    gather_expr(&g.source, plan),
                    g.mask
                ));
            }
        }
    }
}

fn emit_tick(w: &mut CodeWriter, plan: &KernelPlan) {
    let mut params = vec!["State s".to_string()];
    for input in &plan.inputs {
        params.push(format!("uint64_t {}", input.name));
    }

    w.line("/* Compute all gate outputs for the next cycle. */");
    w.line(&format!("static inline State tick({}) {{", params.join(", ")));
    w.indent();
    w.line("State n = s;");

    for chunk in &plan.chunks {
        w.blank();
        let word = word_name(chunk);
        let prefix = format!("{}_{}", chunk.kind.state_name(), chunk.chunk);
        let mask = format!("0x{:016x}ull", chunk.active_mask);

        match chunk.kind {
            PrimitiveKind::Not => {
                emit_gathers(w, &format!("{prefix}_A"), &chunk.a, plan);
                w.line(&format!("n.{word} = (~{prefix}_A) & {mask};"));
            }
            kind => {
                emit_gathers(w, &format!("{prefix}_A"), &chunk.a, plan);
                emit_gathers(w, &format!("{prefix}_B"), &chunk.b, plan);
                let op = match kind {
                    PrimitiveKind::And => "&",
                    PrimitiveKind::Or => "|",
                    PrimitiveKind::Xor => "^",
                    _ => unreachable!("constant kinds carry no state word"),
                };
                w.line(&format!(
                    "n.{word} = ({prefix}_A {op} {prefix}_B) & {mask};"
                ));
            }
        }
    }

    w.blank();
    w.line("return n;");
    w.unindent();
    w.line("}");
    w.blank();
}

fn emit_extract_functions(w: &mut CodeWriter, plan: &KernelPlan) {
    for (port, bits) in plan.outputs.iter().zip(&plan.output_bits) {
        w.line(&format!(
            "static inline uint64_t extract_{}(const State *s) {{",
            port.name
        ));
        w.indent();

        let mut terms = Vec::new();
        for (i, source) in bits.iter().enumerate() {
            match source {
                SourceBit::Gate { kind, chunk, lane } => {
                    terms.push(format!(
                        "(((s->{}_O_{chunk} >> {lane}) & 1ull) << {i})",
                        kind.state_name()
                    ));
                }
                SourceBit::Const(true) => terms.push(format!("(1ull << {i})")),
                // Constant-zero and input pass-through bits contribute
                // nothing here; refresh_outputs merges input bits in.
                SourceBit::Const(false) | SourceBit::Input { .. } => {}
            }
        }

        if terms.is_empty() {
            w.line("(void)s;");
            w.line("return 0ull;");
        } else {
            w.line(&format!("return {};", terms.join(" | ")));
        }
        w.unindent();
        w.line("}");
        w.blank();
    }
}

fn emit_dut_context(w: &mut CodeWriter, plan: &KernelPlan) {
    w.line("/* Process-wide simulator instance. Not re-entrant. */");
    w.line("typedef struct {");
    w.indent();
    w.line("State current;");
    w.line("State pending;");
    for input in &plan.inputs {
        w.line(&format!("uint64_t input_{};", input.name));
    }
    for output in &plan.outputs {
        w.line(&format!("uint64_t output_{};", output.name));
    }
    w.line("int pending_valid;");
    w.line("int outputs_valid;");
    w.unindent();
    w.line("} DutContext;");
    w.blank();
    w.line("static DutContext dut = {0};");
    w.blank();
    w.line("static void mark_dirty(void) {");
    w.indent();
    w.line("dut.outputs_valid = 0;");
    w.line("dut.pending_valid = 0;");
    w.unindent();
    w.line("}");
    w.blank();
}

fn emit_refresh_outputs(w: &mut CodeWriter, plan: &KernelPlan) {
    w.line("/* Recompute cached output words from a visible state. */");
    w.line("static void refresh_outputs(const State *st) {");
    w.indent();
    if plan.outputs.is_empty() {
        w.line("(void)st;");
    }
    for (port, bits) in plan.outputs.iter().zip(&plan.output_bits) {
        w.line(&format!(
            "dut.output_{} = extract_{}(st);",
            port.name, port.name
        ));
        for (i, source) in bits.iter().enumerate() {
            if let SourceBit::Input { port: in_port, bit } = source {
                let in_name = &plan.inputs[*in_port].name;
                w.line(&format!(
                    "dut.output_{} |= ((dut.input_{in_name} >> {}) & 1ull) << {i};",
                    port.name,
                    bit - 1
                ));
            }
        }
    }
    w.unindent();
    w.line("}");
    w.blank();
}

fn tick_call(plan: &KernelPlan, state: &str) -> String {
    let mut args = vec![state.to_string()];
    for input in &plan.inputs {
        args.push(format!("dut.input_{}", input.name));
    }
    format!("tick({})", args.join(", "))
}

fn emit_api(w: &mut CodeWriter, plan: &KernelPlan) {
    // compute_pending / ensure_outputs
    w.line("static void compute_pending(void) {");
    w.indent();
    w.line(&format!("dut.pending = {};", tick_call(plan, "dut.current")));
    w.line("refresh_outputs(&dut.pending);");
    w.line("dut.pending_valid = 1;");
    w.line("dut.outputs_valid = 1;");
    w.unindent();
    w.line("}");
    w.blank();

    w.line("static void ensure_outputs(void) {");
    w.indent();
    w.line("if (!dut.outputs_valid) {");
    w.indent();
    w.line("compute_pending();");
    w.unindent();
    w.line("}");
    w.unindent();
    w.line("}");
    w.blank();

    // reset
    w.line("/* Zero the state and the cached inputs. */");
    w.line("void reset(void) {");
    w.indent();
    w.line("memset(&dut, 0, sizeof(dut));");
    w.unindent();
    w.line("}");
    w.blank();

    // poke
    w.line("/* Write an input port, masked to its width. */");
    w.line("void poke(const char *name, uint64_t value) {");
    w.indent();
    for (i, input) in plan.inputs.iter().enumerate() {
        let keyword = if i == 0 { "if" } else { "} else if" };
        w.line(&format!(
            "{keyword} (strcmp(name, \"{}\") == 0) {{",
            input.name
        ));
        w.indent();
        w.line(&format!(
            "dut.input_{} = value & 0x{:x}ull;",
            input.name,
            width_mask(input.width)
        ));
        w.unindent();
    }
    if plan.inputs.is_empty() {
        w.line("(void)value;");
        w.line("fprintf(stderr, \"Unknown signal '%s'\\n\", name);");
    } else {
        w.line("} else {");
        w.indent();
        w.line("fprintf(stderr, \"Unknown signal '%s'\\n\", name);");
        w.line("return;");
        w.unindent();
        w.line("}");
        w.line("mark_dirty();");
    }
    w.unindent();
    w.line("}");
    w.blank();

    // peek
    w.line("/* Read an input port, output port, or internal chunk word. */");
    w.line("uint64_t peek(const char *name) {");
    w.indent();
    for input in &plan.inputs {
        w.line(&format!(
            "if (strcmp(name, \"{}\") == 0) return dut.input_{};",
            input.name, input.name
        ));
    }
    w.blank();
    w.line("ensure_outputs();");
    if !plan.chunks.is_empty() {
        w.line("const State *visible = dut.pending_valid ? &dut.pending : &dut.current;");
    }
    w.blank();
    for output in &plan.outputs {
        w.line(&format!(
            "if (strcmp(name, \"{}\") == 0) return dut.output_{};",
            output.name, output.name
        ));
    }
    for chunk in &plan.chunks {
        let word = word_name(chunk);
        w.line(&format!(
            "if (strcmp(name, \"{word}\") == 0) return visible->{word};"
        ));
    }
    w.blank();
    w.line("fprintf(stderr, \"Unknown signal '%s'\\n\", name);");
    w.line("return 0ull;");
    w.unindent();
    w.line("}");
    w.blank();

    // eval
    w.line("/* Compute the pending next state without committing it. */");
    w.line("void eval(void) {");
    w.indent();
    w.line("compute_pending();");
    w.unindent();
    w.line("}");
    w.blank();

    // step
    w.line("/* Advance n cycles, committing each computed state. */");
    w.line("void step(int32_t cycles) {");
    w.indent();
    w.line("if (cycles <= 0) {");
    w.indent();
    w.line("ensure_outputs();");
    w.line("return;");
    w.unindent();
    w.line("}");
    w.blank();
    w.line("for (int32_t i = 0; i < cycles; ++i) {");
    w.indent();
    w.line(&format!("dut.current = {};", tick_call(plan, "dut.current")));
    w.unindent();
    w.line("}");
    w.blank();
    w.line("dut.pending_valid = 0;");
    w.line("refresh_outputs(&dut.current);");
    w.line("dut.outputs_valid = 1;");
    w.unindent();
    w.line("}");
}

fn width_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}
