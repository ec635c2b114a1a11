//! Code generation: analyzed Base SHDL → a bit-packed C simulator.
//!
//! [`lanes`] assigns every gate a `(kind, chunk, lane)` slot; [`plan`]
//! resolves the driver map into gather masks and output extractions; and
//! [`emit`] renders the self-contained C source implementing the
//! `reset` / `poke` / `peek` / `eval` / `step` contract.
//!
//! Identical analyzed IR always yields byte-identical output. Lane order,
//! chunk packing, and statement order are all fixed by the plan, and nothing
//! on the emission path iterates a hash map. This property is load-bearing:
//! the regression suite and any build cache rely on it.

#![warn(missing_docs)]

pub mod emit;
pub mod lanes;
pub mod plan;
pub mod writer;

pub use emit::emit_c;
pub use lanes::{Lane, LaneMap};
pub use plan::{build_plan, ChunkPlan, Gather, KernelPlan, PortInfo, SourceBit};
pub use writer::CodeWriter;

use shdl_analyze::AnalyzedComponent;
use shdl_common::{Interner, ShdlResult};

/// Builds the kernel plan and emits the C simulator in one call.
pub fn generate(analyzed: &AnalyzedComponent, interner: &Interner) -> ShdlResult<String> {
    let plan = build_plan(analyzed, interner)?;
    Ok(emit_c(&plan))
}
