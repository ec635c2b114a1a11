//! shdlc — compile SHDL designs into fast bit-packed C simulators.
//!
//! `shdlc design.shdl` parses the design, resolves its imports, flattens it
//! to primitive gates, emits the simulator C source, and (unless
//! `--compile-only`) hands it to the host C toolchain to produce a loadable
//! shared object.

#![warn(missing_docs)]

mod pipeline;

use std::path::PathBuf;
use std::process;

use clap::Parser;

/// The SHDL compiler.
#[derive(Parser, Debug)]
#[command(name = "shdlc", version, about = "SHDL compiler")]
pub struct Cli {
    /// Input SHDL design file.
    pub input: PathBuf,

    /// Output path for the emitted C source (default: input path with `.c`).
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Additional search directory for `use` imports (repeatable).
    #[arg(short = 'I', long = "include", action = clap::ArgAction::Append)]
    pub include: Vec<PathBuf>,

    /// Emit the C source only; skip the host toolchain.
    #[arg(short = 'c', long = "compile-only")]
    pub compile_only: bool,

    /// Optimization level passed to the host toolchain.
    #[arg(short = 'O', value_parser = clap::value_parser!(u8).range(0..=3), default_value_t = 3)]
    pub optimize: u8,

    /// Entry component when the file defines several (default: the last).
    #[arg(long)]
    pub component: Option<String>,

    /// Print the flattened Base SHDL instead of generating C.
    #[arg(long = "emit-base")]
    pub emit_base: bool,

    /// Host C compiler.
    #[arg(long, default_value = "cc")]
    pub cc: String,

    /// Print warnings and progress to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    match pipeline::run(&cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
