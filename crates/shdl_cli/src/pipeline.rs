//! The shdlc compilation pipeline: parse → resolve → flatten → analyze →
//! emit → (optionally) build the shared object.

use std::error::Error;
use std::path::PathBuf;

use shdl_common::Interner;
use shdl_diagnostics::{DiagnosticRenderer, DiagnosticSink, Severity, TerminalRenderer};
use shdl_driver::Toolchain;
use shdl_flatten::Flattener;
use shdl_resolve::{check_unused_imports, search_paths_for, ComponentRegistry, ModuleResolver};
use shdl_source::SourceDb;

use crate::Cli;

/// Runs the full pipeline. Returns the process exit code.
pub fn run(cli: &Cli) -> Result<i32, Box<dyn Error>> {
    let interner = Interner::new();
    let sink = DiagnosticSink::new();
    let mut source_db = SourceDb::new();

    // Front end: entry file plus transitive imports.
    let entry_file = source_db
        .load_file(&cli.input)
        .map_err(|e| format!("cannot read '{}': {e}", cli.input.display()))?;
    let module = shdl_parser::parse_file(entry_file, &source_db, &interner, &sink);

    let mut registry = ComponentRegistry::new();
    let search_paths = search_paths_for(&cli.input, &cli.include);
    let mut resolver = ModuleResolver::new(search_paths, &interner, &sink);
    resolver.process(&module, &mut source_db, &mut registry);

    // Entry selection: --component, else the last component in the file.
    let entry = match &cli.component {
        Some(name) => interner.get_or_intern(name),
        None => match module.components.last() {
            Some(c) => c.name,
            None => {
                return Err(format!("no components found in '{}'", cli.input.display()).into());
            }
        },
    };

    // Flatten and analyze.
    let mut flattener = Flattener::new(&registry, &interner, &sink);
    let base = flattener.flatten(entry);
    check_unused_imports(&module, flattener.used_components(), &interner, &sink);

    let analyzed = base.map(|b| shdl_analyze::analyze(b, &interner, &sink));

    // A non-empty error set aborts before codegen.
    render_diagnostics(&sink, &source_db, cli.verbose);
    if sink.has_errors() {
        return Ok(1);
    }
    let analyzed = analyzed.expect("entry resolved but produced no component");

    if cli.emit_base {
        let text = analyzed.component.to_base_shdl(&interner);
        match &cli.output {
            Some(path) => std::fs::write(path, text)?,
            None => print!("{text}"),
        }
        return Ok(0);
    }

    // Emit C.
    let c_code = shdl_codegen::generate(&analyzed, &interner)?;
    let c_path = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("c"));
    std::fs::write(&c_path, &c_code)?;
    if cli.verbose {
        eprintln!("wrote {}", c_path.display());
    }

    if cli.compile_only {
        return Ok(0);
    }

    // Hand the source to the host toolchain.
    let lib_path = shared_object_path(&c_path);
    let toolchain = Toolchain::new(cli.cc.clone(), cli.optimize);
    toolchain.compile(&c_path, &lib_path)?;
    if cli.verbose {
        eprintln!("built {}", lib_path.display());
    }

    Ok(0)
}

/// The platform-appropriate shared-object path next to the C source.
fn shared_object_path(c_path: &std::path::Path) -> PathBuf {
    c_path.with_extension(std::env::consts::DLL_EXTENSION)
}

/// Renders diagnostics to stderr: errors always, warnings with `--verbose`.
/// Returns how many were shown.
pub fn render_diagnostics(sink: &DiagnosticSink, source_db: &SourceDb, verbose: bool) -> usize {
    let renderer = TerminalRenderer::new(false);
    let mut shown = 0;
    for diag in sink.diagnostics() {
        if diag.severity < Severity::Warning || (diag.severity == Severity::Warning && !verbose) {
            continue;
        }
        eprintln!("{}", renderer.render(&diag, source_db));
        shown += 1;
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

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

    fn write_design(dir: &TempDir, name: &str, source: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, source).unwrap();
        path
    }

    #[test]
    fn compile_only_emits_c() {
        let dir = TempDir::new().unwrap();
        let input = write_design(&dir, "ha.shdl", HALF_ADDER);
        let out = dir.path().join("ha.c");

        let cli = Cli::parse_from([
            "shdlc",
            "-c",
            "-o",
            out.to_str().unwrap(),
            input.to_str().unwrap(),
        ]);
        assert_eq!(run(&cli).unwrap(), 0);

        let code = fs::read_to_string(&out).unwrap();
        assert!(code.contains("void poke(const char *name, uint64_t value)"));
        assert!(code.contains("uint64_t XOR_O_0;"));
    }

    #[test]
    fn default_output_is_input_with_c_extension() {
        let dir = TempDir::new().unwrap();
        let input = write_design(&dir, "ha.shdl", HALF_ADDER);

        let cli = Cli::parse_from(["shdlc", "-c", input.to_str().unwrap()]);
        assert_eq!(run(&cli).unwrap(), 0);
        assert!(dir.path().join("ha.c").is_file());
    }

    #[test]
    fn emit_base_prints_flat_netlist() {
        let dir = TempDir::new().unwrap();
        let input = write_design(&dir, "ha.shdl", HALF_ADDER);
        let out = dir.path().join("ha.base.shdl");

        let cli = Cli::parse_from([
            "shdlc",
            "--emit-base",
            "-o",
            out.to_str().unwrap(),
            input.to_str().unwrap(),
        ]);
        assert_eq!(run(&cli).unwrap(), 0);

        let text = fs::read_to_string(&out).unwrap();
        assert!(text.contains("component HA(A, B) -> (Sum, Carry) {"));
        assert!(text.contains("x: XOR;"));
    }

    #[test]
    fn errors_exit_nonzero() {
        let dir = TempDir::new().unwrap();
        let input = write_design(
            &dir,
            "bad.shdl",
            "component Bad(A) -> (Y) {
                g: AND;
                connect { A -> g.A; g.O -> Y; }
            }",
        );
        // g.B is unconnected → E0501 → exit code 1.
        let cli = Cli::parse_from(["shdlc", "-c", input.to_str().unwrap()]);
        assert_eq!(run(&cli).unwrap(), 1);
    }

    #[test]
    fn missing_input_file_errors() {
        let cli = Cli::parse_from(["shdlc", "-c", "/nonexistent/top.shdl"]);
        assert!(run(&cli).is_err());
    }

    #[test]
    fn component_selection() {
        let dir = TempDir::new().unwrap();
        let input = write_design(
            &dir,
            "two.shdl",
            "component First(A) -> (Y) { n: NOT; connect { A -> n.A; n.O -> Y; } }
             component Second(B) -> (Z) { n: NOT; connect { B -> n.A; n.O -> Z; } }",
        );
        let out = dir.path().join("first.base.shdl");
        let cli = Cli::parse_from([
            "shdlc",
            "--emit-base",
            "--component",
            "First",
            "-o",
            out.to_str().unwrap(),
            input.to_str().unwrap(),
        ]);
        assert_eq!(run(&cli).unwrap(), 0);
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.contains("component First(A) -> (Y) {"));
    }

    #[test]
    fn imports_resolve_through_include_dirs() {
        let dir = TempDir::new().unwrap();
        let libdir = TempDir::new().unwrap();
        write_design(&libdir, "half.shdl", HALF_ADDER);
        let input = write_design(
            &dir,
            "top.shdl",
            "use half::{HA};
             component Top(A, B) -> (S, C) {
                h: HA;
                connect { A -> h.A; B -> h.B; h.Sum -> S; h.Carry -> C; }
             }",
        );
        let out = dir.path().join("top.c");
        let cli = Cli::parse_from([
            "shdlc",
            "-c",
            "-I",
            libdir.path().to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            input.to_str().unwrap(),
        ]);
        assert_eq!(run(&cli).unwrap(), 0);
        let code = fs::read_to_string(&out).unwrap();
        assert!(code.contains("XOR_O_0"));
    }

    #[test]
    fn full_build_when_toolchain_present() {
        let tc = Toolchain::new("cc", 0);
        if !tc.is_available() {
            return; // no host toolchain in this environment
        }
        let dir = TempDir::new().unwrap();
        let input = write_design(&dir, "ha.shdl", HALF_ADDER);
        let out = dir.path().join("ha.c");
        let cli = Cli::parse_from([
            "shdlc",
            "-O",
            "1",
            "-o",
            out.to_str().unwrap(),
            input.to_str().unwrap(),
        ]);
        assert_eq!(run(&cli).unwrap(), 0);
        assert!(out.with_extension(std::env::consts::DLL_EXTENSION).is_file());
    }
}
