//! Shared harness for the conformance suites in `tests/`.
//!
//! [`compile`] runs the full pipeline on in-memory source; [`compile_files`]
//! materializes a multi-file design in a temporary directory so `use`
//! resolution is exercised for real.

use shdl_analyze::AnalyzedComponent;
use shdl_common::Interner;
use shdl_diagnostics::{Diagnostic, DiagnosticSink, Severity};
use shdl_flatten::Flattener;
use shdl_resolve::{search_paths_for, ComponentRegistry, ModuleResolver};
use shdl_sim::Simulator;
use shdl_source::SourceDb;

/// The outcome of running the pipeline over a design.
pub struct Compiled {
    /// The session interner.
    pub interner: Interner,
    /// Everything the pipeline reported.
    pub diagnostics: Vec<Diagnostic>,
    /// The analyzed component, present unless the entry was unresolvable.
    pub analyzed: Option<AnalyzedComponent>,
}

impl Compiled {
    /// All diagnostic codes as strings, e.g. `["E0503", "W0101"]`.
    pub fn codes(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .map(|d| format!("{}", d.code))
            .collect()
    }

    /// Whether any error was reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Panics if errors were reported; returns self for chaining.
    pub fn expect_clean(self) -> Self {
        assert!(
            !self.has_errors(),
            "unexpected errors: {:?}",
            self.diagnostics
                .iter()
                .map(|d| format!("{}: {}", d.code, d.message))
                .collect::<Vec<_>>()
        );
        self
    }

    /// The analyzed component.
    pub fn analyzed(&self) -> &AnalyzedComponent {
        self.analyzed.as_ref().expect("no analyzed component")
    }

    /// Builds the in-process simulator.
    pub fn simulator(&self) -> Simulator {
        Simulator::new(self.analyzed(), &self.interner).expect("simulator construction failed")
    }

    /// Emits the C source.
    pub fn c_source(&self) -> String {
        shdl_codegen::generate(self.analyzed(), &self.interner).expect("codegen failed")
    }

    /// Formats the flattened design as Base SHDL text.
    pub fn base_text(&self) -> String {
        self.analyzed().component.to_base_shdl(&self.interner)
    }
}

/// Compiles in-memory source, flattening its last component.
pub fn compile(source: &str) -> Compiled {
    compile_entry(source, None)
}

/// Compiles in-memory source, flattening the named component.
pub fn compile_entry(source: &str, entry: Option<&str>) -> Compiled {
    let interner = Interner::new();
    let sink = DiagnosticSink::new();
    let mut db = SourceDb::new();
    let file = db.add_source("design.shdl", source.to_string());
    let module = shdl_parser::parse_file(file, &db, &interner, &sink);

    let mut registry = ComponentRegistry::new();
    for decl in &module.components {
        registry.add(decl.clone(), &interner, &sink);
    }

    let entry = match entry {
        Some(name) => interner.get_or_intern(name),
        None => match module.components.last() {
            Some(c) => c.name,
            None => {
                return Compiled {
                    interner,
                    diagnostics: sink.take_all(),
                    analyzed: None,
                }
            }
        },
    };

    finish(entry, &registry, interner, sink)
}

/// Writes `files` into a temp directory, then compiles `entry_file`'s last
/// component with full import resolution.
pub fn compile_files(files: &[(&str, &str)], entry_file: &str) -> Compiled {
    let dir = tempfile::tempdir().expect("tempdir");
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).expect("write design file");
    }
    let entry_path = dir.path().join(entry_file);

    let interner = Interner::new();
    let sink = DiagnosticSink::new();
    let mut db = SourceDb::new();
    let file = db.load_file(&entry_path).expect("read entry file");
    let module = shdl_parser::parse_file(file, &db, &interner, &sink);

    let mut registry = ComponentRegistry::new();
    let paths = search_paths_for(&entry_path, &[]);
    let mut resolver = ModuleResolver::new(paths, &interner, &sink);
    resolver.process(&module, &mut db, &mut registry);

    let entry = module
        .components
        .last()
        .expect("entry file has no components")
        .name;

    finish(entry, &registry, interner, sink)
}

fn finish(
    entry: shdl_common::Ident,
    registry: &ComponentRegistry,
    interner: Interner,
    sink: DiagnosticSink,
) -> Compiled {
    let mut flattener = Flattener::new(registry, &interner, &sink);
    let analyzed = flattener
        .flatten(entry)
        .map(|base| shdl_analyze::analyze(base, &interner, &sink));
    Compiled {
        interner,
        diagnostics: sink.take_all(),
        analyzed,
    }
}

/// Whether a host C compiler is runnable, for the native-build suite.
pub fn host_cc_available() -> bool {
    shdl_driver::Toolchain::new("cc", 0).is_available()
}
