//! Module resolution: turning `use m::{A, B};` into loaded component
//! definitions.
//!
//! The [`ModuleResolver`] locates `m.shdl` on the search path (the importing
//! file's directory first, then each `-I` directory in order), parses it, and
//! recurses into its own imports. Loading is memoized per module, cycles are
//! detected against the in-progress stack, and every definition lands in a
//! [`ComponentRegistry`] keyed by interned name.

#![warn(missing_docs)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use shdl_common::{Ident, Interner};
use shdl_diagnostics::{codes, Diagnostic, DiagnosticSink, Label};
use shdl_parser::ast::{ComponentDecl, Import, Module};
use shdl_source::SourceDb;

/// All component definitions visible to one compilation, keyed by name.
pub struct ComponentRegistry {
    components: HashMap<Ident, ComponentDecl>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            components: HashMap::new(),
        }
    }

    /// Registers a definition, reporting `E0307` on a duplicate name. The
    /// first definition wins.
    pub fn add(&mut self, decl: ComponentDecl, interner: &Interner, sink: &DiagnosticSink) {
        if let Some(existing) = self.components.get(&decl.name) {
            sink.emit(
                Diagnostic::error(
                    codes::DUPLICATE_COMPONENT,
                    format!(
                        "component '{}' is defined more than once",
                        interner.resolve(decl.name)
                    ),
                    decl.span,
                )
                .with_label(Label::secondary(existing.span, "first defined here")),
            );
            return;
        }
        self.components.insert(decl.name, decl);
    }

    /// Looks up a definition by name.
    pub fn get(&self, name: Ident) -> Option<&ComponentDecl> {
        self.components.get(&name)
    }

    /// Whether a definition exists.
    pub fn contains(&self, name: Ident) -> bool {
        self.components.contains_key(&name)
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads modules referenced through `use` statements, transitively.
pub struct ModuleResolver<'a> {
    search_paths: Vec<PathBuf>,
    interner: &'a Interner,
    sink: &'a DiagnosticSink,
    /// Modules completely loaded.
    loaded: HashSet<Ident>,
    /// Stack of modules currently being loaded, for cycle reporting.
    loading: Vec<Ident>,
}

impl<'a> ModuleResolver<'a> {
    /// Creates a resolver over the given search path list. The importing
    /// file's own directory should be the first entry.
    pub fn new(
        search_paths: Vec<PathBuf>,
        interner: &'a Interner,
        sink: &'a DiagnosticSink,
    ) -> Self {
        Self {
            search_paths,
            interner,
            sink,
            loaded: HashSet::new(),
            loading: Vec::new(),
        }
    }

    /// Registers a parsed entry module and resolves its imports transitively.
    ///
    /// After this returns, `registry` holds every component reachable from
    /// the module via `use`.
    pub fn process(
        &mut self,
        module: &Module,
        source_db: &mut SourceDb,
        registry: &mut ComponentRegistry,
    ) {
        self.loading.push(module.name);
        for decl in &module.components {
            registry.add(decl.clone(), self.interner, self.sink);
        }
        for import in &module.imports {
            self.load_import(import, source_db, registry);
        }
        self.loading.pop();
        self.loaded.insert(module.name);
    }

    fn load_import(
        &mut self,
        import: &Import,
        source_db: &mut SourceDb,
        registry: &mut ComponentRegistry,
    ) {
        let module_name = import.module;

        if self.loading.contains(&module_name) {
            let cycle: Vec<&str> = self
                .loading
                .iter()
                .map(|m| self.interner.resolve(*m))
                .chain(std::iter::once(self.interner.resolve(module_name)))
                .collect();
            self.sink.emit(
                Diagnostic::error(
                    codes::CIRCULAR_IMPORT,
                    format!(
                        "circular import of module '{}'",
                        self.interner.resolve(module_name)
                    ),
                    import.span,
                )
                .with_note(format!("import cycle: {}", cycle.join(" -> "))),
            );
            return;
        }

        if !self.loaded.contains(&module_name) {
            let Some(path) = self.find_module_file(module_name) else {
                self.sink.emit(
                    Diagnostic::error(
                        codes::MODULE_NOT_FOUND,
                        format!(
                            "cannot find module '{}'",
                            self.interner.resolve(module_name)
                        ),
                        import.span,
                    )
                    .with_note(format!(
                        "looked for '{}.shdl' in: {}",
                        self.interner.resolve(module_name),
                        self.describe_search_paths()
                    ))
                    .with_help("add the containing directory with -I"),
                );
                return;
            };

            let file_id = match source_db.load_file(&path) {
                Ok(id) => id,
                Err(e) => {
                    self.sink.emit(Diagnostic::error(
                        codes::MODULE_NOT_FOUND,
                        format!("cannot read '{}': {e}", path.display()),
                        import.span,
                    ));
                    return;
                }
            };

            let parsed = shdl_parser::parse_file(file_id, source_db, self.interner, self.sink);
            self.process(&parsed, source_db, registry);
        }

        for &component in &import.components {
            if !registry.contains(component) {
                self.sink.emit(Diagnostic::error(
                    codes::COMPONENT_NOT_IN_MODULE,
                    format!(
                        "module '{}' does not define component '{}'",
                        self.interner.resolve(module_name),
                        self.interner.resolve(component)
                    ),
                    import.span,
                ));
            }
        }
    }

    fn find_module_file(&self, module: Ident) -> Option<PathBuf> {
        let file_name = format!("{}.shdl", self.interner.resolve(module));
        self.search_paths
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file())
    }

    fn describe_search_paths(&self) -> String {
        if self.search_paths.is_empty() {
            return "(empty search path)".to_string();
        }
        self.search_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Warns (`W0104`) about imports whose components were never instantiated.
///
/// `used` is the set of component types the flattener actually resolved.
pub fn check_unused_imports(
    module: &Module,
    used: &HashSet<Ident>,
    interner: &Interner,
    sink: &DiagnosticSink,
) {
    for import in &module.imports {
        let touched = import.components.iter().any(|c| used.contains(c));
        if !touched {
            sink.emit(Diagnostic::warning(
                codes::UNUSED_IMPORT,
                format!(
                    "imported components from '{}' are never used",
                    interner.resolve(import.module)
                ),
                import.span,
            ));
        }
    }
}

/// Builds the search path list for an entry file: its parent directory
/// first, then the `-I` directories in order.
pub fn search_paths_for(entry: &Path, include_dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(parent) = entry.parent() {
        let parent = if parent.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            parent.to_path_buf()
        };
        paths.push(parent);
    }
    paths.extend(include_dirs.iter().cloned());
    paths
}
