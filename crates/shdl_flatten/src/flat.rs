//! Internal generator-free representation shared by the flattening phases.
//!
//! Phase 2 lowers the parsed AST into these types: template names rendered to
//! plain idents, index arithmetic evaluated to integers. Phases 3 and 4
//! rewrite them in place; phase 5 consumes them.

use shdl_common::Ident;
use shdl_parser::ast::PortDecl;
use shdl_source::Span;

/// An instance declaration with a fully rendered name.
#[derive(Clone, Debug)]
pub(crate) struct FlatInstance {
    /// Rendered instance name.
    pub name: Ident,
    /// Referenced type: primitive keyword or component name.
    pub ty: Ident,
    /// Span of the pre-expansion declaration.
    pub span: Span,
}

/// A constant declaration with a fully rendered name.
#[derive(Clone, Debug)]
pub(crate) struct FlatConstant {
    /// Rendered constant name.
    pub name: Ident,
    /// Explicit width, if written.
    pub width: Option<u32>,
    /// The value.
    pub value: u64,
    /// Span of the declaration.
    pub span: Span,
}

/// An ordered body item: instances and constants interleave in source order
/// so constant materialization keeps the declaration sequence.
#[derive(Clone, Debug)]
pub(crate) enum FlatItem {
    Instance(FlatInstance),
    Constant(FlatConstant),
}

/// An evaluated index: a single (1-based) bit or a slice with evaluated
/// bounds. `None` bounds are open and resolve against the referenced signal's
/// width in phase 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FlatIndex {
    Bit(i64),
    Slice {
        start: Option<i64>,
        end: Option<i64>,
    },
}

/// A signal reference with rendered names and evaluated indices.
#[derive(Clone, Debug)]
pub(crate) struct FlatSignal {
    /// The instance, for `instance.Port` references.
    pub instance: Option<Ident>,
    /// Port or constant name.
    pub name: Ident,
    /// Evaluated index, if any.
    pub index: Option<FlatIndex>,
    /// Span of the original reference.
    pub span: Span,
}

impl FlatSignal {
    /// The single bit this reference denotes, once slices are gone.
    /// Defaults to bit 1 for bare references.
    pub fn bit(&self) -> i64 {
        match self.index {
            Some(FlatIndex::Bit(n)) => n,
            _ => 1,
        }
    }
}

/// A connection with both ends lowered.
#[derive(Clone, Debug)]
pub(crate) struct FlatConnection {
    pub source: FlatSignal,
    pub dest: FlatSignal,
    pub span: Span,
}

/// A component after phases 2–4: ports, primitive-or-component instances,
/// and single-bit connections. The input to hierarchy flattening.
#[derive(Clone, Debug)]
pub(crate) struct ExpandedComponent {
    pub name: Ident,
    pub inputs: Vec<PortDecl>,
    pub outputs: Vec<PortDecl>,
    pub instances: Vec<FlatInstance>,
    pub connections: Vec<FlatConnection>,
}
