//! The Expanded-SHDL abstract syntax tree.
//!
//! One [`Module`] per source file: imports followed by component definitions.
//! A component body holds instance declarations, named constants, and
//! generators, plus a single `connect` block. Everything the flattener later
//! removes — generators, bit-slice expanders, template names, constants,
//! hierarchy — is represented structurally here.

use serde::{Deserialize, Serialize};
use shdl_common::Ident;
use shdl_source::Span;

/// A parsed source file: imports plus component definitions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Module {
    /// Module name, derived from the file stem.
    pub name: Ident,
    /// `use` statements, in source order.
    pub imports: Vec<Import>,
    /// Component definitions, in source order.
    pub components: Vec<ComponentDecl>,
    /// Span of the whole file.
    pub span: Span,
}

impl Module {
    /// Finds a component by name.
    pub fn component(&self, name: Ident) -> Option<&ComponentDecl> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// `use module::{A, B};`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Import {
    /// The module to load (`module` → `module.shdl`).
    pub module: Ident,
    /// The component names pulled in.
    pub components: Vec<Ident>,
    /// Span of the statement.
    pub span: Span,
}

/// `component Name(inputs) -> (outputs) { … }`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComponentDecl {
    /// The component name.
    pub name: Ident,
    /// Input ports, in declaration order.
    pub inputs: Vec<PortDecl>,
    /// Output ports, in declaration order.
    pub outputs: Vec<PortDecl>,
    /// Instance declarations, constants, and generators, in source order.
    pub items: Vec<BodyItem>,
    /// Statements of the `connect` block, in source order.
    pub connects: Vec<ConnectItem>,
    /// Span of the whole definition.
    pub span: Span,
}

/// A port declaration: `Name` (width 1) or `Name[W]`.
///
/// Bit indices are 1-based; bit 1 is the LSB and bit W the MSB.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortDecl {
    /// Port name.
    pub name: Ident,
    /// Width in bits, at least 1.
    pub width: u32,
    /// Span of the declaration.
    pub span: Span,
}

/// An item in a component body outside the connect block.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BodyItem {
    /// `name: Type;`
    Instance(InstanceDecl),
    /// `NAME = value;` or `NAME[w] = value;`
    Constant(ConstantDecl),
    /// `>v[range]{ … }` containing declarations.
    Generator(Generator),
}

/// An item in a connect block.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ConnectItem {
    /// `src -> dst;`
    Connection(Connection),
    /// `>v[range]{ … }` containing connections.
    Generator(Generator),
}

/// `name: Type;` — the name may carry `{expr}` template parts inside a
/// generator body (`g{i}: AND;`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstanceDecl {
    /// Instance name (possibly templated).
    pub name: TemplateName,
    /// Referenced component type: a primitive keyword or a component name.
    pub ty: Ident,
    /// Span of the declaration.
    pub span: Span,
}

/// A named constant. Width is explicit (`K[8] = 100;`) or inferred from the
/// value (`⌈log₂(value+1)⌉`, or 1 for zero).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConstantDecl {
    /// Constant name (possibly templated).
    pub name: TemplateName,
    /// Explicit bit width, if written.
    pub width: Option<u32>,
    /// The non-negative value.
    pub value: u64,
    /// Span of the declaration.
    pub span: Span,
}

/// `src -> dst;`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Connection {
    /// The driving signal.
    pub source: SignalRef,
    /// The driven signal.
    pub dest: SignalRef,
    /// Span of the statement.
    pub span: Span,
}

/// A signal reference: a component port, an instance port, or a constant,
/// optionally indexed or sliced.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignalRef {
    /// The instance, for `instance.Port` references.
    pub instance: Option<TemplateName>,
    /// Port or constant name.
    pub name: TemplateName,
    /// Optional `[i]`, `[a:b]`, `[:b]`, or `[a:]`.
    pub index: Option<IndexExpr>,
    /// Span of the reference.
    pub span: Span,
}

/// The bracketed part of a signal reference.
///
/// A single index has `start` set and `is_slice` false. A slice has
/// `is_slice` true; a `None` bound is open (resolved against the referenced
/// signal's width during expansion).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexExpr {
    /// First index, or `None` for `[:b]`.
    pub start: Option<ArithExpr>,
    /// Last index, or `None` for `[a:]` (and for single indices).
    pub end: Option<ArithExpr>,
    /// Whether a `:` appeared.
    pub is_slice: bool,
    /// Span of the bracketed expression.
    pub span: Span,
}

/// Integer arithmetic over literals and generator variables.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ArithExpr {
    /// An integer literal.
    Number {
        /// The value.
        value: i64,
        /// Its span.
        span: Span,
    },
    /// A generator-variable reference.
    Var {
        /// The variable name.
        name: Ident,
        /// Its span.
        span: Span,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinOp,
        /// Left operand.
        lhs: Box<ArithExpr>,
        /// Right operand.
        rhs: Box<ArithExpr>,
        /// Span of the whole operation.
        span: Span,
    },
}

impl ArithExpr {
    /// The span of this expression.
    pub fn span(&self) -> Span {
        match self {
            ArithExpr::Number { span, .. }
            | ArithExpr::Var { span, .. }
            | ArithExpr::Binary { span, .. } => *span,
        }
    }
}

/// Binary arithmetic operators.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/` (integer division)
    Div,
}

/// A name that may interleave text with `{expr}` segments.
///
/// `g{i}` is `[Text("g"), Expr(i)]`; `cell{i+1}_{j}` is
/// `[Text("cell"), Expr(i+1), Text("_"), Expr(j)]`. Outside generators a name
/// is a single text part.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemplateName {
    /// The parts, in order.
    pub parts: Vec<NamePart>,
    /// Span of the whole name.
    pub span: Span,
}

/// One segment of a [`TemplateName`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum NamePart {
    /// Literal text.
    Text(String),
    /// A `{expr}` substitution.
    Expr(ArithExpr),
}

impl TemplateName {
    /// A plain (untemplated) name.
    pub fn plain(text: impl Into<String>, span: Span) -> Self {
        Self {
            parts: vec![NamePart::Text(text.into())],
            span,
        }
    }

    /// The text, if this name has no `{expr}` parts.
    pub fn as_plain(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [NamePart::Text(t)] => Some(t),
            _ => None,
        }
    }

    /// Whether any `{expr}` part is present.
    pub fn is_templated(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, NamePart::Expr(_)))
    }
}

/// One item of a generator range list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RangeItem {
    /// A bare integer: `1..=k` when it is the sole item of the header,
    /// otherwise the singleton `k`.
    Single {
        /// The value.
        value: u64,
        /// Its span.
        span: Span,
    },
    /// `a:b`, inclusive on both ends.
    Closed {
        /// Lower bound.
        start: u64,
        /// Upper bound.
        end: u64,
        /// Span of the range.
        span: Span,
    },
    /// `a:` — upper bound supplied by context.
    From {
        /// Lower bound.
        start: u64,
        /// Span of the range.
        span: Span,
    },
    /// `:b` — lower bound defaults to 1.
    To {
        /// Upper bound.
        end: u64,
        /// Span of the range.
        span: Span,
    },
}

impl RangeItem {
    /// The span of this range item.
    pub fn span(&self) -> Span {
        match self {
            RangeItem::Single { span, .. }
            | RangeItem::Closed { span, .. }
            | RangeItem::From { span, .. }
            | RangeItem::To { span, .. } => *span,
        }
    }
}

/// The body of a generator: declarations outside `connect`, connections
/// inside it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GeneratorBody {
    /// Instance/constant declarations and nested generators.
    Decls(Vec<BodyItem>),
    /// Connections and nested generators.
    Connects(Vec<ConnectItem>),
}

/// `>v[R]{ … }` — repeats its body once per value of `v` over the range
/// list `R`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Generator {
    /// The bound variable.
    pub var: Ident,
    /// Span of the variable token.
    pub var_span: Span,
    /// The range list, in source order.
    pub ranges: Vec<RangeItem>,
    /// The body.
    pub body: GeneratorBody,
    /// Span of the whole construct.
    pub span: Span,
}
