//! Diagnostic codes from the SHDL taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category prefix of a diagnostic code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Errors, prefixed with `E`.
    Error,
    /// Warnings, prefixed with `W`.
    Warning,
}

impl Category {
    /// The single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// A diagnostic code: a category prefix plus a four-digit number whose first
/// two digits name the subsystem.
///
/// `E01xx` lex, `E02xx` parse, `E03xx` name resolution, `E04xx` type/width,
/// `E05xx` connection, `E06xx` generator, `E07xx` import, `E08xx` constant,
/// `W01xx` warnings. Displayed as e.g. `E0503`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// Error or warning.
    pub category: Category,
    /// The four-digit number.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a code from category and number.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", self.category.prefix(), self.number)
    }
}

/// Named constants for every code the toolchain emits.
pub mod codes {
    use super::{Category, DiagnosticCode};

    const fn err(number: u16) -> DiagnosticCode {
        DiagnosticCode::new(Category::Error, number)
    }

    const fn warn(number: u16) -> DiagnosticCode {
        DiagnosticCode::new(Category::Warning, number)
    }

    // E01xx — lexer
    /// Unexpected character in the input.
    pub const INVALID_CHARACTER: DiagnosticCode = err(101);
    /// `"""` block comment never closed.
    pub const UNTERMINATED_COMMENT: DiagnosticCode = err(104);
    /// `0x` with no hex digits after it.
    pub const BAD_HEX_LITERAL: DiagnosticCode = err(105);
    /// `0b` with no binary digits after it.
    pub const BAD_BINARY_LITERAL: DiagnosticCode = err(106);

    // E02xx — parser
    /// Token that fits no production at this point.
    pub const UNEXPECTED_TOKEN: DiagnosticCode = err(201);
    /// Statement missing its terminating `;`.
    pub const MISSING_SEMICOLON: DiagnosticCode = err(202);
    /// Identifier expected.
    pub const EXPECTED_IDENTIFIER: DiagnosticCode = err(206);
    /// Port width must be a positive integer.
    pub const INVALID_PORT_WIDTH: DiagnosticCode = err(209);
    /// `->` expected between input and output port lists.
    pub const MISSING_ARROW: DiagnosticCode = err(210);
    /// Malformed generator header or body.
    pub const INVALID_GENERATOR_SYNTAX: DiagnosticCode = err(214);
    /// Top level admits only `use` and `component`.
    pub const EXPECTED_ITEM: DiagnosticCode = err(215);

    // E03xx — name resolution
    /// Instance references a component that does not exist.
    pub const UNKNOWN_COMPONENT: DiagnosticCode = err(301);
    /// Connection references an instance that was never declared.
    pub const UNKNOWN_INSTANCE: DiagnosticCode = err(303);
    /// Reference to a port the target does not have.
    pub const UNKNOWN_PORT: DiagnosticCode = err(304);
    /// Two instances share one name.
    pub const DUPLICATE_INSTANCE: DiagnosticCode = err(305);
    /// Two constants share one name.
    pub const DUPLICATE_CONSTANT: DiagnosticCode = err(306);
    /// Two components share one name.
    pub const DUPLICATE_COMPONENT: DiagnosticCode = err(307);

    // E04xx — type/width
    /// Slice widths of source and destination differ.
    pub const WIDTH_MISMATCH: DiagnosticCode = err(401);
    /// Bit index outside the port's declared width.
    pub const INDEX_OUT_OF_RANGE: DiagnosticCode = err(403);
    /// Subscript applied to a single-bit signal.
    pub const SCALAR_SUBSCRIPT: DiagnosticCode = err(405);
    /// Slice bounds cannot be resolved (open end with no width context).
    pub const INVALID_SLICE: DiagnosticCode = err(406);

    // E05xx — connection
    /// Primitive input left undriven.
    pub const UNCONNECTED_INPUT: DiagnosticCode = err(501);
    /// Declared output bit left undriven.
    pub const UNDRIVEN_OUTPUT: DiagnosticCode = err(502);
    /// More than one driver on one sink.
    pub const MULTIPLE_DRIVERS: DiagnosticCode = err(503);
    /// Connection end that cannot be driven or read as written.
    pub const INVALID_CONNECTION: DiagnosticCode = err(506);
    /// Input port of the component used as a destination.
    pub const WRITE_TO_INPUT: DiagnosticCode = err(507);
    /// Output port of the component used as a source.
    pub const READ_FROM_OUTPUT: DiagnosticCode = err(508);

    // E06xx — generator
    /// Range is empty, inverted, or open-ended where a bound is required.
    pub const INVALID_RANGE: DiagnosticCode = err(601);
    /// Expression uses a variable no enclosing generator binds.
    pub const UNDEFINED_VARIABLE: DiagnosticCode = err(603);
    /// Division by zero while evaluating a generator expression.
    pub const DIVISION_BY_ZERO: DiagnosticCode = err(604);
    /// Generator variable shadows an enclosing generator variable.
    pub const VARIABLE_SHADOWING: DiagnosticCode = err(606);

    // E07xx — import
    /// No `<module>.shdl` found on the search path.
    pub const MODULE_NOT_FOUND: DiagnosticCode = err(701);
    /// The module exists but does not define the named component.
    pub const COMPONENT_NOT_IN_MODULE: DiagnosticCode = err(702);
    /// Imports form a cycle.
    pub const CIRCULAR_IMPORT: DiagnosticCode = err(703);

    // E08xx — constant
    /// Value does not fit the explicit width.
    pub const CONSTANT_OVERFLOW: DiagnosticCode = err(801);
    /// Constant indexed beyond its width.
    pub const CONSTANT_WIDTH: DiagnosticCode = err(804);

    // W01xx — warnings
    /// Port declared but never referenced.
    pub const UNUSED_PORT: DiagnosticCode = warn(101);
    /// Constant declared but never referenced.
    pub const UNUSED_CONSTANT: DiagnosticCode = warn(103);
    /// Import pulls in components that are never used.
    pub const UNUSED_IMPORT: DiagnosticCode = warn(104);
    /// Inferred constant width may be shorter than intended.
    pub const IMPLICIT_WIDTH: DiagnosticCode = warn(105);
    /// Generator variable shadows a port or constant.
    pub const SHADOWS_DECLARATION: DiagnosticCode = warn(106);
    /// Gate output drives nothing.
    pub const UNREAD_OUTPUT: DiagnosticCode = warn(107);
    /// Multi-bit port referenced without an index; bit 1 assumed.
    pub const MISSING_INDEX: DiagnosticCode = warn(108);
}
