//! The six primitive gate kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A primitive gate kind.
///
/// Binary gates read `A` and `B` and drive `O`; `NOT` reads only `A`;
/// `__VCC__` and `__GND__` have no inputs and drive `O` constant-1 /
/// constant-0. The declaration order here is the canonical kind order used
/// for state words and lane assignment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// Exclusive or.
    Xor,
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
    /// Inverter.
    Not,
    /// Constant one source (`__VCC__`).
    Vcc,
    /// Constant zero source (`__GND__`).
    Gnd,
}

impl PrimitiveKind {
    /// All kinds in canonical order.
    pub const ALL: [PrimitiveKind; 6] = [
        PrimitiveKind::Xor,
        PrimitiveKind::And,
        PrimitiveKind::Or,
        PrimitiveKind::Not,
        PrimitiveKind::Vcc,
        PrimitiveKind::Gnd,
    ];

    /// Parses a source-level primitive name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "AND" => Some(PrimitiveKind::And),
            "OR" => Some(PrimitiveKind::Or),
            "NOT" => Some(PrimitiveKind::Not),
            "XOR" => Some(PrimitiveKind::Xor),
            "__VCC__" => Some(PrimitiveKind::Vcc),
            "__GND__" => Some(PrimitiveKind::Gnd),
            _ => None,
        }
    }

    /// The source-level spelling.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::And => "AND",
            PrimitiveKind::Or => "OR",
            PrimitiveKind::Not => "NOT",
            PrimitiveKind::Xor => "XOR",
            PrimitiveKind::Vcc => "__VCC__",
            PrimitiveKind::Gnd => "__GND__",
        }
    }

    /// The short name used for state words in the emitted simulator
    /// (`XOR_O_0` and friends).
    pub fn state_name(self) -> &'static str {
        match self {
            PrimitiveKind::And => "AND",
            PrimitiveKind::Or => "OR",
            PrimitiveKind::Not => "NOT",
            PrimitiveKind::Xor => "XOR",
            PrimitiveKind::Vcc => "VCC",
            PrimitiveKind::Gnd => "GND",
        }
    }

    /// Input pin names, in gather order.
    pub fn input_pins(self) -> &'static [&'static str] {
        match self {
            PrimitiveKind::And | PrimitiveKind::Or | PrimitiveKind::Xor => &["A", "B"],
            PrimitiveKind::Not => &["A"],
            PrimitiveKind::Vcc | PrimitiveKind::Gnd => &[],
        }
    }

    /// Whether the kind owns a 64-bit state word per chunk.
    ///
    /// VCC and GND lanes fold into constant masks at their use sites and
    /// carry no state.
    pub fn has_state_word(self) -> bool {
        !matches!(self, PrimitiveKind::Vcc | PrimitiveKind::Gnd)
    }

    /// Whether this is a constant source (VCC/GND).
    pub fn is_constant(self) -> bool {
        matches!(self, PrimitiveKind::Vcc | PrimitiveKind::Gnd)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
