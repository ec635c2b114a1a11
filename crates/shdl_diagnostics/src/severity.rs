//! Severity levels, least to most severe.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a diagnostic is.
///
/// Declaration order gives the derived `Ord`: `Help < Note < Warning < Error`.
/// Only `Error` aborts the pipeline before codegen.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// A suggestion attached to another diagnostic.
    Help,
    /// Additional context.
    Note,
    /// Worth looking at; never blocks compilation.
    Warning,
    /// Blocks compilation.
    Error,
}

impl Severity {
    /// Whether this is [`Severity::Error`].
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Help => write!(f, "help"),
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}
