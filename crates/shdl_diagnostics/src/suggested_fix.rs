//! Machine-applicable fixes attached to diagnostics.

use serde::{Deserialize, Serialize};
use shdl_source::Span;

/// One text replacement within a fix.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Replacement {
    /// The span to replace.
    pub span: Span,
    /// The text to put there.
    pub new_text: String,
}

/// A fix the user (or an editor) can apply verbatim.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuggestedFix {
    /// What the fix does, e.g. "add missing semicolon".
    pub message: String,
    /// The replacements, in source order.
    pub replacements: Vec<Replacement>,
}
