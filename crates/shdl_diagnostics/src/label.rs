//! Span annotations attached to a diagnostic.

use serde::{Deserialize, Serialize};
use shdl_source::Span;

/// Visual style of a label.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LabelStyle {
    /// The main location (`^^^` underline).
    Primary,
    /// Supporting context (`---` underline).
    Secondary,
}

/// A span with an explanatory message, rendered under the source line.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Label {
    /// The annotated span.
    pub span: Span,
    /// Text shown next to the underline.
    pub message: String,
    /// Primary or secondary.
    pub style: LabelStyle,
}

impl Label {
    /// A primary label at the main error location.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    /// A secondary label giving context (e.g. "first declared here").
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_style() {
        assert_eq!(
            Label::primary(Span::DUMMY, "here").style,
            LabelStyle::Primary
        );
        assert_eq!(
            Label::secondary(Span::DUMMY, "declared here").style,
            LabelStyle::Secondary
        );
    }
}
