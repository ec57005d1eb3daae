//! # Scribe Syntax
//!
//! Pattern-based syntax highlighting, one block (line) at a time.
//!
//! A [`Highlighter`] is configured with a [`LanguageTag`], which selects an
//! ordered list of regular-expression rules: keywords, string literals,
//! comments, numbers. Highlighting a block paints every match of every rule
//! in that order and returns the result as [`StyledSpan`]s.
//!
//! ```
//! use scribe_syntax::{Highlighter, LanguageTag, Style};
//!
//! let highlighter = Highlighter::new(LanguageTag::Python);
//! let spans = highlighter.highlight("return 1");
//! assert_eq!(spans[0].style, Style::Keyword);
//! assert_eq!(spans[1].style, Style::Number);
//! ```

mod highlighter;
mod language;
mod rules;

pub use highlighter::{Highlighter, Style, StyledSpan};
pub use language::{LanguageTag, infer_language};
pub use rules::{HighlightRule, keywords, rules_for};

/// Errors that can occur in the syntax crate.
#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_flow() {
        let mut highlighter = Highlighter::default();
        highlighter.configure(infer_language("page.html"));

        let spans = highlighter.highlight("<p>'hi'</p>");
        let styles: Vec<Style> = spans.iter().map(|s| s.style).collect();
        assert_eq!(styles, vec![Style::Keyword, Style::String, Style::Keyword]);
    }

    #[test]
    fn test_unknown_language() {
        let err = "rust".parse::<LanguageTag>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown language: rust");
    }
}
