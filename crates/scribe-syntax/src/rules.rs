//! Highlight rule tables.
//!
//! Rule order is significant: keywords, strings, comments, numbers. When
//! two rules match overlapping text the later rule wins.

use regex::Regex;

use crate::highlighter::Style;
use crate::language::LanguageTag;

/// A compiled (pattern, style) pair.
#[derive(Debug, Clone)]
pub struct HighlightRule {
    /// Name for debugging
    pub name: &'static str,
    pub pattern: Regex,
    pub style: Style,
}

impl HighlightRule {
    /// Compiles a rule. Returns `None` (and logs) if the pattern is invalid.
    pub fn new(name: &'static str, pattern: &str, style: Style) -> Option<Self> {
        match Regex::new(pattern) {
            Ok(pattern) => Some(Self {
                name,
                pattern,
                style,
            }),
            Err(err) => {
                tracing::warn!("Dropping highlight rule {}: {}", name, err);
                None
            }
        }
    }
}

const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "break", "class", "continue", "def", "del", "elif", "else", "except",
    "False", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda", "None",
    "not", "or", "pass", "raise", "return", "True", "try", "while", "with", "yield", "async",
    "await",
];

const JAVASCRIPT_KEYWORDS: &[&str] = &[
    "const", "let", "var", "function", "return", "if", "else", "for", "while", "break",
    "continue", "switch", "case", "default", "try", "catch", "finally", "throw", "async",
    "await", "class", "extends",
];

const HTML_KEYWORDS: &[&str] = &[
    "html", "head", "body", "div", "span", "p", "a", "img", "script", "style", "link", "meta",
    "title", "h1", "h2", "h3", "table", "tr", "td",
];

const DOUBLE_QUOTED: &str = r#""[^"\\]*(\\.[^"\\]*)*""#;
const SINGLE_QUOTED: &str = r"'[^'\\]*(\\.[^'\\]*)*'";
const HASH_COMMENT: &str = r"#[^\n]*";
const SLASH_COMMENT: &str = r"//[^\n]*";
const HTML_COMMENT: &str = r"<!--.*?-->";
const NUMBER: &str = r"\b[0-9]+\.?[0-9]*\b";

/// Keyword list for a language; empty for css, json and plain.
pub fn keywords(language: LanguageTag) -> &'static [&'static str] {
    match language {
        LanguageTag::Python => PYTHON_KEYWORDS,
        LanguageTag::JavaScript => JAVASCRIPT_KEYWORDS,
        LanguageTag::Html => HTML_KEYWORDS,
        LanguageTag::Css | LanguageTag::Json | LanguageTag::Plain => &[],
    }
}

/// Builds the ordered rule list for a language.
pub fn rules_for(language: LanguageTag) -> Vec<HighlightRule> {
    let mut rules = Vec::with_capacity(6);

    let words = keywords(language);
    if !words.is_empty() {
        let alternation = words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");
        rules.extend(HighlightRule::new(
            "keyword",
            &format!(r"\b(?:{alternation})\b"),
            Style::Keyword,
        ));
    }

    rules.extend(HighlightRule::new("double_string", DOUBLE_QUOTED, Style::String));
    rules.extend(HighlightRule::new("single_string", SINGLE_QUOTED, Style::String));

    match language {
        LanguageTag::Python | LanguageTag::JavaScript => {
            rules.extend(HighlightRule::new("hash_comment", HASH_COMMENT, Style::Comment));
            rules.extend(HighlightRule::new("slash_comment", SLASH_COMMENT, Style::Comment));
        }
        LanguageTag::Html => {
            rules.extend(HighlightRule::new("html_comment", HTML_COMMENT, Style::Comment));
        }
        LanguageTag::Css | LanguageTag::Json | LanguageTag::Plain => {}
    }

    rules.extend(HighlightRule::new("number", NUMBER, Style::Number));
    rules
}
