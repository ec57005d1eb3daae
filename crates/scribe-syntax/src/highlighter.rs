//! Block highlighter.

use serde::{Deserialize, Serialize};

use crate::language::LanguageTag;
use crate::rules::{HighlightRule, rules_for};

/// Kinds of highlighted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Keyword,
    String,
    Comment,
    Number,
}

impl Style {
    /// Returns the theme color key for this style.
    pub fn theme_key(&self) -> &'static str {
        match self {
            Style::Keyword => "keyword",
            Style::String => "string",
            Style::Comment => "comment",
            Style::Number => "number",
        }
    }
}

/// A styled region of one block, in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyledSpan {
    /// Start character offset within the block
    pub start: usize,
    /// Length in characters
    pub len: usize,
    pub style: Style,
}

impl StyledSpan {
    /// End character offset (exclusive).
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Applies the rule list of one language to individual blocks.
///
/// Holds no state between blocks beyond the configured language.
#[derive(Debug, Clone)]
pub struct Highlighter {
    language: LanguageTag,
    rules: Vec<HighlightRule>,
}

impl Highlighter {
    /// Creates a highlighter configured for `language`.
    pub fn new(language: LanguageTag) -> Self {
        Self {
            language,
            rules: rules_for(language),
        }
    }

    /// Replaces the active rule list with the one for `language`.
    pub fn configure(&mut self, language: LanguageTag) {
        if language != self.language || self.rules.is_empty() {
            tracing::debug!("Configuring highlighter for {}", language);
            self.language = language;
            self.rules = rules_for(language);
        }
    }

    /// The configured language.
    pub fn language(&self) -> LanguageTag {
        self.language
    }

    /// Highlights one block.
    ///
    /// Every non-overlapping match of every rule is painted in rule order,
    /// so a later rule overwrites an earlier one where they overlap. Runs
    /// of the same style are returned as one span, ordered by offset.
    pub fn highlight(&self, block: &str) -> Vec<StyledSpan> {
        if block.is_empty() {
            return Vec::new();
        }

        // byte offset -> char offset for every char boundary
        let mut char_at = vec![0usize; block.len() + 1];
        let mut chars = 0;
        for (byte, _) in block.char_indices() {
            char_at[byte] = chars;
            chars += 1;
        }
        char_at[block.len()] = chars;

        let mut paint: Vec<Option<Style>> = vec![None; chars];
        for rule in &self.rules {
            for m in rule.pattern.find_iter(block) {
                for slot in &mut paint[char_at[m.start()]..char_at[m.end()]] {
                    *slot = Some(rule.style);
                }
            }
        }

        coalesce(&paint)
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(LanguageTag::default())
    }
}

fn coalesce(paint: &[Option<Style>]) -> Vec<StyledSpan> {
    let mut spans: Vec<StyledSpan> = Vec::new();
    for (idx, style) in paint.iter().enumerate() {
        let Some(style) = *style else { continue };
        match spans.last_mut() {
            Some(last) if last.style == style && last.end() == idx => last.len += 1,
            _ => spans.push(StyledSpan {
                start: idx,
                len: 1,
                style,
            }),
        }
    }
    spans
}
