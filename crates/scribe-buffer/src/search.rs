//! Literal find and replace.
//!
//! The needle is always literal text. Case-insensitive matching goes
//! through `regex` with the needle escaped, which keeps match lengths
//! correct for characters whose lowercase form has a different byte
//! length.

use regex::{NoExpand, Regex, RegexBuilder};
use std::ops::Range;

use crate::BufferResult;

/// A compiled literal needle.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Case-sensitive substring search
    Exact(String),
    /// Case-insensitive search over the escaped needle
    Folded(Regex),
}

/// Result of a wrapping search, in the offsets of the searched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub range: Range<usize>,
    /// True when the match was found only after restarting at the top
    pub wrapped: bool,
}

impl Matcher {
    /// Builds a matcher. An empty needle never matches.
    pub fn new(needle: &str, case_sensitive: bool) -> BufferResult<Self> {
        if case_sensitive || needle.is_empty() {
            return Ok(Matcher::Exact(needle.to_string()));
        }
        let regex = RegexBuilder::new(&regex::escape(needle))
            .case_insensitive(true)
            .build()?;
        Ok(Matcher::Folded(regex))
    }

    /// Returns true if the needle is empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Matcher::Exact(needle) => needle.is_empty(),
            Matcher::Folded(regex) => regex.as_str().is_empty(),
        }
    }

    /// Finds the first match starting at or after byte offset `from`.
    ///
    /// An offset inside a multi-byte character is moved forward to the next
    /// character boundary.
    pub fn find_at(&self, text: &str, from: usize) -> Option<Range<usize>> {
        if self.is_empty() || from > text.len() {
            return None;
        }
        let from = (from..=text.len()).find(|&i| text.is_char_boundary(i))?;
        match self {
            Matcher::Exact(needle) => text[from..]
                .find(needle.as_str())
                .map(|i| from + i..from + i + needle.len()),
            Matcher::Folded(regex) => regex.find_at(text, from).map(|m| m.range()),
        }
    }

    /// Searches forward from `from`; if nothing is found, restarts once at
    /// the beginning of the text.
    pub fn find_wrapping(&self, text: &str, from: usize) -> Option<SearchMatch> {
        if let Some(range) = self.find_at(text, from) {
            return Some(SearchMatch {
                range,
                wrapped: false,
            });
        }
        if from == 0 {
            return None;
        }
        self.find_at(text, 0).map(|range| SearchMatch {
            range,
            wrapped: true,
        })
    }

    /// Returns every non-overlapping match, left to right.
    pub fn find_all(&self, text: &str) -> Vec<Range<usize>> {
        if self.is_empty() {
            return Vec::new();
        }
        match self {
            Matcher::Exact(needle) => text
                .match_indices(needle.as_str())
                .map(|(i, m)| i..i + m.len())
                .collect(),
            Matcher::Folded(regex) => regex.find_iter(text).map(|m| m.range()).collect(),
        }
    }

    /// Replaces every match with `replacement`, inserted literally.
    pub fn replace_all(&self, text: &str, replacement: &str) -> (String, usize) {
        if self.is_empty() {
            return (text.to_string(), 0);
        }
        match self {
            Matcher::Exact(needle) => (
                text.replace(needle.as_str(), replacement),
                text.matches(needle.as_str()).count(),
            ),
            Matcher::Folded(regex) => (
                regex.replace_all(text, NoExpand(replacement)).into_owned(),
                regex.find_iter(text).count(),
            ),
        }
    }

    /// Returns true if `candidate` is exactly one match of the needle.
    pub fn matches_exactly(&self, candidate: &str) -> bool {
        self.find_at(candidate, 0)
            .is_some_and(|range| range == (0..candidate.len()))
    }
}

/// Replaces every literal occurrence of `needle` in `text`.
///
/// Returns the new text and the number of occurrences replaced.
pub fn replace_all(
    text: &str,
    needle: &str,
    replacement: &str,
    case_sensitive: bool,
) -> BufferResult<(String, usize)> {
    Ok(Matcher::new(needle, case_sensitive)?.replace_all(text, replacement))
}
