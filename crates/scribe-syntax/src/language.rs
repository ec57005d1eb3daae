//! Language tags and extension mapping.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::SyntaxError;

/// The language that selects a session's highlight rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    #[default]
    Python,
    JavaScript,
    Html,
    Css,
    Json,
    Plain,
}

impl LanguageTag {
    /// Every tag, in menu order.
    pub const ALL: [LanguageTag; 6] = [
        LanguageTag::Python,
        LanguageTag::JavaScript,
        LanguageTag::Html,
        LanguageTag::Css,
        LanguageTag::Json,
        LanguageTag::Plain,
    ];

    /// Maps a file extension (without the dot, any case) to a tag.
    ///
    /// Only the five mapped extensions are recognised; everything else,
    /// including a missing extension, falls back to [`LanguageTag::Python`].
    pub fn from_extension(ext: Option<&str>) -> Self {
        match ext.map(str::to_ascii_lowercase).as_deref() {
            Some("py") => LanguageTag::Python,
            Some("js") => LanguageTag::JavaScript,
            Some("html") => LanguageTag::Html,
            Some("css") => LanguageTag::Css,
            Some("json") => LanguageTag::Json,
            _ => LanguageTag::Python,
        }
    }

    /// Lowercase identifier, as stored in config and snapshots.
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageTag::Python => "python",
            LanguageTag::JavaScript => "javascript",
            LanguageTag::Html => "html",
            LanguageTag::Css => "css",
            LanguageTag::Json => "json",
            LanguageTag::Plain => "plain",
        }
    }

    /// Name shown in the status bar.
    pub fn display_name(&self) -> &'static str {
        match self {
            LanguageTag::Python => "Python",
            LanguageTag::JavaScript => "JavaScript",
            LanguageTag::Html => "HTML",
            LanguageTag::Css => "CSS",
            LanguageTag::Json => "JSON",
            LanguageTag::Plain => "Plain Text",
        }
    }
}

/// Infers the language of a file from its extension.
///
/// Unmapped extensions map to Python, not Plain; see
/// [`LanguageTag::from_extension`].
pub fn infer_language(path: impl AsRef<Path>) -> LanguageTag {
    LanguageTag::from_extension(path.as_ref().extension().and_then(|e| e.to_str()))
}

impl FromStr for LanguageTag {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageTag::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SyntaxError::UnknownLanguage(s.to_string()))
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_extensions() {
        assert_eq!(infer_language("demo.py"), LanguageTag::Python);
        assert_eq!(infer_language("app.js"), LanguageTag::JavaScript);
        assert_eq!(infer_language("index.html"), LanguageTag::Html);
        assert_eq!(infer_language("site.css"), LanguageTag::Css);
        assert_eq!(infer_language("data.json"), LanguageTag::Json);
    }

    #[test]
    fn test_extension_case_is_ignored() {
        assert_eq!(infer_language("/tmp/INDEX.HTML"), LanguageTag::Html);
        assert_eq!(infer_language("Script.Js"), LanguageTag::JavaScript);
    }

    #[test]
    fn test_unmapped_falls_back_to_python() {
        assert_eq!(infer_language("main.rs"), LanguageTag::Python);
        assert_eq!(infer_language("notes.txt"), LanguageTag::Python);
        assert_eq!(infer_language("Makefile"), LanguageTag::Python);
        assert_eq!(infer_language("archive.tar.gz"), LanguageTag::Python);
    }

    #[test]
    fn test_parse_round_trip() {
        for tag in LanguageTag::ALL {
            assert_eq!(tag.as_str().parse::<LanguageTag>().unwrap(), tag);
        }
        assert!("cobol".parse::<LanguageTag>().is_err());
    }
}
