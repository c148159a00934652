//! Language tags
//!
//! The closed set of languages the editor understands. Only [`LanguageTag::Python`]
//! is executable; every other tag is edit-only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Editor language tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    Python,
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
    Html,
    Css,
    Markdown,
    Json,
    C,
    Cpp,
}

impl LanguageTag {
    /// Every tag, in classifier declaration order
    pub const ALL: [LanguageTag; 11] = [
        LanguageTag::Python,
        LanguageTag::JavaScript,
        LanguageTag::TypeScript,
        LanguageTag::Jsx,
        LanguageTag::Tsx,
        LanguageTag::Html,
        LanguageTag::Css,
        LanguageTag::Markdown,
        LanguageTag::Json,
        LanguageTag::C,
        LanguageTag::Cpp,
    ];

    /// Tag used when nothing else can be inferred
    pub const FALLBACK: LanguageTag = LanguageTag::Python;

    /// Stable lowercase identifier
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LanguageTag::Python => "python",
            LanguageTag::JavaScript => "javascript",
            LanguageTag::TypeScript => "typescript",
            LanguageTag::Jsx => "jsx",
            LanguageTag::Tsx => "tsx",
            LanguageTag::Html => "html",
            LanguageTag::Css => "css",
            LanguageTag::Markdown => "markdown",
            LanguageTag::Json => "json",
            LanguageTag::C => "c",
            LanguageTag::Cpp => "cpp",
        }
    }

    /// Human-facing name
    #[inline]
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            LanguageTag::Python => "Python",
            LanguageTag::JavaScript => "JavaScript",
            LanguageTag::TypeScript => "TypeScript",
            LanguageTag::Jsx => "JSX",
            LanguageTag::Tsx => "TSX",
            LanguageTag::Html => "HTML",
            LanguageTag::Css => "CSS",
            LanguageTag::Markdown => "Markdown",
            LanguageTag::Json => "JSON",
            LanguageTag::C => "C",
            LanguageTag::Cpp => "C++",
        }
    }

    /// Whether a rendered preview exists for code artifacts in this language
    #[inline]
    #[must_use]
    pub const fn has_preview(self) -> bool {
        matches!(self, LanguageTag::Html | LanguageTag::Markdown)
    }

    /// Whether the tag is one of the script-like web languages
    #[inline]
    #[must_use]
    pub const fn is_script(self) -> bool {
        matches!(self, LanguageTag::JavaScript | LanguageTag::Jsx)
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unknown language identifiers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for LanguageTag {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        LanguageTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == lowered)
            .ok_or(UnknownLanguage(lowered))
    }
}
