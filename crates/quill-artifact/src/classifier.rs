//! Language classification
//!
//! A [`LanguageTable`] is an ordered list of [`LanguageProfile`]s, each holding a
//! tag, the file extensions that map to it and a set of signature regexes.
//!
//! Classification rules:
//! - A filename containing `.` is authoritative: its extension is looked up and
//!   content is never inspected. Unknown extensions resolve to the fallback.
//! - Otherwise every profile scores one point per signature that matches the
//!   content at least once. The strictly highest score wins, so ties go to the
//!   profile registered first.
//! - No input, empty content or a zero score resolves to the fallback.

use crate::error::ArtifactError;
use crate::language::LanguageTag;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// One candidate language with its extensions and content signatures
#[derive(Debug, Clone)]
pub struct LanguageProfile {
    tag: LanguageTag,
    extensions: Vec<String>,
    signatures: Vec<Regex>,
}

impl LanguageProfile {
    /// Create profile with no extensions or signatures
    #[inline]
    #[must_use]
    pub fn new(tag: LanguageTag) -> Self {
        Self {
            tag,
            extensions: Vec::new(),
            signatures: Vec::new(),
        }
    }

    /// Add file extensions (without dot, matched case-insensitively)
    #[must_use]
    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions
            .extend(extensions.iter().map(|e| e.trim_start_matches('.').to_ascii_lowercase()));
        self
    }

    /// Add a signature pattern
    ///
    /// # Errors
    /// Returns [`ArtifactError::InvalidSignature`] if the pattern does not compile
    pub fn with_signature(mut self, pattern: &str) -> Result<Self, ArtifactError> {
        let regex = Regex::new(pattern).map_err(|source| ArtifactError::InvalidSignature {
            language: self.tag,
            source,
        })?;
        self.signatures.push(regex);
        Ok(self)
    }

    /// Add several signature patterns
    ///
    /// # Errors
    /// Fails on the first pattern that does not compile
    pub fn with_signatures(self, patterns: &[&str]) -> Result<Self, ArtifactError> {
        patterns
            .iter()
            .try_fold(self, |profile, pattern| profile.with_signature(pattern))
    }

    #[inline]
    #[must_use]
    pub fn tag(&self) -> LanguageTag {
        self.tag
    }

    #[inline]
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    #[inline]
    #[must_use]
    pub fn signatures(&self) -> &[Regex] {
        &self.signatures
    }

    /// Score content against this profile's signatures
    #[inline]
    #[must_use]
    pub fn score(&self, content: &str) -> usize {
        score_signatures(&self.signatures, content)
    }
}

/// Count how many signatures match the content at least once
///
/// Independent of table contents: each matching signature contributes exactly
/// one point no matter how often it matches.
#[must_use]
pub fn score_signatures(signatures: &[Regex], content: &str) -> usize {
    signatures.iter().filter(|re| re.is_match(content)).count()
}

/// Ordered registry of language profiles driven by a single scoring loop
#[derive(Debug, Clone)]
pub struct LanguageTable {
    profiles: Vec<LanguageProfile>,
    fallback: LanguageTag,
}

static BUILTIN: Lazy<Arc<LanguageTable>> = Lazy::new(|| Arc::new(builtin_table()));

impl LanguageTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new(fallback: LanguageTag) -> Self {
        Self {
            profiles: Vec::new(),
            fallback,
        }
    }

    /// The editor's built-in table
    #[inline]
    #[must_use]
    pub fn builtin() -> &'static LanguageTable {
        &BUILTIN
    }

    /// Shared handle to the built-in table
    #[inline]
    #[must_use]
    pub fn shared_builtin() -> Arc<LanguageTable> {
        Arc::clone(&BUILTIN)
    }

    /// Register a profile; later registrations lose ties to earlier ones
    pub fn register(&mut self, profile: LanguageProfile) {
        self.profiles.push(profile);
    }

    #[inline]
    #[must_use]
    pub fn fallback(&self) -> LanguageTag {
        self.fallback
    }

    #[inline]
    #[must_use]
    pub fn profiles(&self) -> &[LanguageProfile] {
        &self.profiles
    }

    /// Classify from filename and/or content
    #[must_use]
    pub fn classify(&self, filename: Option<&str>, content: Option<&str>) -> LanguageTag {
        if let Some(name) = filename.filter(|n| n.contains('.')) {
            return self.resolve_extension(name);
        }
        match content {
            Some(text) if !text.is_empty() => self.resolve_content(text),
            _ => self.fallback,
        }
    }

    /// Resolve a filename through the extension table
    #[must_use]
    pub fn resolve_extension(&self, filename: &str) -> LanguageTag {
        let extension = filename.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
        self.profiles
            .iter()
            .find(|p| p.extensions.iter().any(|e| *e == extension))
            .map_or(self.fallback, LanguageProfile::tag)
    }

    /// Pick the highest scoring profile for content
    #[must_use]
    pub fn resolve_content(&self, content: &str) -> LanguageTag {
        let mut detected = self.fallback;
        let mut highest = 0;
        for profile in &self.profiles {
            let score = profile.score(content);
            if score > highest {
                highest = score;
                detected = profile.tag;
            }
        }
        tracing::trace!(language = %detected, score = highest, "classified content");
        detected
    }

    /// Per-profile scores in table order
    #[must_use]
    pub fn scores(&self, content: &str) -> Vec<(LanguageTag, usize)> {
        self.profiles
            .iter()
            .map(|p| (p.tag, p.score(content)))
            .collect()
    }
}

/// Classify with the built-in table
#[inline]
#[must_use]
pub fn classify(filename: Option<&str>, content: Option<&str>) -> LanguageTag {
    LanguageTable::builtin().classify(filename, content)
}

const HTML_OPEN: &str = r"(?i)<(!DOCTYPE|html|head|body|div|span|h1|p|a|img|ul|li|table)";
const COMPONENT_OPEN: &str = r#"<[A-Z][a-zA-Z0-9]*(\s+[a-zA-Z0-9]+="[^"]*")*\s*>"#;
const COMPONENT_CLOSE: &str = r"</[A-Z][a-zA-Z0-9]*>";
const TYPE_ANNOTATION: &str = r":\s*[A-Za-z<>\[\]]+";
const C_INCLUDE: &str = r"#include\s*<[^>]+>";

fn builtin_table() -> LanguageTable {
    let mut table = LanguageTable::new(LanguageTag::FALLBACK);

    let entries: [(LanguageTag, &[&str], &[&str]); 11] = [
        (
            LanguageTag::Python,
            &["py"],
            &[
                r"^#!",
                r"\bimport\s+[a-zA-Z0-9_]+\b",
                r"\bdef\s+[a-zA-Z0-9_]+\s*\(",
                r"\bclass\s+[a-zA-Z0-9_]+[^\n]*:",
            ],
        ),
        (
            LanguageTag::JavaScript,
            &["js"],
            &[
                r"\bconst\b|\blet\b|\bvar\b",
                r"\bfunction\b|\b=>\b",
                r"\bimport\s+.*\bfrom\b",
                r"\bexport\b",
            ],
        ),
        (
            LanguageTag::TypeScript,
            &["ts"],
            &[
                TYPE_ANNOTATION,
                r"\binterface\b|\btype\b",
                r"\bReadonly\b|\bPartial\b|\bPick\b|\bRecord\b",
            ],
        ),
        (
            LanguageTag::Jsx,
            &["jsx"],
            &[r"\bReact\b", COMPONENT_OPEN, COMPONENT_CLOSE],
        ),
        (
            LanguageTag::Tsx,
            &["tsx"],
            &[TYPE_ANNOTATION, COMPONENT_OPEN, COMPONENT_CLOSE],
        ),
        (LanguageTag::Html, &["html"], &[HTML_OPEN, r"(?i)</[a-z]+>"]),
        (
            LanguageTag::Css,
            &["css"],
            &[
                r"[.#][a-zA-Z0-9_-]+\s*\{",
                r"@media\b|@import\b|@keyframes\b",
                r"\b(margin|padding|color|background|font|display):",
            ],
        ),
        (
            LanguageTag::Markdown,
            &["md"],
            &[r"(?m)^#\s+", r"\*\*\w+\*\*", r"\[.+\]\(.+\)", r"(?m)^\s*-\s+"],
        ),
        (
            LanguageTag::Json,
            &["json"],
            &[r"^\s*\{", r"\s*\}\s*$", r#""[a-zA-Z0-9_]+"\s*:"#],
        ),
        (
            LanguageTag::C,
            &["c", "h"],
            &[
                C_INCLUDE,
                r"\bint\s+main\s*\(",
                r"\bprintf\s*\(",
                r"\b(int|char|float|double|void)\s+[a-zA-Z_][a-zA-Z0-9_]*\s*\(",
            ],
        ),
        (
            LanguageTag::Cpp,
            &["cpp", "cc", "cxx", "hpp"],
            &[
                C_INCLUDE,
                r"\bstd::",
                r"\bcout\s*<<",
                r"\bnamespace\s+",
                r"\bclass\s+[a-zA-Z_][a-zA-Z0-9_]*\s*\{",
            ],
        ),
    ];

    for (tag, extensions, patterns) in entries {
        let mut profile = LanguageProfile::new(tag).with_extensions(extensions);
        for pattern in patterns {
            match profile.clone().with_signature(pattern) {
                Ok(extended) => profile = extended,
                Err(err) => tracing::error!("skipping builtin signature: {}", err),
            }
        }
        table.register(profile);
    }

    table
}
