//! Kind-specific metadata
//!
//! [`ArtifactMetadata`] is a tagged union keyed by [`ArtifactKind`]; its shape
//! is fixed when the document is created.

use crate::classifier::LanguageTable;
use crate::console::{RunConsole, RunRecord};
use crate::document::ArtifactKind;
use crate::error::ArtifactError;
use crate::language::LanguageTag;
use serde::{Deserialize, Serialize};

/// Metadata attached to a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ArtifactMetadata {
    Text,
    Code(CodeMetadata),
    Web(WebMetadata),
    Image,
    Sheet,
}

impl ArtifactMetadata {
    /// Initial metadata for a freshly created document
    #[must_use]
    pub fn for_kind(kind: ArtifactKind) -> Self {
        match kind {
            ArtifactKind::Text => Self::Text,
            ArtifactKind::Code => Self::Code(CodeMetadata::default()),
            ArtifactKind::Web => Self::Web(WebMetadata::default()),
            ArtifactKind::Image => Self::Image,
            ArtifactKind::Sheet => Self::Sheet,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::Text => ArtifactKind::Text,
            Self::Code(_) => ArtifactKind::Code,
            Self::Web(_) => ArtifactKind::Web,
            Self::Image => ArtifactKind::Image,
            Self::Sheet => ArtifactKind::Sheet,
        }
    }

    /// Detected language, for kinds that track one
    #[must_use]
    pub fn language(&self) -> Option<LanguageTag> {
        match self {
            Self::Code(code) => Some(code.language),
            Self::Web(web) => Some(web.language),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_code(&self) -> Option<&CodeMetadata> {
        match self {
            Self::Code(code) => Some(code),
            _ => None,
        }
    }

    pub fn as_code_mut(&mut self) -> Option<&mut CodeMetadata> {
        match self {
            Self::Code(code) => Some(code),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_web(&self) -> Option<&WebMetadata> {
        match self {
            Self::Web(web) => Some(web),
            _ => None,
        }
    }

    pub fn as_web_mut(&mut self) -> Option<&mut WebMetadata> {
        match self {
            Self::Web(web) => Some(web),
            _ => None,
        }
    }
}

/// Code artifact state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMetadata {
    pub language: LanguageTag,
    pub outputs: RunConsole,
    pub show_preview: bool,
    pub filename: Option<String>,
    /// Side-channel stylesheet used by HTML previews
    pub css: Option<String>,
    /// Side-channel script used by HTML previews
    pub js: Option<String>,
}

impl Default for CodeMetadata {
    fn default() -> Self {
        Self {
            language: LanguageTag::JavaScript,
            outputs: RunConsole::new(),
            show_preview: false,
            filename: None,
            css: None,
            js: None,
        }
    }
}

impl CodeMetadata {
    /// Re-detect the language from a full content snapshot
    pub fn reclassify(&mut self, table: &LanguageTable, content: &str) -> LanguageTag {
        self.language = table.classify(None, Some(content));
        self.language
    }

    /// Publish a run record into the console
    pub fn record_run(&mut self, record: RunRecord) -> bool {
        self.outputs.upsert(record)
    }

    /// Flip the preview flag
    ///
    /// Only HTML and Markdown have a preview; other languages are refused and
    /// the flag is left off.
    pub fn toggle_preview(&mut self) -> Result<bool, ArtifactError> {
        if !self.language.has_preview() {
            return Err(ArtifactError::PreviewUnavailable(self.language));
        }
        self.show_preview = !self.show_preview;
        Ok(self.show_preview)
    }
}

/// Selector for the web buffer being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebBuffer {
    Markup,
    Style,
    Script,
}

impl WebBuffer {
    /// Buffer a streamed delta of this language lands in, if any
    #[must_use]
    pub const fn route(language: LanguageTag) -> Option<Self> {
        match language {
            LanguageTag::Html => Some(Self::Markup),
            LanguageTag::Css => Some(Self::Style),
            LanguageTag::JavaScript | LanguageTag::Jsx => Some(Self::Script),
            _ => None,
        }
    }

    /// Initial edit selector for a detected language
    #[must_use]
    pub const fn initial_for(language: LanguageTag) -> Self {
        match language {
            LanguageTag::Css => Self::Style,
            LanguageTag::JavaScript => Self::Script,
            _ => Self::Markup,
        }
    }

    /// Editor language shown for this buffer
    #[must_use]
    pub const fn language(self) -> LanguageTag {
        match self {
            Self::Markup => LanguageTag::Html,
            Self::Style => LanguageTag::Css,
            Self::Script => LanguageTag::JavaScript,
        }
    }
}

/// Web artifact state: three independent buffers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebMetadata {
    pub markup: String,
    pub style: String,
    pub script: String,
    pub language: LanguageTag,
    pub show_preview: bool,
    pub active: WebBuffer,
}

impl Default for WebMetadata {
    fn default() -> Self {
        Self {
            markup: String::new(),
            style: String::new(),
            script: String::new(),
            language: LanguageTag::Html,
            show_preview: false,
            active: WebBuffer::Markup,
        }
    }
}

impl WebMetadata {
    /// Route a streamed delta into at most one buffer
    ///
    /// The delta is reclassified on its own; the buffer matching the detected
    /// language is overwritten and the others are left alone.
    pub fn route_delta(&mut self, table: &LanguageTable, content: &str) -> Option<WebBuffer> {
        self.language = table.classify(None, Some(content));
        let target = WebBuffer::route(self.language)?;
        *self.buffer_mut(target) = content.to_owned();
        Some(target)
    }

    #[must_use]
    pub fn buffer(&self, which: WebBuffer) -> &str {
        match which {
            WebBuffer::Markup => &self.markup,
            WebBuffer::Style => &self.style,
            WebBuffer::Script => &self.script,
        }
    }

    pub fn buffer_mut(&mut self, which: WebBuffer) -> &mut String {
        match which {
            WebBuffer::Markup => &mut self.markup,
            WebBuffer::Style => &mut self.style,
            WebBuffer::Script => &mut self.script,
        }
    }

    #[inline]
    #[must_use]
    pub fn active_buffer(&self) -> &str {
        self.buffer(self.active)
    }

    pub fn set_active_buffer(&mut self, which: WebBuffer) {
        self.active = which;
    }

    /// Overwrite the buffer currently selected for editing
    pub fn edit_active_buffer(&mut self, text: impl Into<String>) {
        *self.buffer_mut(self.active) = text.into();
    }

    /// Reset the edit selector from the detected language
    pub fn reset_active(&mut self) {
        self.active = WebBuffer::initial_for(self.language);
    }

    pub fn toggle_preview(&mut self) -> bool {
        self.show_preview = !self.show_preview;
        self.show_preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_metadata_matches_kind() {
        for kind in [
            ArtifactKind::Text,
            ArtifactKind::Code,
            ArtifactKind::Web,
            ArtifactKind::Image,
            ArtifactKind::Sheet,
        ] {
            assert_eq!(ArtifactMetadata::for_kind(kind).kind(), kind);
        }
        let code = ArtifactMetadata::for_kind(ArtifactKind::Code);
        assert_eq!(code.language(), Some(LanguageTag::JavaScript));
        let web = ArtifactMetadata::for_kind(ArtifactKind::Web);
        assert_eq!(web.language(), Some(LanguageTag::Html));
    }

    #[test]
    fn css_delta_only_touches_style() {
        let table = LanguageTable::builtin();
        let mut web = WebMetadata {
            markup: "<p>keep</p>".into(),
            script: "keep()".into(),
            ..WebMetadata::default()
        };

        let css = "body {\n  color: red;\n  margin: 0;\n}\n.card { padding: 4px; }";
        assert_eq!(web.route_delta(table, css), Some(WebBuffer::Style));
        assert_eq!(web.style, css);
        assert_eq!(web.markup, "<p>keep</p>");
        assert_eq!(web.script, "keep()");
        assert_eq!(web.language, LanguageTag::Css);
    }

    #[test]
    fn non_web_delta_routes_nowhere() {
        let table = LanguageTable::builtin();
        let mut web = WebMetadata::default();
        let routed = web.route_delta(table, "import os\ndef main():\n    pass\n");
        assert_eq!(routed, None);
        assert!(web.markup.is_empty() && web.style.is_empty() && web.script.is_empty());
        assert_eq!(web.language, LanguageTag::Python);
    }

    #[test]
    fn edit_writes_active_buffer_only() {
        let mut web = WebMetadata::default();
        web.set_active_buffer(WebBuffer::Script);
        web.edit_active_buffer("console.log(1)");
        assert_eq!(web.script, "console.log(1)");
        assert!(web.markup.is_empty());
        assert_eq!(web.active_buffer(), "console.log(1)");
    }

    #[test]
    fn initial_selector_follows_language() {
        assert_eq!(WebBuffer::initial_for(LanguageTag::Css), WebBuffer::Style);
        assert_eq!(WebBuffer::initial_for(LanguageTag::JavaScript), WebBuffer::Script);
        assert_eq!(WebBuffer::initial_for(LanguageTag::Jsx), WebBuffer::Markup);
        assert_eq!(WebBuffer::initial_for(LanguageTag::Python), WebBuffer::Markup);
    }

    #[test]
    fn code_preview_only_for_markup_languages() {
        let mut code = CodeMetadata::default();
        assert!(matches!(
            code.toggle_preview(),
            Err(ArtifactError::PreviewUnavailable(LanguageTag::JavaScript))
        ));
        assert!(!code.show_preview);

        code.language = LanguageTag::Markdown;
        assert_eq!(code.toggle_preview().unwrap(), true);
        assert_eq!(code.toggle_preview().unwrap(), false);
    }
}
