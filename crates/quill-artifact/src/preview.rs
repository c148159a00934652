//! Rendered previews
//!
//! HTML previews wrap markup, stylesheet and script into one standalone page.
//! Markdown previews are rendered GitHub-flavoured via pulldown-cmark.

use crate::document::ArtifactDocument;
use crate::error::ArtifactError;
use crate::language::LanguageTag;
use crate::metadata::ArtifactMetadata;
use pulldown_cmark::{html, Options, Parser};

/// A rendered preview page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// Complete HTML document
    Html(String),
    /// HTML fragment rendered from Markdown
    Markdown(String),
}

impl Preview {
    #[must_use]
    pub fn as_html(&self) -> &str {
        match self {
            Self::Html(page) | Self::Markdown(page) => page,
        }
    }
}

/// Compose a standalone page from the three web buffers
#[must_use]
pub fn compose_html(markup: &str, css: &str, js: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n  <head>\n    <meta charset=\"utf-8\">\n    \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n    \
         <style>\n{css}\n    </style>\n  </head>\n  <body>\n{markup}\n    \
         <script>\n{js}\n    </script>\n  </body>\n</html>\n"
    )
}

/// Render Markdown with tables, strikethrough and task lists
#[must_use]
pub fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

impl ArtifactDocument {
    /// Render the preview for the current content
    ///
    /// Code artifacts preview only as HTML or Markdown; web artifacts always
    /// compose their buffers.
    pub fn preview(&self) -> Result<Preview, ArtifactError> {
        match self.metadata() {
            ArtifactMetadata::Code(code) => match code.language {
                LanguageTag::Html => Ok(Preview::Html(compose_html(
                    self.content(),
                    code.css.as_deref().unwrap_or_default(),
                    code.js.as_deref().unwrap_or_default(),
                ))),
                LanguageTag::Markdown => Ok(Preview::Markdown(render_markdown(self.content()))),
                other => Err(ArtifactError::PreviewUnavailable(other)),
            },
            ArtifactMetadata::Web(web) => Ok(Preview::Html(compose_html(&web.markup, &web.style, &web.script))),
            other => Err(ArtifactError::unsupported("preview", other.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ArtifactKind;

    #[test]
    fn composed_page_embeds_all_buffers() {
        let page = compose_html("<h1>Hi</h1>", "h1 { color: red; }", "console.log(1);");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<style>\nh1 { color: red; }\n"));
        assert!(page.contains("<h1>Hi</h1>"));
        assert!(page.contains("<script>\nconsole.log(1);\n"));
    }

    #[test]
    fn markdown_renders_gfm_tables() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n\n- [x] done\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("checkbox"));
    }

    #[test]
    fn python_code_has_no_preview() {
        let mut doc = ArtifactDocument::new("c", ArtifactKind::Code);
        doc.apply_delta("import os\ndef main():\n    pass\n");
        assert!(matches!(doc.preview(), Err(ArtifactError::PreviewUnavailable(LanguageTag::Python))));
    }

    #[test]
    fn markdown_code_previews() {
        let mut doc = ArtifactDocument::new("notes", ArtifactKind::Code);
        doc.apply_delta("# Title\n\nSome **bold** text\n- one\n- two\n");
        assert_eq!(doc.language(), Some(LanguageTag::Markdown));
        let preview = doc.preview().unwrap();
        assert!(matches!(preview, Preview::Markdown(_)));
        assert!(preview.as_html().contains("<h1>Title</h1>"));
    }

    #[test]
    fn web_preview_uses_buffers() {
        let mut doc = ArtifactDocument::new("site", ArtifactKind::Web);
        doc.apply_delta("<!DOCTYPE html>\n<html><body><div>hello</div></body></html>");
        let preview = doc.preview().unwrap();
        assert!(preview.as_html().contains("<div>hello</div>"));
    }
}
