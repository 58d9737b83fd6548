//! Markdown rendering and CSS inlining engines.
//!
//! The converter only talks to the two traits here, so either engine can be
//! swapped out (tests use this to inject failures).

use crate::error::{Error, Result};
use pulldown_cmark::{Options, Parser, html};

/// Renders markdown text to an HTML fragment.
pub trait MarkdownRenderer {
    /// Renders `markdown` to HTML.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be rendered.
    fn render(&self, markdown: &str) -> Result<String>;
}

/// Moves stylesheet rules onto the elements they match.
pub trait StyleInliner {
    /// Applies `css` to `html`, returning the fragment with inline `style`
    /// attributes and no `<style>` block.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTML or CSS cannot be processed.
    fn inline(&self, html: &str, css: &str) -> Result<String>;
}

/// CommonMark renderer backed by `pulldown-cmark`.
///
/// Tables, strikethrough and footnotes are enabled on top of CommonMark;
/// fenced code blocks are part of CommonMark itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMark;

impl CommonMark {
    fn options() -> Options {
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES
    }
}

impl MarkdownRenderer for CommonMark {
    fn render(&self, markdown: &str) -> Result<String> {
        let parser = Parser::new_ext(markdown, Self::options());
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out.truncate(out.trim_end().len());
        Ok(out)
    }
}

/// CSS inliner backed by `css-inline`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssInline;

impl StyleInliner for CssInline {
    fn inline(&self, html: &str, css: &str) -> Result<String> {
        css_inline::inline_fragment(html, css).map_err(|e| Error::Render(e.to_string()))
    }
}
