//! MIME tree transformation engine.
//!
//! The [`Converter`] walks a parsed message and replaces every inline
//! `text/plain` or `text/markdown` leaf that opts in (with the `!m` sigil, or
//! always when `assume_markdown` is set) by a `multipart/alternative` holding
//! the original text and its HTML rendering.
//!
//! Unchanged subtrees are shared with the input through [`Arc`]; a shared node
//! that needs new headers is copied first, so the parts under a
//! `multipart/signed` container keep their exact bytes.

mod charset;
mod leaf;
mod relocate;
mod tree;

pub use charset::{decode_text, resolve};
pub use leaf::{Conversion, Skip};
pub use relocate::relocate;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::render::{CommonMark, CssInline, MarkdownRenderer, StyleInliner};
use muttdown_mime::Part;
use std::path::Path;
use std::sync::Arc;

/// Options that change how leaves are converted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Stylesheet inlined into the rendered HTML.
    pub css: Option<String>,
    /// Convert text parts even without the `!m` sigil.
    pub assume_markdown: bool,
}

impl ConvertOptions {
    /// Builds options from configuration, reading `css_file` if set.
    ///
    /// # Errors
    ///
    /// Returns an error if the stylesheet cannot be read.
    pub fn from_config(config: &Config) -> Result<Self> {
        let css = config
            .css_file
            .as_deref()
            .map(read_stylesheet)
            .transpose()?;
        Ok(Self {
            css,
            assume_markdown: config.assume_markdown,
        })
    }
}

fn read_stylesheet(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Rewrites markdown parts of a message into HTML alternatives.
#[derive(Debug, Clone)]
pub struct Converter<R = CommonMark, I = CssInline> {
    options: ConvertOptions,
    renderer: R,
    inliner: I,
}

impl Converter {
    /// Creates a converter using the default rendering engines.
    #[must_use]
    pub const fn new(options: ConvertOptions) -> Self {
        Self::with_engines(options, CommonMark, CssInline)
    }
}

impl<R: MarkdownRenderer, I: StyleInliner> Converter<R, I> {
    /// Creates a converter with custom rendering engines.
    #[must_use]
    pub const fn with_engines(options: ConvertOptions, renderer: R, inliner: I) -> Self {
        Self {
            options,
            renderer,
            inliner,
        }
    }

    /// Returns the conversion options.
    #[must_use]
    pub const fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Transforms a whole message.
    ///
    /// Conversion problems never fail the message: a leaf that cannot be
    /// converted is left as it was. No part of the result carries `Bcc`.
    #[must_use]
    pub fn process(&self, root: Part) -> Part {
        let (result, converted) = self.transform(Arc::new(root), None, true);
        tracing::debug!(converted, "Message processed");

        let mut result = Arc::unwrap_or_clone(result);
        result.headers.remove("bcc");
        result
    }
}
