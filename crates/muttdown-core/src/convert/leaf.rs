//! Conversion of a single text leaf.

use super::Converter;
use super::charset::decode_text;
use crate::error::Result;
use crate::render::{MarkdownRenderer, StyleInliner};
use muttdown_mime::{Disposition, Part};
use std::fmt;

/// Marker that opts a text part into conversion.
const SIGIL: &str = "!m";

/// Separator between a message body and its signature.
const SIGNATURE_DELIMITER: &str = "\n-- \n";

/// Outcome of converting one leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// The rendered `text/html` part.
    Converted(Part),
    /// The leaf stays as it is.
    NotApplicable(Skip),
}

/// Why a leaf was not converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// Disposition is not inline.
    Attachment,
    /// Content type is not `text/plain` or `text/markdown`.
    NotText(String),
    /// The text does not start with the sigil.
    NoSigil,
    /// Decoding, rendering or inlining failed.
    Failed(String),
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attachment => f.write_str("attachment"),
            Self::NotText(essence) => write!(f, "content type {essence}"),
            Self::NoSigil => f.write_str("no markdown sigil"),
            Self::Failed(reason) => write!(f, "conversion failed: {reason}"),
        }
    }
}

impl<R: MarkdownRenderer, I: StyleInliner> Converter<R, I> {
    /// Converts one non-multipart part.
    ///
    /// `inherited` is the charset declared by the closest enclosing part.
    #[must_use]
    pub fn convert_leaf(&self, part: &Part, inherited: Option<&str>) -> Conversion {
        if part.disposition() != Disposition::Inline {
            return Conversion::NotApplicable(Skip::Attachment);
        }

        let content_type = part.content_type();
        if !(content_type.is("text", "plain") || content_type.is("text", "markdown")) {
            return Conversion::NotApplicable(Skip::NotText(content_type.essence()));
        }

        match self.render_leaf(part, inherited) {
            Ok(Some(html)) => Conversion::Converted(html),
            Ok(None) => Conversion::NotApplicable(Skip::NoSigil),
            Err(e) => {
                tracing::warn!(error = %e, "Leaving part unconverted");
                Conversion::NotApplicable(Skip::Failed(e.to_string()))
            }
        }
    }

    fn render_leaf(&self, part: &Part, inherited: Option<&str>) -> Result<Option<Part>> {
        let bytes = part.decode_body()?;
        let text = decode_text(&bytes, part.charset().as_deref(), inherited).replace("\r\n", "\n");

        let markdown = match strip_sigil(&text) {
            Some(rest) => rest,
            None if self.options.assume_markdown => text.as_str(),
            None => return Ok(None),
        };

        let mut html = self.render_markdown(markdown)?;
        if let Some(css) = &self.options.css {
            html = self.inliner.inline(&html, css)?;
        }
        Ok(Some(Part::text("html", &html)))
    }

    /// Renders `text`, setting apart everything after the first `\n-- \n`
    /// as a signature block.
    ///
    /// Later delimiters belong to the signature and are kept as escaped
    /// text inside the block.
    fn render_markdown(&self, text: &str) -> Result<String> {
        let Some((body, signature)) = text.split_once(SIGNATURE_DELIMITER) else {
            return self.renderer.render(text);
        };

        let mut html = self.renderer.render(body)?;
        html.push_str(&signature_block(signature));
        Ok(html)
    }
}

/// Removes a leading sigil and the whitespace after it.
fn strip_sigil(text: &str) -> Option<&str> {
    text.strip_prefix(SIGIL).map(str::trim_start)
}

fn signature_block(signature: &str) -> String {
    let lines: Vec<String> = signature
        .trim_end_matches('\n')
        .split('\n')
        .map(escape_html)
        .collect();
    format!(
        "\n<div class=\"signature\" style=\"font-size: small\"><p>-- <br />{}</p></div>",
        lines.join("<br />")
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing into a String cannot fail.
    let _ = pulldown_cmark_escape::escape_html(&mut out, text);
    out
}
