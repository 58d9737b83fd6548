//! Recursive MIME parser.

use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{Body, Part};
use std::borrow::Cow;
use std::sync::Arc;

/// Deepest multipart nesting accepted.
const MAX_DEPTH: usize = 64;

impl Part {
    /// Parses a complete message into a part tree.
    ///
    /// CRLF line endings are normalized to LF first; everything else is kept
    /// byte for byte, so serializing an untouched tree gives back the
    /// normalized input.
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart container has no boundary, contains
    /// no boundary delimiter, or is nested too deeply.
    pub fn parse(input: &[u8]) -> Result<Self> {
        let normalized = normalize_line_endings(input);
        parse_part(&normalized, 0)
    }
}

/// Converts CRLF to LF; bare CR is left alone.
fn normalize_line_endings(input: &[u8]) -> Cow<'_, [u8]> {
    if !input.windows(2).any(|w| w == b"\r\n") {
        return Cow::Borrowed(input);
    }

    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'\r' && input.get(i + 1) == Some(&b'\n') {
            i += 1;
            continue;
        }
        out.push(input[i]);
        i += 1;
    }
    Cow::Owned(out)
}

fn parse_part(data: &[u8], depth: usize) -> Result<Part> {
    if depth > MAX_DEPTH {
        return Err(Error::InvalidMultipart(format!(
            "nesting deeper than {MAX_DEPTH} levels"
        )));
    }

    let (header_block, body) = split_header_block(data);
    let headers = Headers::parse_bytes(header_block);
    let mut part = Part::single(headers, body.to_vec());

    let content_type = part.content_type();
    if !content_type.is_multipart() {
        return Ok(part);
    }

    let boundary = content_type
        .boundary()
        .ok_or_else(|| Error::MissingBoundary(content_type.essence()))?;
    let sections = split_multipart(body, boundary)?;

    let children = sections
        .parts
        .into_iter()
        .map(|section| parse_part(section, depth + 1).map(Arc::new))
        .collect::<Result<Vec<_>>>()?;

    part.preamble = sections.preamble.map(<[u8]>::to_vec);
    part.epilogue = sections.epilogue.map(<[u8]>::to_vec);
    part.body = Body::Multipart(children);
    Ok(part)
}

/// Splits a part into its header block and body at the first empty line.
///
/// A part whose first line is not a header field has no headers at all.
fn split_header_block(data: &[u8]) -> (&[u8], &[u8]) {
    if let Some(body) = data.strip_prefix(b"\n") {
        return (&[], body);
    }

    let first_line = data.split(|&b| b == b'\n').next().unwrap_or_default();
    if !looks_like_header(first_line) {
        return (&[], data);
    }

    match find(data, b"\n\n") {
        Some(pos) => (&data[..=pos], &data[pos + 2..]),
        None => (data, &[]),
    }
}

fn looks_like_header(line: &[u8]) -> bool {
    match line.iter().position(|&b| b == b':') {
        Some(colon) => colon > 0 && line[..colon].iter().all(|&b| b.is_ascii_graphic()),
        None => false,
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Byte ranges of a multipart body.
#[derive(Debug, Default)]
struct Sections<'a> {
    preamble: Option<&'a [u8]>,
    parts: Vec<&'a [u8]>,
    epilogue: Option<&'a [u8]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Part,
    Close,
}

fn classify_line(line: &[u8], delimiter: &[u8]) -> Option<Delimiter> {
    let rest = line.strip_prefix(delimiter)?;
    let (kind, padding) = match rest.strip_prefix(b"--") {
        Some(padding) => (Delimiter::Close, padding),
        None => (Delimiter::Part, rest),
    };
    padding
        .iter()
        .all(|&b| b == b' ' || b == b'\t')
        .then_some(kind)
}

/// Splits a multipart body on its boundary delimiter lines.
///
/// The line break before a delimiter belongs to the delimiter. The epilogue
/// is everything after the closing `--`, including its line break.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Result<Sections<'a>> {
    let delimiter = format!("--{boundary}").into_bytes();
    let mut sections = Sections::default();
    let mut current: Option<usize> = None;
    let mut line_start = 0;

    while line_start <= body.len() {
        let line_end = body[line_start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |p| line_start + p);
        let line = &body[line_start..line_end];

        if let Some(kind) = classify_line(line, &delimiter) {
            let content_end = line_start.saturating_sub(1);
            match current {
                None => {
                    if line_start > 0 {
                        sections.preamble = Some(&body[..content_end]);
                    }
                }
                Some(start) => sections.parts.push(&body[start..content_end.max(start)]),
            }

            if kind == Delimiter::Close {
                let tail = &body[line_start + delimiter.len() + 2..];
                if !tail.is_empty() {
                    sections.epilogue = Some(tail);
                }
                return Ok(sections);
            }
            current = Some((line_end + 1).min(body.len()));
        }

        line_start = line_end + 1;
    }

    match current {
        // Unterminated: the last part runs to the end of the body.
        Some(start) => {
            sections.parts.push(&body[start..]);
            Ok(sections)
        }
        None => Err(Error::InvalidMultipart(format!(
            "no delimiter for boundary {boundary:?}"
        ))),
    }
}
