//! MIME part tree.

use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_quoted_printable, encode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;
use std::sync::Arc;

/// Longest line allowed before a text body has to be quoted-printable.
const MAX_7BIT_LINE: usize = 998;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Content disposition of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    /// Displayed as part of the message body.
    #[default]
    Inline,
    /// Separate attachment.
    Attachment,
}

impl Disposition {
    /// Parses the disposition type from a `Content-Disposition` value.
    ///
    /// Unrecognized types are treated as attachments (RFC 2183).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let kind = s.split(';').next().unwrap_or_default().trim();
        if kind.is_empty() || kind.eq_ignore_ascii_case("inline") {
            Self::Inline
        } else {
            Self::Attachment
        }
    }
}

/// Body of a part: raw encoded bytes or child parts, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Leaf body, still transfer-encoded.
    Single(Vec<u8>),
    /// Children of a multipart container.
    Multipart(Vec<Arc<Part>>),
}

/// MIME part; the root part is the whole message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Raw bytes before the first boundary (containers only).
    pub preamble: Option<Vec<u8>>,
    /// Raw bytes after the closing boundary (containers only).
    pub epilogue: Option<Vec<u8>>,
    /// Part body.
    pub body: Body,
}

impl Part {
    /// Creates a leaf part.
    #[must_use]
    pub const fn single(headers: Headers, body: Vec<u8>) -> Self {
        Self {
            headers,
            preamble: None,
            epilogue: None,
            body: Body::Single(body),
        }
    }

    /// Creates a multipart container with fresh `Content-Type` and
    /// `MIME-Version` headers.
    #[must_use]
    pub fn multipart(content_type: &ContentType, children: Vec<Arc<Self>>) -> Self {
        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string());
        headers.add("MIME-Version", "1.0");
        Self {
            headers,
            preamble: None,
            epilogue: None,
            body: Body::Multipart(children),
        }
    }

    /// Creates a UTF-8 text leaf of the given subtype.
    ///
    /// The body is sent as `7bit` when it is plain ASCII with short lines and
    /// as `quoted-printable` otherwise.
    #[must_use]
    pub fn text(sub_type: &str, text: &str) -> Self {
        let content_type = ContentType::new("text", sub_type).with_parameter("charset", "utf-8");
        let fits_7bit = text.is_ascii() && text.lines().all(|l| l.len() <= MAX_7BIT_LINE);
        let (encoding, body) = if fits_7bit {
            (TransferEncoding::SevenBit, text.as_bytes().to_vec())
        } else {
            (
                TransferEncoding::QuotedPrintable,
                encode_quoted_printable(text.as_bytes()).into_bytes(),
            )
        };

        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string());
        headers.add("MIME-Version", "1.0");
        headers.add("Content-Transfer-Encoding", encoding.to_string());
        Self::single(headers, body)
    }

    /// Gets the content type.
    ///
    /// Falls back to `text/plain` when the header is absent or unparseable.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.headers
            .get("content-type")
            .and_then(|value| ContentType::parse(value).ok())
            .unwrap_or_else(ContentType::text_plain)
    }

    /// Gets the declared charset, lowercased.
    #[must_use]
    pub fn charset(&self) -> Option<String> {
        self.content_type()
            .charset()
            .map(|c| c.trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty())
    }

    /// Gets the content disposition.
    #[must_use]
    pub fn disposition(&self) -> Disposition {
        self.headers
            .get("content-disposition")
            .map_or(Disposition::Inline, Disposition::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Checks if this part is a multipart container.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self.body, Body::Multipart(_))
    }

    /// Returns the children of a container, or an empty slice for a leaf.
    #[must_use]
    pub fn children(&self) -> &[Arc<Self>] {
        match &self.body {
            Body::Multipart(children) => children,
            Body::Single(_) => &[],
        }
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if this is a container or Base64 decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        let Body::Single(body) = &self.body else {
            return Err(Error::NotLeaf(self.content_type().essence()));
        };

        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(body),
            TransferEncoding::QuotedPrintable => Ok(decode_quoted_printable(body)),
            _ => Ok(body.clone()),
        }
    }
}
