//! MIME header handling.

use std::fmt;

/// A single header field.
///
/// The value is stored exactly as it appeared after the colon, including the
/// leading space and any folded continuation lines, so that a header which
/// is never touched is written back unchanged.
///
/// Headers read with [`Headers::parse_bytes`] hold one `char` per input byte
/// (ISO-8859-1), which [`Headers::to_bytes`] maps back to the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    raw_value: String,
}

impl Header {
    /// Creates a header from a name and an unfolded value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl AsRef<str>) -> Self {
        Self {
            name: name.into(),
            raw_value: format!(" {}", value.as_ref()),
        }
    }

    /// Returns the header name as written.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.trim_end()
    }

    /// Returns the value with surrounding whitespace removed.
    ///
    /// Folded values keep their internal line breaks.
    #[must_use]
    pub fn value(&self) -> &str {
        self.raw_value.trim()
    }

    /// Returns true if the header has the given name (ASCII case-insensitive).
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }

    /// Returns true if the name starts with `prefix` (ASCII case-insensitive).
    #[must_use]
    pub fn name_starts_with(&self, prefix: &str) -> bool {
        let name = self.name();
        name.len() >= prefix.len()
            && name.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:{}", self.name, self.raw_value)
    }
}

/// Ordered collection of email headers.
///
/// Lookups are case-insensitive; duplicates are kept in their original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<Header>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl AsRef<str>) {
        self.entries.push(Header::new(name, value));
    }

    /// Appends an existing header field.
    pub fn push(&mut self, header: Header) {
        self.entries.push(header);
    }

    /// Sets a header value.
    ///
    /// The first occurrence is replaced in place, later duplicates are removed.
    /// If the header is absent it is appended.
    pub fn set(&mut self, name: impl Into<String>, value: impl AsRef<str>) {
        let header = Header::new(name, value);
        match self.entries.iter().position(|h| h.is_named(header.name())) {
            Some(index) => {
                let name = header.name().to_string();
                self.entries[index] = header;
                let mut seen = false;
                self.entries.retain(|h| {
                    if !h.is_named(&name) {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.entries.push(header),
        }
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|h| h.is_named(name))
            .map(Header::value)
    }

    /// Gets all values for a header, in order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|h| h.is_named(name))
            .map(Header::value)
            .collect()
    }

    /// Returns true if at least one header has this name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|h| h.is_named(name))
    }

    /// Removes all values for a header.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|h| !h.is_named(name));
    }

    /// Removes every header matching `pred` and returns them in order.
    pub fn take_where(&mut self, mut pred: impl FnMut(&Header) -> bool) -> Vec<Header> {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for header in self.entries.drain(..) {
            if pred(&header) {
                taken.push(header);
            } else {
                kept.push(header);
            }
        }
        self.entries = kept;
        taken
    }

    /// Returns an iterator over all header fields.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    /// Returns the number of header fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no header fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a raw header block without losing 8-bit bytes.
    ///
    /// Each byte becomes the `char` of the same value, so values that are not
    /// ASCII read as Latin-1 but serialize back byte for byte.
    #[must_use]
    pub fn parse_bytes(block: &[u8]) -> Self {
        Self::parse(&encoding_rs::mem::decode_latin1(block))
    }

    /// Serializes the headers, one byte per `char`.
    ///
    /// Characters above U+00FF cannot be represented and are written as `?`;
    /// headers built by this crate are ASCII.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        encoding_rs::mem::encode_latin1_lossy(&self.to_string()).into_owned()
    }

    /// Parses a header block.
    ///
    /// Expects LF line endings. Parsing stops at the first empty line.
    /// Continuation lines (starting with space or tab) are kept verbatim in
    /// the value of the preceding header; lines without a colon are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut headers = Self::new();
        let mut current: Option<Header> = None;

        for line in text.split('\n') {
            if line.is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some(header) = current.as_mut() {
                    header.raw_value.push('\n');
                    header.raw_value.push_str(line);
                }
                continue;
            }

            if let Some(header) = current.take() {
                headers.push(header);
            }

            if let Some((name, value)) = line.split_once(':') {
                current = Some(Header {
                    name: name.to_string(),
                    raw_value: value.to_string(),
                });
            }
        }

        if let Some(header) = current {
            headers.push(header);
        }

        headers
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for header in &self.entries {
            write!(f, "{header}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain")); // Case insensitive
    }

    #[test]
    fn test_headers_keep_order_and_duplicates() {
        let mut headers = Headers::new();
        headers.add("Received", "first");
        headers.add("Subject", "Test");
        headers.add("Received", "second");

        let names: Vec<&str> = headers.iter().map(Header::name).collect();
        assert_eq!(names, ["Received", "Subject", "Received"]);
        assert_eq!(headers.get_all("received"), ["first", "second"]);
    }

    #[test]
    fn test_headers_set() {
        let mut headers = Headers::new();
        headers.add("To", "alice@example.com");
        headers.add("Subject", "Hi");
        headers.add("To", "bob@example.com");

        headers.set("to", "charlie@example.com");
        assert_eq!(headers.get_all("To"), ["charlie@example.com"]);
        // Replaced in place, ahead of Subject.
        assert!(headers.iter().next().unwrap().is_named("to"));
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.add("Subject", "Test");
        headers.add("BCC", "hidden@example.com");
        headers.remove("bcc");
        assert!(!headers.contains("Bcc"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_take_where() {
        let mut headers = Headers::new();
        headers.add("From", "a@example.com");
        headers.add("Content-Type", "text/plain");
        headers.add("To", "b@example.com");

        let taken = headers.take_where(|h| !h.name_starts_with("content-"));
        let taken: Vec<&str> = taken.iter().map(Header::name).collect();
        assert_eq!(taken, ["From", "To"]);
        assert_eq!(headers.len(), 1);
        assert!(headers.contains("content-type"));
    }

    #[test]
    fn test_headers_parse() {
        let text = concat!(
            "From: sender@example.com\n",
            "To: recipient@example.com\n",
            "Subject: Test Message\n",
            "Content-Type: text/plain;\n",
            " charset=utf-8\n",
            "\n",
            "Body: not a header\n"
        );

        let headers = Headers::parse(text);
        assert_eq!(headers.len(), 4);
        assert_eq!(headers.get("From"), Some("sender@example.com"));
        assert_eq!(headers.get("Subject"), Some("Test Message"));
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/plain;\n charset=utf-8")
        );
        assert!(!headers.contains("Body"));
    }

    #[test]
    fn test_headers_display_is_verbatim() {
        let text = "Subject:no space\nX-Folded: a\n\tb\nTo:  two spaces\n";
        let headers = Headers::parse(text);
        assert_eq!(headers.to_string(), text);
        assert_eq!(headers.get("subject"), Some("no space"));
    }

    #[test]
    fn test_name_starts_with() {
        let header = Header::new("MIME-Version", "1.0");
        assert!(header.name_starts_with("mime"));
        assert!(!header.name_starts_with("Content-"));
        assert!(!Header::new("To", "x").name_starts_with("Content-"));
    }
}
