//! Character set resolution and text decoding.

use encoding_rs::Encoding;
use muttdown_mime::Part;

/// Returns the charset in effect for `part`.
///
/// A charset declared on the part wins and becomes the inherited one for its
/// subtree; otherwise the inherited charset applies unchanged.
#[must_use]
pub fn resolve(part: &Part, inherited: Option<&str>) -> Option<String> {
    part.charset().or_else(|| inherited.map(str::to_owned))
}

/// Decodes text bytes using the first charset that accepts them.
///
/// A leading byte order mark decides the encoding and is removed. Otherwise
/// tries the declared charset, then the inherited one, then strict ASCII,
/// and finally ISO-8859-1, which maps every byte. Unknown labels are
/// skipped. The result is the same for the same input.
#[must_use]
pub fn decode_text(bytes: &[u8], declared: Option<&str>, inherited: Option<&str>) -> String {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        if let Some(text) =
            encoding.decode_without_bom_handling_and_without_replacement(&bytes[bom_length..])
        {
            return text.into_owned();
        }
    }

    for label in [declared, inherited].into_iter().flatten() {
        let Some(encoding) = Encoding::for_label(label.trim().as_bytes()) else {
            tracing::debug!(charset = label, "Unknown charset label, skipping");
            continue;
        };
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            return text.into_owned();
        }
        tracing::debug!(charset = label, "Body does not decode with declared charset");
    }

    if bytes.is_ascii() {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    encoding_rs::mem::decode_latin1(bytes).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use muttdown_mime::Headers;

    fn part_with_type(content_type: &str) -> Part {
        let mut headers = Headers::new();
        headers.add("Content-Type", content_type);
        Part::single(headers, Vec::new())
    }

    #[test]
    fn own_charset_wins() {
        let part = part_with_type("text/plain; charset=ISO-8859-2");
        assert_eq!(resolve(&part, Some("utf-8")).as_deref(), Some("iso-8859-2"));
    }

    #[test]
    fn inherited_charset_used_when_undeclared() {
        let part = part_with_type("text/plain");
        assert_eq!(resolve(&part, Some("utf-8")).as_deref(), Some("utf-8"));
        assert_eq!(resolve(&part, None), None);
    }

    #[test]
    fn decodes_with_declared_charset() {
        let text = decode_text("caf\u{e9}".as_bytes(), Some("utf-8"), None);
        assert_eq!(text, "caf\u{e9}");
    }

    #[test]
    fn falls_back_to_inherited_charset() {
        // KOI8-R for "мир".
        let bytes = [0xcd, 0xc9, 0xd2];
        let text = decode_text(&bytes, Some("no-such-charset"), Some("koi8-r"));
        assert_eq!(text, "\u{43c}\u{438}\u{440}");
    }

    #[test]
    fn mislabelled_utf8_falls_back_to_latin1() {
        let bytes = b"caf\xe9";
        let text = decode_text(bytes, Some("utf-8"), None);
        assert_eq!(text, "caf\u{e9}");
        assert_eq!(decode_text(bytes, Some("utf-8"), None), text);
    }

    #[test]
    fn byte_order_mark_is_removed() {
        let text = decode_text(b"\xef\xbb\xbf!m caf\xc3\xa9", Some("utf-8"), None);
        assert_eq!(text, "!m caf\u{e9}");
        let text = decode_text(b"\xef\xbb\xbfplain", None, None);
        assert_eq!(text, "plain");
    }

    #[test]
    fn undeclared_ascii() {
        assert_eq!(decode_text(b"plain", None, None), "plain");
    }

    #[test]
    fn latin1_maps_every_byte() {
        let bytes: Vec<u8> = (0..=255).collect();
        let text = decode_text(&bytes, None, None);
        assert_eq!(text.chars().count(), 256);
        assert!(text.chars().zip(0u32..).all(|(c, b)| c as u32 == b));
    }
}
