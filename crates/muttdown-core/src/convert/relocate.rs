//! Moves envelope headers onto a new wrapping part.

use muttdown_mime::{Header, Part};

/// Moves every header of `source` except `Content-*` and `MIME*` fields to
/// the end of `dest`, keeping their order. `Bcc` is dropped from `source`
/// and never copied.
pub fn relocate(source: &mut Part, dest: &mut Part) {
    source.headers.remove("bcc");
    let moved = source.headers.take_where(is_envelope_header);
    for header in moved {
        dest.headers.push(header);
    }
}

fn is_envelope_header(header: &Header) -> bool {
    !(header.name_starts_with("Content-") || header.name_starts_with("MIME"))
}
