//! Transfer encoding utilities.
//!
//! Supports Base64 and Quoted-Printable (RFC 2045).

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Maximum encoded line length for Quoted-Printable, excluding the line break.
const MAX_LINE_LENGTH: usize = 76;

/// Decodes Base64 data.
///
/// Whitespace (including line breaks) is ignored.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Encodes bytes using Quoted-Printable encoding.
///
/// Line breaks in the input (`\n`) are kept as hard line breaks; long lines
/// get soft breaks (`=\n`). Trailing spaces and tabs are always encoded.
#[must_use]
pub fn encode_quoted_printable(data: &[u8]) -> String {
    let mut result = String::with_capacity(data.len() + data.len() / 8);

    for (index, line) in data.split(|&b| b == b'\n').enumerate() {
        if index > 0 {
            result.push('\n');
        }

        let mut line_length = 0;
        for (pos, &byte) in line.iter().enumerate() {
            let is_last = pos + 1 == line.len();
            let encoded = match byte {
                b' ' | b'\t' if is_last => Some(byte),
                b'!'..=b'<' | b'>'..=b'~' | b' ' | b'\t' => None,
                _ => Some(byte),
            };

            let width = if encoded.is_some() { 3 } else { 1 };
            // Leave room for the soft break marker.
            if line_length + width > MAX_LINE_LENGTH - 1 {
                result.push_str("=\n");
                line_length = 0;
            }

            match encoded {
                Some(byte) => {
                    result.push('=');
                    result.push(hex_digit(byte >> 4));
                    result.push(hex_digit(byte & 0x0f));
                }
                None => result.push(char::from(byte)),
            }
            line_length += width;
        }
    }

    result
}

const fn hex_digit(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        _ => (b'A' + nibble - 10) as char,
    }
}

/// Decodes Quoted-Printable data (RFC 2045) to raw bytes.
///
/// Decoding is lenient: an `=` that does not start a valid escape or soft
/// line break is kept literally.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break, possibly with trailing whitespace before it
        let rest = &data[i + 1..];
        let padding = rest
            .iter()
            .take_while(|b| **b == b' ' || **b == b'\t')
            .count();
        match rest.get(padding) {
            Some(b'\n') => {
                i += 1 + padding + 1;
                continue;
            }
            Some(b'\r') if rest.get(padding + 1) == Some(&b'\n') => {
                i += 1 + padding + 2;
                continue;
            }
            None => {
                i = data.len();
                continue;
            }
            _ => {}
        }

        let high = rest.first().and_then(|b| hex_value(*b));
        let low = rest.get(1).and_then(|b| hex_value(*b));
        match (high, low) {
            (Some(high), Some(low)) => {
                result.push((high << 4) | low);
                i += 3;
            }
            _ => {
                result.push(b'=');
                i += 1;
            }
        }
    }

    result
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
