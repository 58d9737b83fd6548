//! # muttdown-mime
//!
//! MIME tree parsing and serialization for outgoing mail.
//!
//! Unlike a reading-oriented MIME library, this crate is built to re-emit a
//! message as close to the way it came in as possible: header order,
//! duplicate headers, folding, boundaries, preambles and raw body bytes are
//! all kept, so that a part which is not rewritten serializes to the same
//! bytes it was parsed from.
//!
//! ## Features
//!
//! - **Recursive parsing**: arbitrarily nested multipart trees
//! - **Faithful serialization**: untouched parts are written back verbatim
//! - **Ordered headers**: case-insensitive lookups, duplicates preserved
//! - **Encoding/Decoding**: Base64 and Quoted-Printable transfer encodings
//! - **Shared subtrees**: children are held in [`std::sync::Arc`] so a
//!   rewritten tree can reuse the parts it did not change
//!
//! ## Quick Start
//!
//! ```ignore
//! use muttdown_mime::Part;
//!
//! let raw = b"From: sender@example.com\n\
//!             Subject: Test\n\
//!             Content-Type: text/plain; charset=utf-8\n\
//!             \n\
//!             Hello, World!";
//!
//! let part = Part::parse(raw)?;
//! assert_eq!(part.headers.get("Subject"), Some("Test"));
//! assert_eq!(part.decode_body()?, b"Hello, World!");
//! assert_eq!(part.to_bytes(), raw);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;
mod parser;
mod writer;

pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::{Header, Headers};
pub use message::{Body, Disposition, Part, TransferEncoding};
