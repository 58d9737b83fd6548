//! # muttdown-core
//!
//! Core logic for muttdown, the mail filter that turns markdown bodies into
//! `multipart/alternative` messages with an HTML rendering.
//!
//! This crate provides:
//! - The MIME tree transformation engine ([`Converter`])
//! - Markdown rendering and CSS inlining behind pluggable traits
//! - YAML configuration loading
//! - Delivery through a local sendmail or an SMTP relay
//!
//! ## Example
//!
//! ```ignore
//! use muttdown_core::{ConvertOptions, Converter};
//! use muttdown_mime::Part;
//!
//! let message = Part::parse(b"Subject: hi\n\n!m This is **bold**\n")?;
//! let converter = Converter::new(ConvertOptions::default());
//! let rewritten = converter.process(message);
//! println!("{}", String::from_utf8_lossy(&rewritten.to_bytes()));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod convert;
mod error;
pub mod render;
pub mod service;

pub use config::Config;
pub use convert::{Conversion, ConvertOptions, Converter};
pub use error::{Error, Result};
pub use render::{CommonMark, CssInline, MarkdownRenderer, StyleInliner};
pub use service::{
    Envelope, SendmailError, SmtpError, SmtpSettings, send_with_sendmail, send_with_smtp,
};
