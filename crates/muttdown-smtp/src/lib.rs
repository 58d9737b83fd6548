//! # muttdown-smtp
//!
//! A small SMTP submission client implementing the parts of RFC 5321 needed
//! to relay one finished message.
//!
//! ## Features
//!
//! - **Type-state connection management**: compile-time enforcement of valid
//!   SMTP state transitions
//! - **Protocol support**: EHLO, STARTTLS, AUTH, MAIL FROM, RCPT TO, DATA, QUIT
//! - **TLS support**: both implicit TLS (port 465) and STARTTLS
//! - **Authentication**: PLAIN and LOGIN
//! - **Timeouts**: every read and write on the connection can be bounded
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use muttdown_smtp::{Address, Client};
//! use muttdown_smtp::connection::connect_tls;
//!
//! let stream = connect_tls("smtp.example.com", 465, Some(Duration::from_secs(10))).await?;
//! let client = Client::from_stream(stream).await?.ehlo("localhost").await?;
//! let client = client.auth_plain("user@example.com", "password").await?;
//!
//! let client = client.mail_from(Address::new("sender@example.com")?, None).await?;
//! let client = client.rcpt_to(Address::new("recipient@example.com")?).await?;
//! let client = client.data().await?;
//! let client = client.send_message(b"Subject: Test\n\nHello, World!\n").await?;
//! client.quit().await?;
//! ```
//!
//! ## Connection States
//!
//! ```text
//! ┌──────────────┐
//! │  Connected   │ ─── auth_*() ───→ Authenticated
//! └──────────────┘                        │
//!        │                                │
//!        └──────── mail_from() ←──────────┘
//!                      │
//!                      ↓
//!              MailTransaction ─── rcpt_to() ───→ RecipientAdded ─── data() ───→ Data
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
pub mod command;
pub mod connection;
mod error;
mod extension;
pub mod reply;

pub use address::Address;
pub use command::{BodyType, Command};
pub use connection::{
    Authenticated, Client, Connected, Data, MailTransaction, Ready, RecipientAdded, ServerInfo,
    SmtpStream,
};
pub use error::{Error, Result};
pub use extension::{AuthMechanism, Extension};
pub use reply::{Reply, ReplyCode};
