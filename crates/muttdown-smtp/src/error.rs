//! Error types for SMTP operations.

use std::io;
use std::time::Duration;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of an SMTP session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS handshake or configuration failure.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// The server answered with a 4xx or 5xx reply.
    #[error("Server replied {code}: {message}")]
    Rejected {
        /// Reply code, e.g. 550.
        code: u16,
        /// Reply text, lines joined with newlines.
        message: String,
    },

    /// Reply that does not fit the exchange.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Envelope address that cannot be sent in MAIL FROM or RCPT TO.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Extension or mechanism the server did not advertise.
    #[error("Server does not support {0}")]
    NotSupported(String),

    /// No reply within the configured timeout.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Builds the error for a refused command.
    #[must_use]
    pub fn rejected(code: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    /// 5xx: retrying the same command will not help.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Rejected { code: 500..=599, .. })
    }

    /// 4xx: the server asks the client to try again later.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Rejected { code: 400..=499, .. })
    }
}
