//! Delivery of the rewritten message.
//!
//! Two transports are available: piping to a local sendmail-compatible
//! program, and relaying through an SMTP server.

pub mod sendmail;
pub mod smtp;

pub use sendmail::{SendmailError, send_with_sendmail};
pub use smtp::{SmtpError, SmtpSettings, deliver, send_with_smtp};

use crate::error::{Error, Result};
use muttdown_smtp::Address;

/// Envelope sender and recipients, independent of the message headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    from: Address,
    recipients: Vec<Address>,
}

impl Envelope {
    /// Creates a validated envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if an address is malformed or there are no
    /// recipients.
    pub fn new<S: AsRef<str>>(
        from: &str,
        recipients: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let from = Address::new(from).map_err(|e| Error::InvalidEnvelope(e.to_string()))?;
        let recipients = recipients
            .into_iter()
            .map(|r| Address::new(r).map_err(|e| Error::InvalidEnvelope(e.to_string())))
            .collect::<Result<Vec<_>>>()?;
        if recipients.is_empty() {
            return Err(Error::InvalidEnvelope("No recipients specified".into()));
        }
        Ok(Self { from, recipients })
    }

    /// Returns the envelope sender.
    #[must_use]
    pub const fn from(&self) -> &Address {
        &self.from
    }

    /// Returns the envelope recipients.
    #[must_use]
    pub fn recipients(&self) -> &[Address] {
        &self.recipients
    }
}
