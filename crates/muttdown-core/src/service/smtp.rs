//! Relaying through an SMTP server.

use super::Envelope;
use crate::config::Config;
use crate::error::Result;
use muttdown_smtp::connection::{connect, connect_tls};
use muttdown_smtp::{BodyType, Client, Ready};
use std::time::Duration;

/// Local name sent with EHLO.
const CLIENT_HOSTNAME: &str = "localhost";

/// Errors that can occur during SMTP operations.
#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Send failed.
    #[error("Send failed: {0}")]
    Send(String),
}

/// Connection settings for the relay, with the password already resolved.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    /// Server host name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Implicit TLS instead of STARTTLS.
    pub ssl: bool,
    /// User name; empty disables authentication.
    pub username: String,
    /// Password used with `username`.
    pub password: Option<String>,
    /// Timeout for every network operation.
    pub timeout: Duration,
}

impl SmtpSettings {
    /// Builds settings from configuration, running the password command if
    /// one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the password command fails.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            ssl: config.smtp_ssl,
            username: config.smtp_username.clone(),
            password: config.smtp_password()?,
            timeout: config.timeout(),
        })
    }
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ssl", &self.ssl)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Sends a message through the configured relay.
///
/// # Errors
///
/// Returns an error if connection, authentication, or sending fails.
pub async fn send_with_smtp(
    settings: &SmtpSettings,
    envelope: &Envelope,
    message: &[u8],
) -> std::result::Result<(), SmtpError> {
    let timeout = Some(settings.timeout);
    let host = settings.host.as_str();

    let stream = if settings.ssl {
        connect_tls(host, settings.port, timeout).await
    } else {
        connect(host, settings.port, timeout).await
    }
    .map_err(|e| SmtpError::Connection(e.to_string()))?;

    let client = Client::from_stream(stream)
        .await
        .map_err(|e| SmtpError::Connection(e.to_string()))?
        .ehlo(CLIENT_HOSTNAME)
        .await
        .map_err(|e| SmtpError::Connection(e.to_string()))?;

    // Upgrade to TLS if not using implicit TLS
    let client = if settings.ssl {
        client
    } else {
        client
            .starttls(host)
            .await
            .map_err(|e| SmtpError::Connection(e.to_string()))?
    };
    tracing::debug!(host, port = settings.port, "Connected to SMTP relay");

    if settings.username.is_empty() {
        return deliver(client, envelope, message).await;
    }

    let password = settings.password.as_deref().unwrap_or_default();
    let client = client
        .auth(&settings.username, password)
        .await
        .map_err(|e| SmtpError::Authentication(e.to_string()))?;
    deliver(client, envelope, message).await
}

/// Runs one mail transaction on an established session and closes it.
///
/// `BODY=8BITMIME` is requested when the message has 8-bit bytes and the
/// server advertises the extension.
///
/// # Errors
///
/// Returns an error if the server rejects the sender, any recipient, or the
/// message.
pub async fn deliver<S: Ready>(
    client: Client<S>,
    envelope: &Envelope,
    message: &[u8],
) -> std::result::Result<(), SmtpError> {
    let send_error = |e: muttdown_smtp::Error| SmtpError::Send(e.to_string());

    let body = (BodyType::of(message) == BodyType::EightBitMime
        && client.server_info().supports_8bitmime())
    .then_some(BodyType::EightBitMime);

    let client = client
        .mail_from(envelope.from().clone(), body)
        .await
        .map_err(send_error)?;

    let (first, rest) = envelope
        .recipients()
        .split_first()
        .ok_or_else(|| SmtpError::Send("No recipients specified".into()))?;
    let mut client = client.rcpt_to(first.clone()).await.map_err(send_error)?;
    for recipient in rest {
        client = client.rcpt_to(recipient.clone()).await.map_err(send_error)?;
    }

    let client = client
        .data()
        .await
        .map_err(send_error)?
        .send_message(message)
        .await
        .map_err(send_error)?;
    client.quit().await.map_err(send_error)?;

    tracing::info!(
        recipients = envelope.recipients().len(),
        "Message relayed over SMTP"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn settings_from_config() {
        let config = Config::from_yaml(
            "smtp_host: relay\n\
             smtp_port: 587\n\
             smtp_ssl: false\n\
             smtp_username: me\n\
             smtp_password: pw\n\
             smtp_timeout: 3\n",
        )
        .unwrap();
        let settings = SmtpSettings::from_config(&config).unwrap();
        assert_eq!(settings.host, "relay");
        assert_eq!(settings.port, 587);
        assert!(!settings.ssl);
        assert_eq!(settings.password.as_deref(), Some("pw"));
        assert_eq!(settings.timeout, Duration::from_secs(3));
    }

    #[test]
    fn debug_hides_password() {
        let config = Config::from_yaml("smtp_password: topsecret\n").unwrap();
        let settings = SmtpSettings::from_config(&config).unwrap();
        assert!(!format!("{settings:?}").contains("topsecret"));
    }
}
