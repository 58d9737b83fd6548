//! Low-level SMTP stream handling.

use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};

#[derive(Debug)]
enum Transport {
    Tcp(BufReader<TcpStream>),
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<TcpStream>>>),
}

/// SMTP stream (TCP or TLS) with an optional per-operation timeout.
#[derive(Debug)]
pub struct SmtpStream {
    transport: Transport,
    timeout: Option<Duration>,
}

impl SmtpStream {
    /// Wraps an established TCP connection.
    #[must_use]
    pub fn from_tcp(stream: TcpStream, timeout: Option<Duration>) -> Self {
        Self {
            transport: Transport::Tcp(BufReader::new(stream)),
            timeout,
        }
    }

    /// Returns true if the stream is encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self.transport, Transport::Tls(_))
    }

    /// Reads one line from the stream, without its terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails, times out, or the server closed
    /// the connection.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let limit = self.timeout;
        let read = match &mut self.transport {
            Transport::Tcp(reader) => with_timeout(limit, reader.read_line(&mut line)).await?,
            Transport::Tls(reader) => with_timeout(limit, reader.read_line(&mut line)).await?,
        };
        if read == 0 {
            return Err(Error::Protocol("Connection closed by server".into()));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Writes data to the stream and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or times out.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let limit = self.timeout;
        match &mut self.transport {
            Transport::Tcp(reader) => {
                let writer = reader.get_mut();
                with_timeout(limit, async {
                    writer.write_all(data).await?;
                    writer.flush().await
                })
                .await
            }
            Transport::Tls(reader) => {
                let writer = reader.get_mut();
                with_timeout(limit, async {
                    writer.write_all(data).await?;
                    writer.flush().await
                })
                .await
            }
        }
    }

    /// Upgrades a TCP stream to TLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already encrypted or the TLS
    /// handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str) -> Result<Self> {
        let tcp_stream = match self.transport {
            Transport::Tcp(reader) => reader.into_inner(),
            Transport::Tls(_) => return Err(Error::Protocol("Already using TLS".into())),
        };
        handshake(tcp_stream, hostname, self.timeout).await
    }
}

async fn with_timeout<T>(
    limit: Option<Duration>,
    fut: impl Future<Output = std::io::Result<T>>,
) -> Result<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::Timeout(limit))?
            .map_err(Error::from),
        None => fut.await.map_err(Error::from),
    }
}

async fn handshake(
    tcp_stream: TcpStream,
    hostname: &str,
    timeout: Option<Duration>,
) -> Result<SmtpStream> {
    let connector = create_tls_connector();
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("Invalid hostname: {hostname}")))?;

    let tls_stream = with_timeout(timeout, connector.connect(server_name, tcp_stream)).await?;
    Ok(SmtpStream {
        transport: Transport::Tls(Box::new(BufReader::new(tls_stream))),
        timeout,
    })
}

/// Connects to an SMTP server over plain TCP.
///
/// # Errors
///
/// Returns an error if the connection fails or times out.
pub async fn connect(hostname: &str, port: u16, timeout: Option<Duration>) -> Result<SmtpStream> {
    let stream = with_timeout(timeout, TcpStream::connect((hostname, port))).await?;
    Ok(SmtpStream::from_tcp(stream, timeout))
}

/// Connects to an SMTP server over TLS (implicit TLS on port 465).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails.
pub async fn connect_tls(
    hostname: &str,
    port: u16,
    timeout: Option<Duration>,
) -> Result<SmtpStream> {
    let tcp_stream = with_timeout(timeout, TcpStream::connect((hostname, port))).await?;
    handshake(tcp_stream, hostname, timeout).await
}

/// Creates a TLS connector trusting the bundled web PKI roots.
fn create_tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
