//! Delivery through a local sendmail-compatible program.

use super::Envelope;
use muttdown_smtp::Address;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Errors that can occur while piping to sendmail.
#[derive(Debug, thiserror::Error)]
pub enum SendmailError {
    /// No program configured.
    #[error("Sendmail command is empty")]
    EmptyCommand,

    /// The program could not be started.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Writing the message or collecting the exit status failed.
    #[error("Failed to deliver message to {program}: {source}")]
    Io {
        /// Program being fed.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The program exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        /// Program that failed.
        program: String,
        /// Exit status.
        status: ExitStatus,
        /// Captured standard error.
        stderr: String,
    },
}

/// Pipes `message` to `command`, invoked as
/// `<command...> -f <from> <recipient...>`.
///
/// # Errors
///
/// Returns an error if the program cannot be run or exits unsuccessfully.
pub async fn send_with_sendmail(
    command: &[String],
    envelope: &Envelope,
    message: &[u8],
) -> Result<(), SendmailError> {
    let (program, args) = command.split_first().ok_or(SendmailError::EmptyCommand)?;
    let io_error = |source: std::io::Error| SendmailError::Io {
        program: program.clone(),
        source,
    };

    let mut child = Command::new(program)
        .args(args)
        .arg("-f")
        .arg(envelope.from().as_str())
        .args(envelope.recipients().iter().map(Address::as_str))
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| SendmailError::Spawn {
            program: program.clone(),
            source,
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(message).await.map_err(io_error)?;
        stdin.shutdown().await.map_err(io_error)?;
    }

    let output = child.wait_with_output().await.map_err(io_error)?;
    if !output.status.success() {
        return Err(SendmailError::Failed {
            program: program.clone(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        });
    }

    tracing::info!(
        program = %program,
        recipients = envelope.recipients().len(),
        "Message handed to sendmail"
    );
    Ok(())
}
