//! Error types for the core library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The input message could not be parsed.
    #[error("MIME error: {0}")]
    Mime(#[from] muttdown_mime::Error),

    /// Configuration file or value is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file is not valid YAML for the expected keys.
    #[error("Configuration error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A file named by the configuration could not be read.
    #[error("Cannot read {}: {source}", path.display())]
    ReadFile {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// `smtp_password_command` failed.
    #[error("Password command failed: {0}")]
    PasswordCommand(String),

    /// Envelope sender or recipient is not a usable address.
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// Markdown rendering or CSS inlining failed.
    #[error("Render error: {0}")]
    Render(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
