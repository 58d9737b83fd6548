//! Errors raised while reading a message.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a message or part cannot be represented.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `Content-Type` value without a usable `type/subtype`.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Body declared as base64 that does not decode.
    #[error("Malformed base64 body: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A `multipart/*` part with no `boundary` parameter.
    #[error("{0} part has no boundary")]
    MissingBoundary(String),

    /// Multipart body whose delimiters cannot be matched.
    #[error("Invalid multipart structure: {0}")]
    InvalidMultipart(String),

    /// Body decoding requested on a container.
    #[error("{0} is a container, not a leaf")]
    NotLeaf(String),
}
