//! Error types for the markup crate.

/// Failure while encoding or decoding a markup document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    /// A key cannot be used as an element name.
    #[error("invalid element name \"{0}\"")]
    InvalidName(String),

    /// A bare scalar where only element content can go (sequence item or
    /// numeric key).
    #[error("scalar value cannot be merged into <{0}>")]
    UnkeyedScalar(String),

    /// The writer failed.
    #[error("XML write error: {0}")]
    Write(String),

    /// The input is not well-formed XML.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// The input has no root element.
    #[error("document has no root element")]
    Empty,
}

pub type MarkupResult<T> = Result<T, MarkupError>;
