//! FTP-specific error types.
//!
//! [`FtpError`] is what callers see. [`LinkError`] is the raw outcome of a
//! control/data channel exchange; the session turns it into an `FtpError`
//! of the operation that was running.

use std::fmt;

use crate::ftp::types::FtpResponse;

/// Which kind of control connection failed to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// Plain TCP connect failed or timed out.
    Plain,
    /// TCP, `AUTH TLS` or the TLS handshake failed on a secure endpoint.
    Secure,
    /// The peer answered, but not with an FTP greeting.
    Unrecognized,
}

/// Categorised FTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FtpErrorKind {
    /// Bad URI, scheme or option document.
    Config,
    /// Control channel could not be opened.
    Connection(ConnectionKind),
    /// Server rejected the credentials.
    Authentication,
    /// `cd` (or `pwd`) rejected.
    Navigation,
    /// `mkdir` / `rmdir` rejected.
    Directory,
    /// `delete` / `rename` / `get` / `put` rejected or interrupted.
    FileOperation,
    /// `chmod` rejected.
    Permission,
    /// Name-list command rejected.
    Listing,
    /// Operation needs an open link and there is none.
    NotConnected,
    /// Operation not valid in the current state (e.g. connecting twice).
    InvalidState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpError {
    pub kind: FtpErrorKind,
    pub message: String,
    /// FTP reply code that triggered the error, if any.
    pub code: Option<u16>,
    /// Server reply text or lower-level cause.
    pub detail: Option<String>,
}

pub type FtpResult<T> = Result<T, FtpError>;

// ── Construction helpers ─────────────────────────────────────────────

impl FtpError {
    pub fn new(kind: FtpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            code: None,
            detail: None,
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Config, msg)
    }

    pub fn connection(host: &str, kind: ConnectionKind) -> Self {
        let msg = match kind {
            ConnectionKind::Plain => format!("Failed to connect to {}", host),
            ConnectionKind::Secure => format!("Failed to connect to {} (SSL connection)", host),
            ConnectionKind::Unrecognized => {
                format!("Failed to connect to {} (invalid connection type)", host)
            }
        };
        Self::new(FtpErrorKind::Connection(kind), msg)
    }

    pub fn authentication(host: &str) -> Self {
        Self::new(
            FtpErrorKind::Authentication,
            format!("Failed to connect to {} (login failed)", host),
        )
    }

    pub fn navigation(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Navigation, msg)
    }

    pub fn directory(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Directory, msg)
    }

    pub fn file_operation(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::FileOperation, msg)
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Permission, msg)
    }

    pub fn listing(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Listing, msg)
    }

    pub fn not_connected() -> Self {
        Self::new(FtpErrorKind::NotConnected, "Not connected to an FTP server")
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::InvalidState, msg)
    }

    /// Attach the channel-level cause to an operation error.
    ///
    /// A missing link always wins: the operation never ran, so the result
    /// is `NotConnected` with the operation message as detail.
    pub(crate) fn caused_by(self, cause: LinkError) -> Self {
        match cause {
            LinkError::NotConnected => Self::not_connected().with_detail(self.message),
            LinkError::Rejected(resp) => {
                let code = resp.code;
                self.with_code(code).with_detail(resp.text())
            }
            other => self.with_detail(other.to_string()),
        }
    }

    // ── Predicates ───────────────────────────────────────────────

    pub fn is_config(&self) -> bool {
        self.kind == FtpErrorKind::Config
    }

    pub fn is_connection(&self) -> bool {
        matches!(self.kind, FtpErrorKind::Connection(_))
    }

    pub fn connection_kind(&self) -> Option<ConnectionKind> {
        match self.kind {
            FtpErrorKind::Connection(kind) => Some(kind),
            _ => None,
        }
    }
}

impl fmt::Display for FtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.message, detail),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for FtpError {}

impl From<FtpError> for String {
    fn from(e: FtpError) -> String {
        e.to_string()
    }
}

// ─── Channel-level errors ────────────────────────────────────────────

/// Outcome of a failed exchange on the control or data channel.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("not connected")]
    NotConnected,
    #[error("server closed the control connection")]
    Closed,
    #[error("control channel I/O: {0}")]
    Io(#[source] std::io::Error),
    #[error("data channel: {0}")]
    Data(#[source] std::io::Error),
    #[error("local file: {0}")]
    Local(#[source] std::io::Error),
    #[error("unexpected reply: {0}")]
    Protocol(String),
    #[error("{}", .0.text())]
    Rejected(FtpResponse),
}

impl From<std::io::Error> for LinkError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_messages_distinguish_kinds() {
        let plain = FtpError::connection("ftp.example.com", ConnectionKind::Plain);
        let secure = FtpError::connection("ftp.example.com", ConnectionKind::Secure);
        let other = FtpError::connection("ftp.example.com", ConnectionKind::Unrecognized);
        assert_eq!(plain.message, "Failed to connect to ftp.example.com");
        assert!(secure.message.contains("(SSL connection)"));
        assert!(other.message.contains("(invalid connection type)"));
        assert_eq!(secure.connection_kind(), Some(ConnectionKind::Secure));
        assert!(plain.is_connection());
    }

    #[test]
    fn rejected_reply_is_attached() {
        let resp = FtpResponse {
            code: 550,
            lines: vec!["550 Permission denied".into()],
        };
        let err = FtpError::directory("Failed to create directory \"/no/perm\"")
            .caused_by(LinkError::Rejected(resp));
        assert_eq!(err.kind, FtpErrorKind::Directory);
        assert_eq!(err.code, Some(550));
        assert_eq!(
            err.to_string(),
            "Failed to create directory \"/no/perm\": 550 Permission denied"
        );
    }

    #[test]
    fn missing_link_overrides_operation_kind() {
        let err = FtpError::navigation("Failed to change folder to \"/tmp\"")
            .caused_by(LinkError::NotConnected);
        assert_eq!(err.kind, FtpErrorKind::NotConnected);
        assert!(err.to_string().ends_with("Failed to change folder to \"/tmp\""));
    }
}
