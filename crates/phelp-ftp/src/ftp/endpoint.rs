//! Connection URI → `EndpointConfig`.
//!
//! Format: `[scheme://][user[:password]@]host[:port][/default/path]`
//! where scheme is `ftp` (plain, the default) or `sftp` / `ftps` (secure).

use std::fmt;

use percent_encoding::percent_decode_str;

use crate::ftp::error::{FtpError, FtpResult};

pub const DEFAULT_PORT: u16 = 21;

const PLAIN_SCHEMES: &[&str] = &["ftp"];
const SECURE_SCHEMES: &[&str] = &["sftp", "ftps"];

/// Where and as whom to connect. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    host: String,
    port: u16,
    user: Option<String>,
    password: Option<String>,
    secure: bool,
    default_path: Option<String>,
}

impl EndpointConfig {
    /// Plain endpoint on the default port, no credentials.
    pub fn new(host: impl Into<String>) -> FtpResult<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(FtpError::config("Invalid uri, host must not be empty"));
        }
        Ok(Self {
            host,
            port: DEFAULT_PORT,
            user: None,
            password: None,
            secure: false,
            default_path: None,
        })
    }

    /// Parse a connection URI.
    pub fn parse(uri: &str) -> FtpResult<Self> {
        let uri = uri.trim();
        let normalized = if uri.contains("://") {
            uri.to_string()
        } else {
            format!("ftp://{}", uri)
        };

        let url = url::Url::parse(&normalized)
            .map_err(|e| FtpError::config(format!("Invalid uri '{}': {}", uri, e)))?;

        let scheme = url.scheme();
        let secure = if SECURE_SCHEMES.contains(&scheme) {
            true
        } else if PLAIN_SCHEMES.contains(&scheme) {
            false
        } else {
            return Err(FtpError::config(format!(
                "Invalid uri, scheme must be ftp or sftp (got '{}')",
                scheme
            )));
        };

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => return Err(FtpError::config(format!("Invalid uri '{}': missing host", uri))),
        };

        // `url` folds the ftp default away; an explicit 0 counts as absent.
        let port = match url.port() {
            Some(p) if p > 0 => p,
            _ => DEFAULT_PORT,
        };

        let user = Some(decode(url.username())).filter(|u| !u.is_empty());
        let password = url.password().map(decode);

        let path = decode(url.path());
        let default_path = if path.is_empty() || path == "/" {
            None
        } else {
            Some(path)
        };

        Ok(Self {
            host,
            port,
            user,
            password,
            secure,
            default_path,
        })
    }

    // ── Builders ─────────────────────────────────────────────────

    pub fn with_port(mut self, port: u16) -> FtpResult<Self> {
        if port == 0 {
            return Err(FtpError::config("Invalid port, must be greater than 0"));
        }
        self.port = port;
        Ok(self)
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_default_path(mut self, path: impl Into<String>) -> Self {
        self.default_path = Some(path.into());
        self
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn default_path(&self) -> Option<&str> {
        self.default_path.as_deref()
    }

    /// Both user and password present and non-empty.
    pub fn has_credentials(&self) -> bool {
        matches!((self.user(), self.password()), (Some(u), Some(p)) if !u.is_empty() && !p.is_empty())
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Host as a TLS server name (IPv6 brackets removed).
    pub(crate) fn server_name(&self) -> &str {
        self.host.trim_start_matches('[').trim_end_matches(']')
    }
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("secure", &self.secure)
            .field("default_path", &self.default_path)
            .finish()
    }
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
