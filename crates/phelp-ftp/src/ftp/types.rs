//! Shared types for the FTP crate.

use serde::{Deserialize, Serialize};

use crate::ftp::error::{FtpError, FtpResult};

// ─── Policy / Modes ──────────────────────────────────────────────────

/// How a session signals failure to its caller. Fixed at construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ErrorPolicy {
    /// Record the failure as the last error and return a failure indicator.
    ReportAndContinue,
    /// Return the failure immediately; successes return the session.
    #[default]
    FailFast,
}

/// Transfer framing (RFC 959 TYPE command).
///
/// `Ascii` is the default, so binary payloads must ask for `Binary`
/// explicitly or they get line-ending translation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TransferMode {
    #[default]
    Ascii,
    Binary,
}

impl TransferMode {
    pub(crate) fn type_command(self) -> &'static str {
        match self {
            Self::Ascii => "TYPE A",
            Self::Binary => "TYPE I",
        }
    }
}

// ─── Session options ─────────────────────────────────────────────────

/// Tunables for one session. Everything except the endpoint itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
    #[serde(default)]
    pub error_policy: ErrorPolicy,
    /// Use PASV data connections (client connects out) instead of PORT.
    #[serde(default = "default_true")]
    pub passive: bool,
    /// Framing used by `get`/`put` when the caller does not pass one.
    #[serde(default)]
    pub transfer_mode: TransferMode,
    /// Bounded wait for the initial connection. Later commands never time out.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_sec: u64,
    /// Accept self-signed / untrusted certificates on secure links.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_true() -> bool {
    true
}
fn default_connect_timeout() -> u64 {
    90
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::default(),
            passive: true,
            transfer_mode: TransferMode::default(),
            connect_timeout_sec: default_connect_timeout(),
            accept_invalid_certs: false,
        }
    }
}

impl SessionOptions {
    /// Load options from a JSON document; absent keys take their defaults.
    pub fn from_json(json: &str) -> FtpResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| FtpError::config(format!("Invalid session options: {}", e)))
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }
}

// ─── FTP Response ────────────────────────────────────────────────────

/// A single FTP reply (may be multi-line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpResponse {
    pub code: u16,
    pub lines: Vec<String>,
}

impl FtpResponse {
    /// Full reply text (all lines joined).
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Reply text of the final line with the code stripped.
    pub fn message(&self) -> &str {
        self.lines
            .last()
            .map(|l| l.get(4..).unwrap_or(""))
            .unwrap_or("")
    }

    /// Positive-preliminary reply (1xx).
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// Positive-completion reply (2xx).
    pub fn is_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// Positive-intermediate reply (3xx).
    pub fn is_intermediate(&self) -> bool {
        (300..400).contains(&self.code)
    }
}
