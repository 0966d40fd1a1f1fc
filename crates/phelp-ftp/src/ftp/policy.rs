//! Error-signalling facades over [`FtpSession`].
//!
//! Both wrap the same state machine and expose the same operations; they
//! differ only in how a failed `FtpResult` reaches the caller.

use std::path::Path;

use log::warn;

use crate::ftp::endpoint::EndpointConfig;
use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::session::FtpSession;
use crate::ftp::types::{ErrorPolicy, SessionOptions, TransferMode};

// ─── Fail fast ───────────────────────────────────────────────────────

/// Failures come back as `Err`; successful mutating calls return the
/// session so they chain.
pub struct FailFastSession {
    inner: FtpSession,
}

impl FailFastSession {
    pub fn new(config: EndpointConfig, options: SessionOptions) -> Self {
        Self {
            inner: FtpSession::new(config, options.with_policy(ErrorPolicy::FailFast)),
        }
    }

    /// Parse `uri`, connect, and log in when it carries credentials.
    pub async fn open(uri: &str) -> FtpResult<Self> {
        Self::open_with(uri, SessionOptions::default()).await
    }

    pub async fn open_with(uri: &str, options: SessionOptions) -> FtpResult<Self> {
        let config = EndpointConfig::parse(uri).map_err(|e| raised("open", e))?;
        let mut session = Self::new(config, options);
        session.connect().await?;
        Ok(session)
    }

    pub async fn connect(&mut self) -> FtpResult<&mut Self> {
        self.inner.connect().await.map_err(|e| raised("connect", e))?;
        Ok(self)
    }

    pub async fn login(&mut self) -> FtpResult<&mut Self> {
        self.inner.login().await.map_err(|e| raised("login", e))?;
        Ok(self)
    }

    pub async fn cd(&mut self, folder: &str) -> FtpResult<&mut Self> {
        self.inner.cd(folder).await.map_err(|e| raised("cd", e))?;
        Ok(self)
    }

    pub async fn mkdir(&mut self, directory: &str) -> FtpResult<&mut Self> {
        self.inner.mkdir(directory).await.map_err(|e| raised("mkdir", e))?;
        Ok(self)
    }

    pub async fn rmdir(&mut self, directory: &str) -> FtpResult<&mut Self> {
        self.inner.rmdir(directory).await.map_err(|e| raised("rmdir", e))?;
        Ok(self)
    }

    pub async fn delete(&mut self, remote_file: &str) -> FtpResult<&mut Self> {
        self.inner.delete(remote_file).await.map_err(|e| raised("delete", e))?;
        Ok(self)
    }

    pub async fn rename(&mut self, old_name: &str, new_name: &str) -> FtpResult<&mut Self> {
        self.inner
            .rename(old_name, new_name)
            .await
            .map_err(|e| raised("rename", e))?;
        Ok(self)
    }

    pub async fn chmod(&mut self, permissions: u32, remote_file: &str) -> FtpResult<&mut Self> {
        self.inner
            .chmod(permissions, remote_file)
            .await
            .map_err(|e| raised("chmod", e))?;
        Ok(self)
    }

    pub async fn get(&mut self, remote_file: &str, local_file: impl AsRef<Path>) -> FtpResult<&mut Self> {
        self.inner
            .get(remote_file, local_file)
            .await
            .map_err(|e| raised("get", e))?;
        Ok(self)
    }

    pub async fn get_with_mode(
        &mut self,
        remote_file: &str,
        local_file: impl AsRef<Path>,
        mode: TransferMode,
    ) -> FtpResult<&mut Self> {
        self.inner
            .get_with_mode(remote_file, local_file, mode)
            .await
            .map_err(|e| raised("get", e))?;
        Ok(self)
    }

    pub async fn put(&mut self, local_file: impl AsRef<Path>, remote_file: &str) -> FtpResult<&mut Self> {
        self.inner
            .put(local_file, remote_file)
            .await
            .map_err(|e| raised("put", e))?;
        Ok(self)
    }

    pub async fn put_with_mode(
        &mut self,
        local_file: impl AsRef<Path>,
        remote_file: &str,
        mode: TransferMode,
    ) -> FtpResult<&mut Self> {
        self.inner
            .put_with_mode(local_file, remote_file, mode)
            .await
            .map_err(|e| raised("put", e))?;
        Ok(self)
    }

    pub async fn ls(&mut self, directory: &str) -> FtpResult<Vec<String>> {
        self.inner.ls(directory).await.map_err(|e| raised("ls", e))
    }

    pub async fn pwd(&mut self) -> FtpResult<String> {
        self.inner.pwd().await.map_err(|e| raised("pwd", e))
    }

    pub async fn close(&mut self) {
        self.inner.close().await;
    }

    pub fn session(&self) -> &FtpSession {
        &self.inner
    }

    pub fn into_inner(self) -> FtpSession {
        self.inner
    }
}

fn raised(op: &str, err: FtpError) -> FtpError {
    warn!("FTP {} failed: {}", op, err);
    err
}

// ─── Report and continue ─────────────────────────────────────────────

/// Failures are recorded as the last error and the call returns `false`
/// (an empty listing for `ls`, `None` for `pwd`).
///
/// A later success leaves the recorded error in place.
pub struct ReportingSession {
    inner: FtpSession,
    last_error: Option<FtpError>,
}

impl ReportingSession {
    pub fn new(config: EndpointConfig, options: SessionOptions) -> Self {
        Self {
            inner: FtpSession::new(config, options.with_policy(ErrorPolicy::ReportAndContinue)),
            last_error: None,
        }
    }

    /// Parse `uri` and attempt to connect.
    ///
    /// Only a malformed URI is returned as `Err`; there is no session yet to
    /// record it on. Connection and login failures land in `last_error`.
    pub async fn open(uri: &str) -> FtpResult<Self> {
        Self::open_with(uri, SessionOptions::default()).await
    }

    pub async fn open_with(uri: &str, options: SessionOptions) -> FtpResult<Self> {
        let config = EndpointConfig::parse(uri)?;
        let mut session = Self::new(config, options);
        session.connect().await;
        Ok(session)
    }

    pub async fn connect(&mut self) -> bool {
        let result = self.inner.connect().await;
        self.record("connect", result).is_some()
    }

    pub async fn login(&mut self) -> bool {
        let result = self.inner.login().await;
        self.record("login", result).is_some()
    }

    pub async fn cd(&mut self, folder: &str) -> bool {
        let result = self.inner.cd(folder).await;
        self.record("cd", result).is_some()
    }

    pub async fn mkdir(&mut self, directory: &str) -> bool {
        let result = self.inner.mkdir(directory).await;
        self.record("mkdir", result).is_some()
    }

    pub async fn rmdir(&mut self, directory: &str) -> bool {
        let result = self.inner.rmdir(directory).await;
        self.record("rmdir", result).is_some()
    }

    pub async fn delete(&mut self, remote_file: &str) -> bool {
        let result = self.inner.delete(remote_file).await;
        self.record("delete", result).is_some()
    }

    pub async fn rename(&mut self, old_name: &str, new_name: &str) -> bool {
        let result = self.inner.rename(old_name, new_name).await;
        self.record("rename", result).is_some()
    }

    pub async fn chmod(&mut self, permissions: u32, remote_file: &str) -> bool {
        let result = self.inner.chmod(permissions, remote_file).await;
        self.record("chmod", result).is_some()
    }

    pub async fn get(&mut self, remote_file: &str, local_file: impl AsRef<Path>) -> bool {
        let result = self.inner.get(remote_file, local_file).await;
        self.record("get", result).is_some()
    }

    pub async fn get_with_mode(
        &mut self,
        remote_file: &str,
        local_file: impl AsRef<Path>,
        mode: TransferMode,
    ) -> bool {
        let result = self.inner.get_with_mode(remote_file, local_file, mode).await;
        self.record("get", result).is_some()
    }

    pub async fn put(&mut self, local_file: impl AsRef<Path>, remote_file: &str) -> bool {
        let result = self.inner.put(local_file, remote_file).await;
        self.record("put", result).is_some()
    }

    pub async fn put_with_mode(
        &mut self,
        local_file: impl AsRef<Path>,
        remote_file: &str,
        mode: TransferMode,
    ) -> bool {
        let result = self.inner.put_with_mode(local_file, remote_file, mode).await;
        self.record("put", result).is_some()
    }

    /// Empty both for an empty directory and for a failure; only the
    /// failure sets `last_error`.
    pub async fn ls(&mut self, directory: &str) -> Vec<String> {
        let result = self.inner.ls(directory).await;
        self.record("ls", result).unwrap_or_default()
    }

    pub async fn pwd(&mut self) -> Option<String> {
        let result = self.inner.pwd().await;
        self.record("pwd", result)
    }

    pub async fn close(&mut self) {
        self.inner.close().await;
    }

    /// Human-readable text of the most recent failure.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.as_ref().map(|e| e.to_string())
    }

    /// The most recent failure with its kind and reply code.
    pub fn last_failure(&self) -> Option<&FtpError> {
        self.last_error.as_ref()
    }

    pub fn session(&self) -> &FtpSession {
        &self.inner
    }

    pub fn into_inner(self) -> FtpSession {
        self.inner
    }

    fn record<T>(&mut self, op: &str, result: FtpResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("FTP {} failed: {}", op, e);
                self.last_error = Some(e);
                None
            }
        }
    }
}

// ─── Policy selected at runtime ──────────────────────────────────────

/// A session whose facade was picked from `SessionOptions::error_policy`.
///
/// Operations are forwarded to the chosen facade. Mutating calls yield
/// `Ok(true)` on success, `Err` for a failure under fail-fast, and
/// `Ok(false)` for a failure under report-and-continue (see
/// [`PolicySession::last_error`]). Match on the variant to reach the
/// facade's own return types, such as chaining.
pub enum PolicySession {
    FailFast(FailFastSession),
    Reporting(ReportingSession),
}

impl PolicySession {
    pub fn new(config: EndpointConfig, options: SessionOptions) -> Self {
        match options.error_policy {
            ErrorPolicy::FailFast => Self::FailFast(FailFastSession::new(config, options)),
            ErrorPolicy::ReportAndContinue => {
                Self::Reporting(ReportingSession::new(config, options))
            }
        }
    }

    /// Parse `uri` with default options (fail-fast) and connect.
    pub async fn open(uri: &str) -> FtpResult<Self> {
        Self::open_with(uri, SessionOptions::default()).await
    }

    /// Parse `uri` and connect under `options.error_policy`.
    pub async fn open_with(uri: &str, options: SessionOptions) -> FtpResult<Self> {
        Ok(match options.error_policy {
            ErrorPolicy::FailFast => Self::FailFast(FailFastSession::open_with(uri, options).await?),
            ErrorPolicy::ReportAndContinue => {
                Self::Reporting(ReportingSession::open_with(uri, options).await?)
            }
        })
    }

    pub fn policy(&self) -> ErrorPolicy {
        match self {
            Self::FailFast(_) => ErrorPolicy::FailFast,
            Self::Reporting(_) => ErrorPolicy::ReportAndContinue,
        }
    }

    pub async fn connect(&mut self) -> FtpResult<bool> {
        match self {
            Self::FailFast(s) => s.connect().await.map(|_| true),
            Self::Reporting(s) => Ok(s.connect().await),
        }
    }

    pub async fn login(&mut self) -> FtpResult<bool> {
        match self {
            Self::FailFast(s) => s.login().await.map(|_| true),
            Self::Reporting(s) => Ok(s.login().await),
        }
    }

    pub async fn cd(&mut self, folder: &str) -> FtpResult<bool> {
        match self {
            Self::FailFast(s) => s.cd(folder).await.map(|_| true),
            Self::Reporting(s) => Ok(s.cd(folder).await),
        }
    }

    pub async fn mkdir(&mut self, directory: &str) -> FtpResult<bool> {
        match self {
            Self::FailFast(s) => s.mkdir(directory).await.map(|_| true),
            Self::Reporting(s) => Ok(s.mkdir(directory).await),
        }
    }

    pub async fn rmdir(&mut self, directory: &str) -> FtpResult<bool> {
        match self {
            Self::FailFast(s) => s.rmdir(directory).await.map(|_| true),
            Self::Reporting(s) => Ok(s.rmdir(directory).await),
        }
    }

    pub async fn delete(&mut self, remote_file: &str) -> FtpResult<bool> {
        match self {
            Self::FailFast(s) => s.delete(remote_file).await.map(|_| true),
            Self::Reporting(s) => Ok(s.delete(remote_file).await),
        }
    }

    pub async fn rename(&mut self, old_name: &str, new_name: &str) -> FtpResult<bool> {
        match self {
            Self::FailFast(s) => s.rename(old_name, new_name).await.map(|_| true),
            Self::Reporting(s) => Ok(s.rename(old_name, new_name).await),
        }
    }

    pub async fn chmod(&mut self, permissions: u32, remote_file: &str) -> FtpResult<bool> {
        match self {
            Self::FailFast(s) => s.chmod(permissions, remote_file).await.map(|_| true),
            Self::Reporting(s) => Ok(s.chmod(permissions, remote_file).await),
        }
    }

    pub async fn get(&mut self, remote_file: &str, local_file: impl AsRef<Path>) -> FtpResult<bool> {
        match self {
            Self::FailFast(s) => s.get(remote_file, local_file).await.map(|_| true),
            Self::Reporting(s) => Ok(s.get(remote_file, local_file).await),
        }
    }

    pub async fn get_with_mode(
        &mut self,
        remote_file: &str,
        local_file: impl AsRef<Path>,
        mode: TransferMode,
    ) -> FtpResult<bool> {
        match self {
            Self::FailFast(s) => s
                .get_with_mode(remote_file, local_file, mode)
                .await
                .map(|_| true),
            Self::Reporting(s) => Ok(s.get_with_mode(remote_file, local_file, mode).await),
        }
    }

    pub async fn put(&mut self, local_file: impl AsRef<Path>, remote_file: &str) -> FtpResult<bool> {
        match self {
            Self::FailFast(s) => s.put(local_file, remote_file).await.map(|_| true),
            Self::Reporting(s) => Ok(s.put(local_file, remote_file).await),
        }
    }

    pub async fn put_with_mode(
        &mut self,
        local_file: impl AsRef<Path>,
        remote_file: &str,
        mode: TransferMode,
    ) -> FtpResult<bool> {
        match self {
            Self::FailFast(s) => s
                .put_with_mode(local_file, remote_file, mode)
                .await
                .map(|_| true),
            Self::Reporting(s) => Ok(s.put_with_mode(local_file, remote_file, mode).await),
        }
    }

    /// An empty listing under report-and-continue may be a recorded failure.
    pub async fn ls(&mut self, directory: &str) -> FtpResult<Vec<String>> {
        match self {
            Self::FailFast(s) => s.ls(directory).await,
            Self::Reporting(s) => Ok(s.ls(directory).await),
        }
    }

    pub async fn pwd(&mut self) -> FtpResult<Option<String>> {
        match self {
            Self::FailFast(s) => s.pwd().await.map(Some),
            Self::Reporting(s) => Ok(s.pwd().await),
        }
    }

    pub async fn close(&mut self) {
        match self {
            Self::FailFast(s) => s.close().await,
            Self::Reporting(s) => s.close().await,
        }
    }

    /// Recorded failure text; always `None` under fail-fast.
    pub fn last_error(&self) -> Option<String> {
        match self {
            Self::FailFast(_) => None,
            Self::Reporting(s) => s.last_error(),
        }
    }

    pub fn session(&self) -> &FtpSession {
        match self {
            Self::FailFast(s) => s.session(),
            Self::Reporting(s) => s.session(),
        }
    }
}
