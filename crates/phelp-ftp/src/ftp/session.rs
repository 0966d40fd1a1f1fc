//! Stateful FTP session: owns the transport link and issues commands.
//!
//! Lifecycle: `connect()` → (auto) `login()` → passive setting + SYST →
//! optional CWD into the endpoint's default path → operations → `close()`.
//!
//! Every operation returns an [`FtpResult`]; the policy facades in
//! `policy.rs` decide how that result reaches the caller.

use log::{debug, info, warn};

use crate::ftp::connection::TransportLink;
use crate::ftp::endpoint::EndpointConfig;
use crate::ftp::error::{FtpError, FtpResult, LinkError};
use crate::ftp::types::{FtpResponse, SessionOptions};

const ANONYMOUS_USER: &str = "anonymous";
const ANONYMOUS_PASSWORD: &str = "anonymous@";

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Authenticated,
}

/// One FTP control-connection session.
///
/// The link is owned exclusively; dropping the session closes the socket.
pub struct FtpSession {
    config: EndpointConfig,
    options: SessionOptions,
    link: Option<TransportLink>,
    state: SessionState,
    system_type: Option<String>,
}

impl FtpSession {
    /// A disconnected session for `config`.
    pub fn new(config: EndpointConfig, options: SessionOptions) -> Self {
        Self {
            config,
            options,
            link: None,
            state: SessionState::Disconnected,
            system_type: None,
        }
    }

    // ─── Connect / Login ─────────────────────────────────────────

    /// Open the transport link; log in when the endpoint carries credentials.
    pub async fn connect(&mut self) -> FtpResult<()> {
        if self.link.is_some() {
            return Err(FtpError::invalid_state(format!(
                "Already connected to {}",
                self.config.host()
            )));
        }

        self.state = SessionState::Connecting;
        debug!("FTP session connecting to {}", self.config.address());
        match TransportLink::open(&self.config, &self.options).await {
            Ok(link) => {
                self.link = Some(link);
                self.state = SessionState::Connected;
            }
            Err(e) => {
                self.state = SessionState::Disconnected;
                return Err(e);
            }
        }

        if self.config.has_credentials() {
            self.login().await?;
        }
        Ok(())
    }

    /// Authenticate with the endpoint's credentials (anonymous when absent).
    ///
    /// On success the passive setting is applied to the link, the system
    /// type is queried, and the default path (if any) is entered. A failure
    /// to enter the default path is returned as that `cd` failure.
    pub async fn login(&mut self) -> FtpResult<()> {
        let result = self.authenticate().await;
        self.reap_broken_link();
        result.map_err(|e| FtpError::authentication(self.config.host()).caused_by(e))?;

        self.state = SessionState::Authenticated;
        info!(
            "FTP logged in to {} as {}",
            self.config.host(),
            self.config.user().unwrap_or(ANONYMOUS_USER)
        );

        let passive = self.options.passive;
        if let Some(link) = self.link.as_mut() {
            link.set_passive(passive);
            debug!("FTP data channel mode: {}", if passive { "passive" } else { "active" });

            self.system_type = match link.expect_ok("SYST").await {
                Ok(resp) => Some(resp.message().to_string()),
                Err(e) => {
                    debug!("SYST unavailable: {}", e);
                    None
                }
            };
        }
        self.reap_broken_link();

        if let Some(path) = self.config.default_path().map(str::to_owned) {
            self.cd(&path).await?;
        }
        Ok(())
    }

    async fn authenticate(&mut self) -> Result<(), LinkError> {
        let user = self.config.user().unwrap_or(ANONYMOUS_USER).to_string();
        let password = self
            .config
            .password()
            .unwrap_or(ANONYMOUS_PASSWORD)
            .to_string();
        let link = self.link_mut()?;

        let user_resp = link.execute(&format!("USER {}", user)).await?;
        match user_resp.code {
            230 | 202 => Ok(()),
            331 => {
                let pass_resp = link.execute(&format!("PASS {}", password)).await?;
                if pass_resp.is_completion() {
                    Ok(())
                } else {
                    Err(LinkError::Rejected(pass_resp))
                }
            }
            _ => Err(LinkError::Rejected(user_resp)),
        }
    }

    // ─── Navigation ──────────────────────────────────────────────

    /// Change the remote working directory. Nothing is cached locally.
    pub async fn cd(&mut self, folder: &str) -> FtpResult<()> {
        self.simple_command(&format!("CWD {}", folder), 2)
            .await
            .map(drop)
            .map_err(|e| {
                FtpError::navigation(format!("Failed to change folder to \"{}\"", folder))
                    .caused_by(e)
            })
    }

    /// Server-reported working directory.
    pub async fn pwd(&mut self) -> FtpResult<String> {
        let resp = self
            .simple_command("PWD", 2)
            .await
            .map_err(|e| FtpError::navigation("Failed to get current directory").caused_by(e))?;
        parse_quoted_path(&resp.text()).ok_or_else(|| {
            FtpError::navigation("Failed to get current directory").with_detail(resp.text())
        })
    }

    // ─── Close ───────────────────────────────────────────────────

    /// Close the link if open. Idempotent, never fails.
    pub async fn close(&mut self) {
        if let Some(link) = self.link.take() {
            link.shutdown().await;
        }
        self.state = SessionState::Disconnected;
    }

    // ─── Accessors ───────────────────────────────────────────────

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// SYST reply text, populated after login.
    pub fn system_type(&self) -> Option<&str> {
        self.system_type.as_deref()
    }

    /// Data-channel mode of the open link, else the configured one.
    pub fn passive(&self) -> bool {
        self.link
            .as_ref()
            .map_or(self.options.passive, TransportLink::is_passive)
    }

    pub fn link(&self) -> Option<&TransportLink> {
        self.link.as_ref()
    }

    // ─── Internals ───────────────────────────────────────────────

    pub(crate) fn link_mut(&mut self) -> Result<&mut TransportLink, LinkError> {
        self.link.as_mut().ok_or(LinkError::NotConnected)
    }

    /// One command, one reply of the expected class.
    pub(crate) async fn simple_command(
        &mut self,
        cmd: &str,
        expected_first_digit: u16,
    ) -> Result<FtpResponse, LinkError> {
        let result = self.link_mut()?.expect(cmd, expected_first_digit).await;
        self.reap_broken_link();
        result
    }

    /// Drop a link the server has already closed.
    pub(crate) fn reap_broken_link(&mut self) {
        if self.link.as_ref().is_some_and(TransportLink::is_broken) {
            warn!("FTP control connection to {} lost", self.config.host());
            self.link = None;
            self.state = SessionState::Disconnected;
        }
    }
}

impl Drop for FtpSession {
    fn drop(&mut self) {
        if self.link.is_some() {
            debug!(
                "FTP session to {} dropped without close(); releasing link",
                self.config.host()
            );
        }
    }
}

/// Parse `257 "/some/path" ...` into the path; `""` inside quotes is a quote.
pub(crate) fn parse_quoted_path(text: &str) -> Option<String> {
    let start = text.find('"')? + 1;
    let mut path = String::new();
    let mut chars = text[start..].chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
                path.push('"');
            } else {
                return Some(path);
            }
        } else {
            path.push(c);
        }
    }
    None
}
