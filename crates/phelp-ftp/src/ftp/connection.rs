//! `TransportLink`: the control connection owned by one session.
//!
//! Handles plain-TCP connect, the explicit `AUTH TLS` upgrade and the
//! connect-time timeout from `SessionOptions`. Every later exchange goes
//! through [`TransportLink::execute`] and friends, which also notice when the
//! server has dropped the connection.

use std::net::IpAddr;
use std::time::Duration;

use log::{debug, info};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::ftp::endpoint::EndpointConfig;
use crate::ftp::error::{ConnectionKind, FtpError, FtpResult, LinkError};
use crate::ftp::protocol::FtpCodec;
use crate::ftp::tls;
use crate::ftp::types::{FtpResponse, SessionOptions};

/// An open control channel plus the negotiated data-channel mode.
pub struct TransportLink {
    codec: FtpCodec,
    host: String,
    local_ip: IpAddr,
    peer_ip: IpAddr,
    passive: bool,
    broken: bool,
    banner: String,
}

impl TransportLink {
    /// Open the control connection and, for secure endpoints, upgrade it.
    ///
    /// Only this step is bounded by `connect_timeout_sec`.
    pub async fn open(config: &EndpointConfig, options: &SessionOptions) -> FtpResult<Self> {
        let kind = if config.is_secure() {
            ConnectionKind::Secure
        } else {
            ConnectionKind::Plain
        };
        let dur = Duration::from_secs(options.connect_timeout_sec);

        match timeout(dur, Self::establish(config, options)).await {
            Ok(result) => result,
            Err(_) => Err(FtpError::connection(config.host(), kind).with_detail(format!(
                "timed out after {}s",
                options.connect_timeout_sec
            ))),
        }
    }

    async fn establish(config: &EndpointConfig, options: &SessionOptions) -> FtpResult<Self> {
        let host = config.host();
        let addr = config.address();
        let transport_failure = |detail: String| {
            let kind = if config.is_secure() {
                ConnectionKind::Secure
            } else {
                ConnectionKind::Plain
            };
            FtpError::connection(host, kind).with_detail(detail)
        };

        let tcp = TcpStream::connect(&addr)
            .await
            .map_err(|e| transport_failure(format!("TCP connect to {}: {}", addr, e)))?;
        tcp.set_nodelay(true).ok();

        let local_ip = tcp
            .local_addr()
            .map_err(|e| transport_failure(e.to_string()))?
            .ip();
        let peer_ip = tcp
            .peer_addr()
            .map_err(|e| transport_failure(e.to_string()))?
            .ip();

        let mut codec = FtpCodec::from_tcp(tcp);

        // Anything other than a 220 greeting is not an FTP service we know.
        let unrecognized = |detail: String| {
            FtpError::connection(host, ConnectionKind::Unrecognized).with_detail(detail)
        };
        let banner = match codec.read_response().await {
            Ok(resp) if resp.code == 220 => resp,
            Ok(resp) => return Err(unrecognized(resp.text())),
            Err(e) => return Err(unrecognized(e.to_string())),
        };
        debug!("FTP banner from {}: {}", addr, banner.message());

        if config.is_secure() {
            let secure_failure = |detail: String| {
                FtpError::connection(host, ConnectionKind::Secure).with_detail(detail)
            };
            let resp = codec
                .execute("AUTH TLS")
                .await
                .map_err(|e| secure_failure(e.to_string()))?;
            if !resp.is_completion() {
                return Err(secure_failure(format!("AUTH TLS rejected: {}", resp.text())));
            }
            codec = tls::upgrade_to_tls(codec, config.server_name(), options.accept_invalid_certs)
                .await
                .map_err(|e| secure_failure(format!("TLS handshake: {}", e)))?;
            debug!("FTP control channel to {} upgraded to TLS", addr);
        }

        info!(
            "FTP connected to {}{}",
            addr,
            if config.is_secure() { " (TLS)" } else { "" }
        );

        Ok(Self {
            codec,
            host: host.to_string(),
            local_ip,
            peer_ip,
            passive: options.passive,
            broken: false,
            banner: banner.message().to_string(),
        })
    }

    // ─── Exchanges ───────────────────────────────────────────────

    /// Send a command and return whatever the server replied.
    pub async fn execute(&mut self, cmd: &str) -> Result<FtpResponse, LinkError> {
        let result = self.codec.execute(cmd).await;
        self.observe(result)
    }

    /// Send a command and require a reply of class `expected_first_digit`.
    pub async fn expect(&mut self, cmd: &str, expected_first_digit: u16) -> Result<FtpResponse, LinkError> {
        let resp = self.execute(cmd).await?;
        if resp.code / 100 != expected_first_digit {
            return Err(LinkError::Rejected(resp));
        }
        Ok(resp)
    }

    pub async fn expect_ok(&mut self, cmd: &str) -> Result<FtpResponse, LinkError> {
        self.expect(cmd, 2).await
    }

    /// Read one more reply without sending anything (transfer completion).
    pub async fn read_response(&mut self) -> Result<FtpResponse, LinkError> {
        let result = self.codec.read_response().await;
        self.observe(result)
    }

    /// Best-effort `QUIT`. The socket closes when `self` is dropped.
    pub async fn shutdown(mut self) {
        if !self.broken {
            let _ = self.codec.execute("QUIT").await;
        }
        info!("FTP disconnected from {}", self.host);
    }

    fn observe(&mut self, result: Result<FtpResponse, LinkError>) -> Result<FtpResponse, LinkError> {
        match &result {
            Err(LinkError::Closed) | Err(LinkError::Io(_)) => self.broken = true,
            Ok(resp) if resp.code == 421 => self.broken = true,
            _ => {}
        }
        result
    }

    // ─── State ───────────────────────────────────────────────────

    /// The server dropped the connection (EOF, I/O failure or 421).
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn is_secure(&self) -> bool {
        self.codec.is_tls()
    }

    pub fn is_passive(&self) -> bool {
        self.passive
    }

    pub fn set_passive(&mut self, passive: bool) {
        self.passive = passive;
    }

    pub fn banner(&self) -> &str {
        &self.banner
    }

    pub(crate) fn local_ip(&self) -> IpAddr {
        self.local_ip
    }

    pub(crate) fn peer_ip(&self) -> IpAddr {
        self.peer_ip
    }
}
