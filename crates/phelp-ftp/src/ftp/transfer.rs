//! Data-channel management for FTP transfers.
//!
//! Two modes (RFC 959):
//! - **PASV**: server opens a port, client connects before the command
//! - **PORT**: client listens, server connects after the command
//!
//! Also home of the text-framing codecs used by `TYPE A` transfers.

use std::net::{IpAddr, SocketAddr};

use lazy_static::lazy_static;
use regex::Regex;
use tokio::net::{TcpListener, TcpStream};

use crate::ftp::connection::TransportLink;
use crate::ftp::error::LinkError;
use crate::ftp::types::FtpResponse;

lazy_static! {
    static ref PASV_REPLY: Regex =
        Regex::new(r"(\d+),(\d+),(\d+),(\d+),(\d+),(\d+)").expect("PASV pattern is valid");
}

/// A data connection that is either already open (PASV) or waiting for the
/// server to dial in (PORT).
pub enum DataChannel {
    Connected(TcpStream),
    Listening(TcpListener),
}

impl DataChannel {
    /// Resolve to a stream. For PORT this waits for the server's connection,
    /// so call it only after the transfer command was accepted.
    pub async fn into_stream(self) -> Result<TcpStream, LinkError> {
        match self {
            Self::Connected(tcp) => Ok(tcp),
            Self::Listening(listener) => {
                let (tcp, peer) = listener.accept().await.map_err(LinkError::Data)?;
                log::debug!("PORT data connection from {}", peer);
                Ok(tcp)
            }
        }
    }
}

impl TransportLink {
    /// Open a data channel in the link's negotiated mode.
    pub async fn open_data_channel(&mut self) -> Result<DataChannel, LinkError> {
        if self.is_passive() {
            self.open_pasv().await.map(DataChannel::Connected)
        } else {
            self.open_port().await.map(DataChannel::Listening)
        }
    }

    /// Issue `PASV`, parse the reply, connect to the returned address.
    ///
    /// Reply format: `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)`
    async fn open_pasv(&mut self) -> Result<TcpStream, LinkError> {
        let resp = self.expect_ok("PASV").await?;
        let mut addr = parse_pasv_response(&resp.text())?;
        // Servers behind NAT sometimes advertise 0.0.0.0.
        if addr.ip().is_unspecified() {
            addr.set_ip(self.peer_ip());
        }
        log::debug!("PASV data connection to {}", addr);
        TcpStream::connect(addr).await.map_err(LinkError::Data)
    }

    /// Bind a local listener on the control connection's address and
    /// announce it via `PORT`.
    async fn open_port(&mut self) -> Result<TcpListener, LinkError> {
        let ip = match self.local_ip() {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(_) => {
                return Err(LinkError::Protocol(
                    "active mode (PORT) requires an IPv4 control connection".into(),
                ))
            }
        };
        let listener = TcpListener::bind(SocketAddr::new(IpAddr::V4(ip), 0))
            .await
            .map_err(LinkError::Data)?;
        let port = listener.local_addr().map_err(LinkError::Data)?.port();

        let octets = ip.octets();
        let cmd = format!(
            "PORT {},{},{},{},{},{}",
            octets[0],
            octets[1],
            octets[2],
            octets[3],
            port / 256,
            port % 256
        );
        self.expect_ok(&cmd).await?;
        Ok(listener)
    }

    /// Open a data channel and issue a transfer command on it.
    ///
    /// `Some(stream)` after a 1xx reply. `None` when the server finished
    /// straight away with a 2xx and no data connection.
    pub(crate) async fn start_transfer(&mut self, cmd: &str) -> Result<Option<TcpStream>, LinkError> {
        let channel = self.open_data_channel().await?;
        let resp = self.execute(cmd).await?;
        if resp.is_preliminary() {
            channel.into_stream().await.map(Some)
        } else if resp.is_completion() {
            Ok(None)
        } else {
            Err(LinkError::Rejected(resp))
        }
    }

    /// Read the completion reply that follows a data transfer.
    pub(crate) async fn finish_transfer(&mut self) -> Result<FtpResponse, LinkError> {
        let resp = self.read_response().await?;
        if resp.is_completion() {
            Ok(resp)
        } else {
            Err(LinkError::Rejected(resp))
        }
    }

    /// After a failed data phase the server still sends a completion or
    /// abort reply; consume it so the next command lines up.
    pub(crate) async fn drain_transfer_reply(&mut self) {
        if let Ok(resp) = self.read_response().await {
            log::debug!("transfer aborted, server said: {}", resp.text());
        }
    }
}

/// Parse `h1,h2,h3,h4,p1,p2` from a 227 reply.
fn parse_pasv_response(text: &str) -> Result<SocketAddr, LinkError> {
    let caps = PASV_REPLY
        .captures(text)
        .ok_or_else(|| LinkError::Protocol(format!("cannot parse PASV reply: {}", text)))?;

    let mut nums = [0u8; 6];
    for (i, slot) in nums.iter_mut().enumerate() {
        *slot = caps[i + 1]
            .parse::<u8>()
            .map_err(|_| LinkError::Protocol(format!("PASV number out of range: {}", text)))?;
    }

    let ip = IpAddr::from([nums[0], nums[1], nums[2], nums[3]]);
    let port = u16::from(nums[4]) * 256 + u16::from(nums[5]);
    Ok(SocketAddr::new(ip, port))
}

// ─── Text framing ────────────────────────────────────────────────────

/// `TYPE A` download: network CRLF → local LF.
///
/// Keeps a trailing CR across chunk boundaries.
#[derive(Debug, Default)]
pub struct AsciiDecoder {
    pending_cr: bool,
}

impl AsciiDecoder {
    pub fn decode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &b in input {
            if self.pending_cr {
                self.pending_cr = false;
                if b != b'\n' {
                    out.push(b'\r');
                }
            }
            if b == b'\r' {
                self.pending_cr = true;
            } else {
                out.push(b);
            }
        }
    }

    /// Flush a CR left at end of stream.
    pub fn finish(&mut self, out: &mut Vec<u8>) {
        if std::mem::take(&mut self.pending_cr) {
            out.push(b'\r');
        }
    }
}

/// `TYPE A` upload: local LF → network CRLF. Existing CRLF pairs pass through.
#[derive(Debug, Default)]
pub struct AsciiEncoder {
    last_was_cr: bool,
}

impl AsciiEncoder {
    pub fn encode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &b in input {
            if b == b'\n' && !self.last_was_cr {
                out.push(b'\r');
            }
            out.push(b);
            self.last_was_cr = b == b'\r';
        }
    }
}
