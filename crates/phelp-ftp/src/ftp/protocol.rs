//! Low-level FTP command/reply codec (RFC 959 §4).
//!
//! Handles:
//! - Sending FTP commands terminated with `\r\n`
//! - Reading single-line and multi-line replies
//! - Parsing the 3-digit reply code

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

use crate::ftp::error::LinkError;
use crate::ftp::types::FtpResponse;

/// Abstraction over plain TCP or TLS-wrapped read half.
pub enum ReadHalf {
    Plain(BufReader<OwnedReadHalf>),
    Tls(BufReader<tokio::io::ReadHalf<TlsStream<TcpStream>>>),
}

/// Abstraction over plain TCP or TLS-wrapped write half.
pub enum WriteHalf {
    Plain(OwnedWriteHalf),
    Tls(tokio::io::WriteHalf<TlsStream<TcpStream>>),
}

/// The FTP command/reply codec operating on split halves.
pub struct FtpCodec {
    pub reader: ReadHalf,
    pub writer: WriteHalf,
}

impl FtpCodec {
    pub fn from_tcp(stream: TcpStream) -> Self {
        let (rd, wr) = stream.into_split();
        Self {
            reader: ReadHalf::Plain(BufReader::new(rd)),
            writer: WriteHalf::Plain(wr),
        }
    }

    pub fn from_tls(stream: TlsStream<TcpStream>) -> Self {
        let (rd, wr) = tokio::io::split(stream);
        Self {
            reader: ReadHalf::Tls(BufReader::new(rd)),
            writer: WriteHalf::Tls(wr),
        }
    }

    pub fn is_tls(&self) -> bool {
        matches!(self.writer, WriteHalf::Tls(_))
    }

    /// Send a raw FTP command; the trailing CRLF is added here.
    ///
    /// A command carrying its own CR or LF is refused before anything is
    /// written, so one call is always exactly one command line.
    pub async fn send_command(&mut self, cmd: &str) -> Result<(), LinkError> {
        if cmd.contains(['\r', '\n']) {
            return Err(LinkError::Protocol(format!(
                "command contains CR/LF: {:?}",
                redact(cmd)
            )));
        }
        let line = format!("{}\r\n", cmd);
        match &mut self.writer {
            WriteHalf::Plain(w) => {
                w.write_all(line.as_bytes()).await?;
                w.flush().await?;
            }
            WriteHalf::Tls(w) => {
                w.write_all(line.as_bytes()).await?;
                w.flush().await?;
            }
        }
        log::trace!(">>> {}", redact(cmd));
        Ok(())
    }

    async fn read_line_raw(&mut self) -> Result<String, LinkError> {
        let mut buf = String::new();
        let n = match &mut self.reader {
            ReadHalf::Plain(r) => r.read_line(&mut buf).await?,
            ReadHalf::Tls(r) => r.read_line(&mut buf).await?,
        };
        if n == 0 {
            return Err(LinkError::Closed);
        }
        Ok(buf)
    }

    /// Read a complete FTP reply (possibly multi-line).
    ///
    /// Multi-line replies look like:
    /// ```text
    /// 220-Welcome to my FTP server
    /// 220-This is line 2
    /// 220 End of greeting
    /// ```
    pub async fn read_response(&mut self) -> Result<FtpResponse, LinkError> {
        let first = self.read_line_raw().await?;
        let first = first.trim_end_matches(['\r', '\n']);

        let code = parse_code(first)?;
        let mut lines = vec![first.to_string()];

        // "NNN-" opens a block that ends at the first "NNN " line.
        if first.as_bytes().get(3) == Some(&b'-') {
            let terminator = format!("{} ", code);
            loop {
                let next = self.read_line_raw().await?;
                let next = next.trim_end_matches(['\r', '\n']);
                lines.push(next.to_string());
                if next.starts_with(&terminator) || next == terminator.trim_end() {
                    break;
                }
            }
        }

        let resp = FtpResponse { code, lines };
        log::trace!("<<< {}", resp.lines.last().map(String::as_str).unwrap_or(""));
        Ok(resp)
    }

    /// Send a command and return the reply.
    pub async fn execute(&mut self, cmd: &str) -> Result<FtpResponse, LinkError> {
        self.send_command(cmd).await?;
        self.read_response().await
    }

    /// Send a command, expect a specific reply-code class.
    pub async fn expect(&mut self, cmd: &str, expected_first_digit: u16) -> Result<FtpResponse, LinkError> {
        let resp = self.execute(cmd).await?;
        if resp.code / 100 != expected_first_digit {
            return Err(LinkError::Rejected(resp));
        }
        Ok(resp)
    }

    /// Expect a 2xx reply.
    pub async fn expect_ok(&mut self, cmd: &str) -> Result<FtpResponse, LinkError> {
        self.expect(cmd, 2).await
    }
}

/// Parse the 3-digit reply code from the start of a line.
fn parse_code(line: &str) -> Result<u16, LinkError> {
    line.get(..3)
        .filter(|c| c.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or_else(|| LinkError::Protocol(format!("invalid reply line '{}'", line)))
}

fn redact(cmd: &str) -> &str {
    if cmd.get(..5).is_some_and(|verb| verb.eq_ignore_ascii_case("PASS ")) {
        "PASS ****"
    } else {
        cmd
    }
}
