//! File transfers: `get` (RETR) and `put` (STOR).
//!
//! Both take a [`TransferMode`]; the short forms use the session's
//! configured default, which is `Ascii` unless the options say otherwise.

use std::path::Path;

use log::debug;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::ftp::error::{FtpError, FtpResult, LinkError};
use crate::ftp::session::FtpSession;
use crate::ftp::transfer::{AsciiDecoder, AsciiEncoder};
use crate::ftp::types::TransferMode;

const CHUNK_SIZE: usize = 64 * 1024;

impl FtpSession {
    /// Download with the session's default transfer mode.
    pub async fn get(&mut self, remote_file: &str, local_file: impl AsRef<Path>) -> FtpResult<u64> {
        let mode = self.options().transfer_mode;
        self.get_with_mode(remote_file, local_file, mode).await
    }

    /// Download `remote_file` into `local_file`, returning the bytes written.
    ///
    /// The local file is created only once the server accepted `RETR` and is
    /// removed again if anything fails afterwards.
    pub async fn get_with_mode(
        &mut self,
        remote_file: &str,
        local_file: impl AsRef<Path>,
        mode: TransferMode,
    ) -> FtpResult<u64> {
        let result = self.retrieve(remote_file, local_file.as_ref(), mode).await;
        self.reap_broken_link();
        result.map_err(|e| {
            FtpError::file_operation(format!("Failed to download file \"{}\"", remote_file))
                .caused_by(e)
        })
    }

    /// Upload with the session's default transfer mode.
    pub async fn put(&mut self, local_file: impl AsRef<Path>, remote_file: &str) -> FtpResult<u64> {
        let mode = self.options().transfer_mode;
        self.put_with_mode(local_file, remote_file, mode).await
    }

    /// Upload `local_file` as `remote_file`, returning the bytes read locally.
    pub async fn put_with_mode(
        &mut self,
        local_file: impl AsRef<Path>,
        remote_file: &str,
        mode: TransferMode,
    ) -> FtpResult<u64> {
        let local_file = local_file.as_ref();
        let result = self.store(local_file, remote_file, mode).await;
        self.reap_broken_link();
        result.map_err(|e| {
            FtpError::file_operation(format!("Failed to upload file \"{}\"", local_file.display()))
                .caused_by(e)
        })
    }

    async fn retrieve(&mut self, remote: &str, local: &Path, mode: TransferMode) -> Result<u64, LinkError> {
        let link = self.link_mut()?;
        link.expect_ok(mode.type_command()).await?;
        let stream = link.start_transfer(&format!("RETR {}", remote)).await?;
        let had_data = stream.is_some();

        let mut file = match File::create(local).await {
            Ok(file) => file,
            Err(e) => {
                if had_data {
                    drop(stream);
                    link.drain_transfer_reply().await;
                }
                return Err(LinkError::Local(e));
            }
        };

        let outcome = match download(stream, &mut file, mode).await {
            Ok(n) if had_data => link.finish_transfer().await.map(|_| n),
            Ok(n) => Ok(n),
            Err(e) => {
                if had_data {
                    link.drain_transfer_reply().await;
                }
                Err(e)
            }
        };
        drop(file);

        if outcome.is_err() {
            if let Err(e) = tokio::fs::remove_file(local).await {
                debug!("could not remove partial file {}: {}", local.display(), e);
            }
        }
        outcome
    }

    async fn store(&mut self, local: &Path, remote: &str, mode: TransferMode) -> Result<u64, LinkError> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        let mut file = File::open(local).await.map_err(LinkError::Local)?;

        let link = self.link_mut()?;
        link.expect_ok(mode.type_command()).await?;
        let Some(mut stream) = link.start_transfer(&format!("STOR {}", remote)).await? else {
            return Ok(0);
        };

        match upload(&mut file, &mut stream, mode).await {
            Ok(n) => {
                drop(stream);
                link.finish_transfer().await?;
                Ok(n)
            }
            Err(e) => {
                drop(stream);
                link.drain_transfer_reply().await;
                Err(e)
            }
        }
    }
}

async fn download(stream: Option<TcpStream>, file: &mut File, mode: TransferMode) -> Result<u64, LinkError> {
    let mut written = 0u64;
    if let Some(mut stream) = stream {
        let mut decoder = AsciiDecoder::default();
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut out = Vec::with_capacity(CHUNK_SIZE);
        loop {
            let n = stream.read(&mut buf).await.map_err(LinkError::Data)?;
            if n == 0 {
                break;
            }
            let chunk = match mode {
                TransferMode::Binary => &buf[..n],
                TransferMode::Ascii => {
                    out.clear();
                    decoder.decode(&buf[..n], &mut out);
                    &out[..]
                }
            };
            file.write_all(chunk).await.map_err(LinkError::Local)?;
            written += chunk.len() as u64;
        }
        if mode == TransferMode::Ascii {
            out.clear();
            decoder.finish(&mut out);
            file.write_all(&out).await.map_err(LinkError::Local)?;
            written += out.len() as u64;
        }
    }
    file.flush().await.map_err(LinkError::Local)?;
    Ok(written)
}

async fn upload(file: &mut File, stream: &mut TcpStream, mode: TransferMode) -> Result<u64, LinkError> {
    let mut encoder = AsciiEncoder::default();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut out = Vec::with_capacity(CHUNK_SIZE * 2);
    let mut read = 0u64;
    loop {
        let n = file.read(&mut buf).await.map_err(LinkError::Local)?;
        if n == 0 {
            break;
        }
        read += n as u64;
        let chunk = match mode {
            TransferMode::Binary => &buf[..n],
            TransferMode::Ascii => {
                out.clear();
                encoder.encode(&buf[..n], &mut out);
                &out[..]
            }
        };
        stream.write_all(chunk).await.map_err(LinkError::Data)?;
    }
    stream.shutdown().await.map_err(LinkError::Data)?;
    Ok(read)
}
