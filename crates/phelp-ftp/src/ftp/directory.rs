//! Remote directory and file-management commands.

use tokio::io::AsyncReadExt;

use crate::ftp::error::{FtpError, FtpResult, LinkError};
use crate::ftp::session::FtpSession;

impl FtpSession {
    /// Names in `directory` as returned by `NLST`.
    ///
    /// An empty directory yields an empty list; only a rejected command is
    /// an error.
    pub async fn ls(&mut self, directory: &str) -> FtpResult<Vec<String>> {
        let result = self.name_list(directory).await;
        self.reap_broken_link();
        result.map_err(|e| FtpError::listing("Failed to get directory list").caused_by(e))
    }

    async fn name_list(&mut self, directory: &str) -> Result<Vec<String>, LinkError> {
        let cmd = if directory.is_empty() {
            "NLST".to_string()
        } else {
            format!("NLST {}", directory)
        };
        let link = self.link_mut()?;

        let Some(mut stream) = link.start_transfer(&cmd).await? else {
            return Ok(Vec::new());
        };
        let mut raw = Vec::new();
        if let Err(e) = stream.read_to_end(&mut raw).await {
            drop(stream);
            link.drain_transfer_reply().await;
            return Err(LinkError::Data(e));
        }
        drop(stream);
        link.finish_transfer().await?;

        Ok(parse_name_list(&raw))
    }

    pub async fn mkdir(&mut self, directory: &str) -> FtpResult<()> {
        self.simple_command(&format!("MKD {}", directory), 2)
            .await
            .map(drop)
            .map_err(|e| {
                FtpError::directory(format!("Failed to create directory \"{}\"", directory))
                    .caused_by(e)
            })
    }

    pub async fn rmdir(&mut self, directory: &str) -> FtpResult<()> {
        self.simple_command(&format!("RMD {}", directory), 2)
            .await
            .map(drop)
            .map_err(|e| {
                FtpError::directory(format!("Failed to remove directory \"{}\"", directory))
                    .caused_by(e)
            })
    }

    pub async fn delete(&mut self, remote_file: &str) -> FtpResult<()> {
        self.simple_command(&format!("DELE {}", remote_file), 2)
            .await
            .map(drop)
            .map_err(|e| {
                FtpError::file_operation(format!("Failed to delete file \"{}\"", remote_file))
                    .caused_by(e)
            })
    }

    /// `RNFR` then `RNTO`; the second is only sent after a 350.
    pub async fn rename(&mut self, old_name: &str, new_name: &str) -> FtpResult<()> {
        let result = match self.simple_command(&format!("RNFR {}", old_name), 3).await {
            Ok(_) => self.simple_command(&format!("RNTO {}", new_name), 2).await,
            Err(e) => Err(e),
        };
        result.map(drop).map_err(|e| {
            FtpError::file_operation(format!("Failed to rename file \"{}\"", old_name)).caused_by(e)
        })
    }

    /// `SITE CHMOD`. `permissions` is the numeric mode, sent in octal
    /// (`0o644` → `644`).
    pub async fn chmod(&mut self, permissions: u32, remote_file: &str) -> FtpResult<()> {
        self.simple_command(&format!("SITE CHMOD {:o} {}", permissions, remote_file), 2)
            .await
            .map(drop)
            .map_err(|e| {
                FtpError::permission(format!(
                    "Failed to set file permissions for \"{}\"",
                    remote_file
                ))
                .caused_by(e)
            })
    }
}

/// One name per line; CR and blank lines dropped.
fn parse_name_list(raw: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(raw)
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .map(str::to_owned)
        .collect()
}
