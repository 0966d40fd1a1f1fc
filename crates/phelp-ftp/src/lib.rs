//! # phelp-ftp: FTP/FTPS session manager
//!
//! One control connection per session: connect (plain or explicit TLS),
//! authenticate, navigate, transfer, disconnect.
//!
//! The state machine lives in [`FtpSession`] and reports every outcome as an
//! [`FtpResult`]. Callers pick how failures surface when they build a session:
//!
//! - [`FailFastSession`]: failures are returned as `Err`, successes hand back
//!   the session so calls chain.
//! - [`ReportingSession`]: failures are recorded as the last error and the
//!   call returns `false` (or an empty listing).
//!
//! ```no_run
//! # async fn demo() -> phelp_ftp::FtpResult<()> {
//! use phelp_ftp::{FailFastSession, TransferMode};
//!
//! let mut ftp = FailFastSession::open("ftp://user:pw@example.com/incoming").await?;
//! ftp.mkdir("reports").await?
//!     .cd("reports").await?
//!     .put_with_mode("./daily.csv", "daily.csv", TransferMode::Binary).await?;
//! ftp.close().await;
//! # Ok(())
//! # }
//! ```

pub mod ftp;

pub use ftp::*;
