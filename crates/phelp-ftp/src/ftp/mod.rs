//! Architecture:
//! - `types`: session options, transfer mode, error policy, replies
//! - `error`: error taxonomy shared by both policies
//! - `endpoint`: connection URI parsing (`EndpointConfig`)
//! - `protocol`: control-channel command/reply codec
//! - `tls`: rustls connector and explicit `AUTH TLS` upgrade
//! - `connection`: `TransportLink`, the owned control connection
//! - `transfer`: PASV/PORT data channels and text framing
//! - `session`: `FtpSession` state machine (connect, login, cd, pwd, close)
//! - `directory`: ls, mkdir, rmdir, delete, rename, chmod
//! - `file_ops`: get / put
//! - `policy`: fail-fast and report-and-continue facades

pub mod types;
pub mod error;
pub mod endpoint;
pub mod protocol;
pub mod tls;
pub mod connection;
pub mod transfer;
pub mod session;
pub mod directory;
pub mod file_ops;
pub mod policy;

pub use connection::TransportLink;
pub use endpoint::EndpointConfig;
pub use error::{ConnectionKind, FtpError, FtpErrorKind, FtpResult};
pub use policy::{FailFastSession, PolicySession, ReportingSession};
pub use session::{FtpSession, SessionState};
pub use types::*;
