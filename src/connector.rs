use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_SOCKET: &str = "/var/run/audispd_events";
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("connect: {}: {source}", .path.display())]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("set read timeout: {}: {source}", .path.display())]
    Timeout {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Connects to the Unix stream socket at `path`. Reads on the
/// returned stream fail with `WouldBlock` after `read_timeout`
/// without data.
pub fn connect(path: &Path, read_timeout: Duration) -> Result<UnixStream, ConnectError> {
    let stream = UnixStream::connect(path).map_err(|source| ConnectError::Connect {
        path: path.into(),
        source,
    })?;
    stream
        .set_read_timeout(Some(read_timeout))
        .map_err(|source| ConnectError::Timeout {
            path: path.into(),
            source,
        })?;
    log::info!("Connected to {}", path.to_string_lossy());
    Ok(stream)
}
