//! Admin socket client and discovery.
//!
//! One `AdminSocket` is built per discovered socket path on every scrape;
//! nothing survives between scrapes. Each `send_command` call opens a
//! fresh connection, performs exactly one request/response round trip and
//! closes the connection, on success or failure.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ceph::traits::FileSystem;

/// Directory walked for admin sockets in production.
pub const DEFAULT_SOCKET_DIR: &str = "/var/run/ceph";

const OSD_SOCKET_PREFIX: &str = "ceph-osd.";
const OSD_SOCKET_SUFFIX: &str = ".asok";

/// Deadline applied to each socket read and write so a hung daemon
/// cannot stall the whole scrape.
const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on an announced response body. Admin socket replies are
/// small JSON objects; a daemon announcing more than this is not
/// speaking the protocol, and the body buffer is never allocated.
const MAX_RESPONSE_LEN: u32 = 64 << 20;

/// Errors from a single admin socket round trip.
///
/// Each failure mode is distinct so callers can tell a dead socket from a
/// malformed reply. None of these are retried here; a failed socket is
/// simply skipped for the current scrape.
#[derive(Debug, Error)]
pub enum AdminSocketError {
    #[error("failed to connect to admin socket: {0}")]
    Connect(#[source] io::Error),

    #[error("failed to send command: {0}")]
    Write(#[source] io::Error),

    #[error("failed to read response length header: {0}")]
    ReadHeader(#[source] io::Error),

    #[error("failed to read response body: {0}")]
    ReadBody(#[source] io::Error),

    #[error("failed to decode response as JSON object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Filesystem traversal failure during discovery.
///
/// Discovery is all-or-nothing: any traversal error aborts the pass and
/// no partial socket list is returned.
#[derive(Debug, Error)]
#[error("failed to scan admin sockets: {0}")]
pub struct DiscoveryError(#[from] io::Error);

/// A command sent over the admin socket.
///
/// `format` is omitted from the wire request when absent, matching what
/// the Ceph daemons accept.
#[derive(Debug, Clone, Serialize)]
pub struct AdminSocketCommand {
    pub prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl AdminSocketCommand {
    /// Creates a command with no output-format hint.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            format: None,
        }
    }
}

/// One discovered OSD admin socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSocket {
    path: PathBuf,
}

impl AdminSocket {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extracts the OSD identifier from the socket path.
    ///
    /// The whole path is split on `.` and the second-to-last segment is
    /// the identifier: `.../ceph-osd.<id>.asok` always contributes
    /// exactly one trailing `asok` segment after `<id>`, however many
    /// directory components precede it.
    pub fn osd(&self) -> String {
        let path = self.path.to_string_lossy();
        path.rsplit('.').nth(1).unwrap_or_default().to_string()
    }

    /// Performs one synchronous command round trip against this socket.
    ///
    /// Wire format: the JSON-serialized command followed by a single NUL
    /// byte (no length prefix on the request), answered by a 4-byte
    /// big-endian body length and then exactly that many bytes of a JSON
    /// object. The connection is dropped before returning in every path.
    pub fn send_command(
        &self,
        command: &AdminSocketCommand,
    ) -> Result<Map<String, Value>, AdminSocketError> {
        let mut stream = UnixStream::connect(&self.path).map_err(AdminSocketError::Connect)?;
        stream
            .set_read_timeout(Some(IO_TIMEOUT))
            .map_err(AdminSocketError::Connect)?;
        stream
            .set_write_timeout(Some(IO_TIMEOUT))
            .map_err(AdminSocketError::Connect)?;

        let mut request = serde_json::to_vec(command)?;
        request.push(0);
        stream
            .write_all(&request)
            .map_err(AdminSocketError::Write)?;

        let mut len_buf = [0u8; 4];
        stream
            .read_exact(&mut len_buf)
            .map_err(AdminSocketError::ReadHeader)?;
        let length = u32::from_be_bytes(len_buf);
        if length > MAX_RESPONSE_LEN {
            return Err(AdminSocketError::ReadHeader(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("response length {length} exceeds {MAX_RESPONSE_LEN} bytes"),
            )));
        }

        let mut body = vec![0u8; length as usize];
        stream
            .read_exact(&mut body)
            .map_err(AdminSocketError::ReadBody)?;

        let response: Map<String, Value> = serde_json::from_slice(&body)?;
        Ok(response)
    }
}

/// Walks `root` and returns every OSD admin socket found, at any depth.
///
/// Matching is on the base name only (`ceph-osd.<id>.asok`); sockets may
/// sit directly under `root` or below a cluster fsid subdirectory. Order
/// follows the traversal and is not sorted.
pub fn discover_admin_sockets<F: FileSystem>(
    fs: &F,
    root: &Path,
) -> Result<Vec<AdminSocket>, DiscoveryError> {
    let mut sockets = Vec::new();
    walk(fs, root, &mut sockets)?;
    Ok(sockets)
}

fn walk<F: FileSystem>(fs: &F, dir: &Path, out: &mut Vec<AdminSocket>) -> io::Result<()> {
    for entry in fs.read_dir(dir)? {
        if fs.is_dir(&entry) {
            walk(fs, &entry, out)?;
        } else if let Some(name) = entry.file_name().and_then(|n| n.to_str())
            && name.starts_with(OSD_SOCKET_PREFIX)
            && name.ends_with(OSD_SOCKET_SUFFIX)
        {
            out.push(AdminSocket::new(entry));
        }
    }
    Ok(())
}
