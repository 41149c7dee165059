//! Ceph admin socket discovery and client.
//!
//! Ceph daemons expose a local admin socket for administrative queries.
//! OSD sockets live under `/var/run/ceph`, either flat
//! (`/var/run/ceph/ceph-osd.<id>.asok`) or nested one level under a
//! cluster fsid directory. Discovery walks the tree through the
//! `FileSystem` trait so tests can substitute an in-memory tree.
//!
//! The wire protocol is a single half-duplex round trip per connection:
//! a NUL-terminated JSON request with no length prefix, answered by a
//! 4-byte big-endian length header followed by a JSON object body.

mod admin_socket;
pub mod mock;
mod traits;

pub use admin_socket::{
    AdminSocket, AdminSocketCommand, AdminSocketError, DEFAULT_SOCKET_DIR, DiscoveryError,
    discover_admin_sockets,
};
pub use traits::{FileSystem, RealFs};
