//! ceph-osd-exporter - Prometheus exporter for Ceph OSD fragmentation.
//!
//! This library provides the core functionality behind the
//! `ceph-osd-exporter` binary:
//! - `ceph` - admin socket discovery and the admin socket wire protocol
//! - `collector` - Prometheus collector querying each OSD on every scrape
//! - `server` - HTTP exposition of the metrics registry

pub mod ceph;
pub mod collector;
pub mod server;

/// Crate version reported on startup and on the landing page.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
