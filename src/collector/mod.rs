//! Prometheus collectors.
//!
//! Collectors here are registered into a plain `prometheus::Registry`
//! built by the binary; there is no process-global registry state. Every
//! scrape re-discovers sockets from the live filesystem and queries each
//! daemon, so a collector holds no data between scrapes.

mod fragmentation;

pub use fragmentation::FragmentationCollector;
