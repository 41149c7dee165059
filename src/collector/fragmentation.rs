//! OSD fragmentation collector.
//!
//! On each scrape, walks the socket directory, asks every discovered OSD
//! for its BlueStore allocator score and reports the result as the
//! `ceph_osd_fragmentation_rating` gauge, labeled by OSD id. Each scrape
//! builds its metric family from scratch; the collector carries no
//! values between scrapes, so concurrent scrapes cannot observe each
//! other's partial results.
//!
//! Failure isolation is the central contract here: one dead or
//! misbehaving socket is logged and skipped, and never prevents the
//! remaining OSDs on the host from being reported. Only a failed
//! directory walk empties the whole scrape, and even that is not fatal
//! to the process.

use std::collections::HashMap;
use std::path::PathBuf;

use prometheus::core::{Collector, Desc};
use prometheus::proto::{self, MetricFamily, MetricType};
use serde_json::Value;
use tracing::error;

use crate::ceph::{AdminSocketCommand, FileSystem, discover_admin_sockets};

const FRAGMENTATION_COMMAND: &str = "bluestore allocator score block";
const RATING_FIELD: &str = "fragmentation_rating";

const METRIC_NAME: &str = "ceph_osd_fragmentation_rating";
const METRIC_HELP: &str = "Fragmentation rating of the OSD";
const OSD_LABEL: &str = "osd";

/// Collector for the per-OSD fragmentation rating gauge.
pub struct FragmentationCollector<F: FileSystem> {
    fs: F,
    socket_dir: PathBuf,
    rating: Desc,
}

impl<F: FileSystem> FragmentationCollector<F> {
    pub fn new(fs: F, socket_dir: impl Into<PathBuf>) -> Self {
        let rating = Desc::new(
            METRIC_NAME.to_string(),
            METRIC_HELP.to_string(),
            vec![OSD_LABEL.to_string()],
            HashMap::new(),
        )
        .expect("static metric description is valid");

        Self {
            fs,
            socket_dir: socket_dir.into(),
            rating,
        }
    }
}

/// Builds one gauge sample labeled with the OSD id.
fn gauge_metric(osd: &str, rating: f64) -> proto::Metric {
    let mut label = proto::LabelPair::new();
    label.set_name(OSD_LABEL.to_string());
    label.set_value(osd.to_string());

    let mut gauge = proto::Gauge::new();
    gauge.set_value(rating);

    let mut metric = proto::Metric::new();
    metric.mut_label().push(label);
    metric.set_gauge(gauge);
    metric
}

impl<F: FileSystem> Collector for FragmentationCollector<F> {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.rating]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let sockets = match discover_admin_sockets(&self.fs, &self.socket_dir) {
            Ok(sockets) => sockets,
            Err(e) => {
                error!(error = %e, "failed to get admin sockets");
                return Vec::new();
            }
        };

        let mut family = MetricFamily::new();
        family.set_name(self.rating.fq_name.clone());
        family.set_help(self.rating.help.clone());
        family.set_field_type(MetricType::GAUGE);

        for socket in sockets {
            let command = AdminSocketCommand::new(FRAGMENTATION_COMMAND);
            let response = match socket.send_command(&command) {
                Ok(response) => response,
                Err(e) => {
                    error!(
                        path = %socket.path().display(),
                        error = %e,
                        "failed to get osd fragmentation status"
                    );
                    continue;
                }
            };

            let Some(rating) = response.get(RATING_FIELD).and_then(Value::as_f64) else {
                error!(
                    path = %socket.path().display(),
                    response = ?response,
                    "failed to parse fragmentation rating"
                );
                continue;
            };

            family.mut_metric().push(gauge_metric(&socket.osd(), rating));
        }

        vec![family]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ceph::RealFs;
    use prometheus::Registry;
    use std::io::{Read, Write};
    use std::os::unix::net::UnixListener;
    use std::path::Path;
    use std::thread;

    /// Answers every connection on `path` with a length-framed JSON body.
    fn spawn_fake_osd(path: &Path, body: &'static str) {
        let listener = UnixListener::bind(path).unwrap();
        thread::spawn(move || {
            for conn in listener.incoming() {
                let Ok(mut conn) = conn else { break };
                let mut buf = [0u8; 256];
                if conn.read(&mut buf).is_err() {
                    continue;
                }
                let _ = conn.write_all(&(body.len() as u32).to_be_bytes());
                let _ = conn.write_all(body.as_bytes());
            }
        });
    }

    fn fragmentation_registry(socket_dir: &Path) -> Registry {
        let registry = Registry::new();
        registry
            .register(Box::new(FragmentationCollector::new(RealFs::new(), socket_dir)))
            .unwrap();
        registry
    }

    /// Extracts the (osd label, value) pairs from one gather.
    fn samples_of(registry: &Registry) -> HashMap<String, f64> {
        let mut samples = HashMap::new();
        for family in registry.gather() {
            assert_eq!(family.get_name(), "ceph_osd_fragmentation_rating");
            for metric in family.get_metric() {
                let osd = metric
                    .get_label()
                    .iter()
                    .find(|l| l.get_name() == "osd")
                    .map(|l| l.get_value().to_string())
                    .unwrap();
                samples.insert(osd, metric.get_gauge().get_value());
            }
        }
        samples
    }

    fn scrape(socket_dir: &Path) -> HashMap<String, f64> {
        samples_of(&fragmentation_registry(socket_dir))
    }

    #[test]
    fn test_collect_reports_each_osd() {
        let dir = tempfile::tempdir().unwrap();
        spawn_fake_osd(
            &dir.path().join("ceph-osd.1.asok"),
            r#"{"fragmentation_rating":0.25}"#,
        );
        spawn_fake_osd(
            &dir.path().join("ceph-osd.42.asok"),
            r#"{"fragmentation_rating":0.62288891320016271}"#,
        );

        let samples = scrape(dir.path());
        assert_eq!(samples.len(), 2);
        assert_eq!(samples["1"], 0.25);
        assert_eq!(samples["42"], 0.6228889132001627);
    }

    #[test]
    fn test_collect_skips_dead_socket() {
        let dir = tempfile::tempdir().unwrap();
        spawn_fake_osd(
            &dir.path().join("ceph-osd.1.asok"),
            r#"{"fragmentation_rating":0.5}"#,
        );
        // Stale socket file with nothing listening behind it.
        drop(UnixListener::bind(dir.path().join("ceph-osd.2.asok")).unwrap());

        let samples = scrape(dir.path());
        assert_eq!(samples.len(), 1);
        assert_eq!(samples["1"], 0.5);
    }

    #[test]
    fn test_collect_skips_missing_rating_field() {
        let dir = tempfile::tempdir().unwrap();
        spawn_fake_osd(
            &dir.path().join("ceph-osd.1.asok"),
            r#"{"allocator_type":"hybrid"}"#,
        );
        spawn_fake_osd(
            &dir.path().join("ceph-osd.2.asok"),
            r#"{"fragmentation_rating":"high"}"#,
        );
        spawn_fake_osd(
            &dir.path().join("ceph-osd.3.asok"),
            r#"{"fragmentation_rating":0.75}"#,
        );

        let samples = scrape(dir.path());
        assert_eq!(samples.len(), 1);
        assert_eq!(samples["3"], 0.75);
    }

    #[test]
    fn test_collect_empty_when_discovery_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        assert!(scrape(&missing).is_empty());
    }

    #[test]
    fn test_collect_finds_nested_sockets() {
        let dir = tempfile::tempdir().unwrap();
        let fsid = dir.path().join("1d3e4c7b-6b3b-4b3b-8b3b-3b3b3b3b3b3b");
        std::fs::create_dir(&fsid).unwrap();
        spawn_fake_osd(
            &dir.path().join("ceph-osd.1.asok"),
            r#"{"fragmentation_rating":0.1}"#,
        );
        spawn_fake_osd(
            &fsid.join("ceph-osd.42.asok"),
            r#"{"fragmentation_rating":0.2}"#,
        );

        let samples = scrape(dir.path());
        assert_eq!(samples.len(), 2);
        assert_eq!(samples["1"], 0.1);
        assert_eq!(samples["42"], 0.2);
    }

    #[test]
    fn test_collect_forgets_vanished_osd() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ceph-osd.1.asok");
        spawn_fake_osd(&path, r#"{"fragmentation_rating":0.3}"#);

        let registry = fragmentation_registry(dir.path());
        assert_eq!(samples_of(&registry).len(), 1);

        std::fs::remove_file(&path).unwrap();
        assert!(samples_of(&registry).is_empty());
    }

    #[test]
    fn test_concurrent_scrapes_are_self_contained() {
        let dir = tempfile::tempdir().unwrap();
        spawn_fake_osd(
            &dir.path().join("ceph-osd.1.asok"),
            r#"{"fragmentation_rating":0.25}"#,
        );
        spawn_fake_osd(
            &dir.path().join("ceph-osd.42.asok"),
            r#"{"fragmentation_rating":0.5}"#,
        );

        let registry = fragmentation_registry(dir.path());
        let other = registry.clone();
        let scraper = thread::spawn(move || {
            for _ in 0..5 {
                let samples = samples_of(&other);
                assert_eq!(samples.len(), 2);
                assert_eq!(samples["1"], 0.25);
                assert_eq!(samples["42"], 0.5);
            }
        });

        for _ in 0..5 {
            let samples = samples_of(&registry);
            assert_eq!(samples.len(), 2);
            assert_eq!(samples["1"], 0.25);
            assert_eq!(samples["42"], 0.5);
        }
        scraper.join().unwrap();
    }
}
