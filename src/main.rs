//! ceph-osd-exporter - Prometheus exporter for Ceph OSD fragmentation.
//!
//! Discovers OSD admin sockets under the socket directory on every
//! scrape, queries each daemon for its BlueStore allocator score and
//! serves the results over HTTP in Prometheus text format.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use prometheus::Registry;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use ceph_osd_exporter::ceph::{DEFAULT_SOCKET_DIR, RealFs};
use ceph_osd_exporter::collector::FragmentationCollector;
use ceph_osd_exporter::server;

/// Prometheus exporter for Ceph OSD fragmentation.
#[derive(Parser)]
#[command(name = "ceph-osd-exporter", about = "Prometheus Exporter for Ceph OSD", version)]
struct Args {
    /// Listen address for the HTTP server.
    #[arg(long, default_value = "0.0.0.0:9282", env = "CEPH_OSD_EXPORTER_LISTEN")]
    listen: String,

    /// Path under which to expose metrics.
    #[arg(long, default_value = "/metrics")]
    telemetry_path: String,

    /// Directory scanned for OSD admin sockets.
    #[arg(long, default_value = DEFAULT_SOCKET_DIR)]
    socket_dir: PathBuf,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("ceph_osd_exporter={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    if !args.telemetry_path.starts_with('/') {
        error!(telemetry_path = %args.telemetry_path, "telemetry path must start with '/'");
        process::exit(1);
    }

    info!(
        version = ceph_osd_exporter::VERSION,
        socket_dir = %args.socket_dir.display(),
        "starting ceph-osd-exporter"
    );

    let registry = Registry::new();
    if let Err(e) = registry.register(Box::new(FragmentationCollector::new(
        RealFs::new(),
        &args.socket_dir,
    ))) {
        error!(error = %e, "failed to register fragmentation collector");
        process::exit(1);
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
        .block_on(async_main(args, registry));
}

async fn async_main(args: Args, registry: Registry) {
    let app = server::build_router(registry, &args.telemetry_path);

    let addr: SocketAddr = match args.listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(listen = %args.listen, error = %e, "invalid listen address");
            process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            process::exit(1);
        }
    };

    info!(%addr, telemetry_path = %args.telemetry_path, "listening");

    let serve = axum::serve(listener, app).with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutting down");
    });

    if let Err(e) = serve.await {
        error!(error = %e, "server error");
        process::exit(1);
    }
}
