//! HTTP exposition of the metrics registry.
//!
//! The scrape endpoint gathers the registry off the async runtime via
//! `spawn_blocking`, since collection performs blocking socket I/O
//! against every discovered OSD.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::error;

/// Builds the exporter router: metrics under `telemetry_path` and a
/// landing page at `/` unless the metrics occupy the root themselves.
pub fn build_router(registry: Registry, telemetry_path: &str) -> Router {
    let mut app = Router::new().route(telemetry_path, get(handle_metrics));

    if !telemetry_path.is_empty() && telemetry_path != "/" {
        let telemetry_path: Arc<str> = telemetry_path.into();
        app = app.route(
            "/",
            get(move || handle_landing(telemetry_path.clone())),
        );
    }

    app.with_state(registry)
}

async fn handle_metrics(State(registry): State<Registry>) -> Response {
    let encoded = tokio::task::spawn_blocking(move || {
        let families = registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        Ok::<_, prometheus::Error>(buffer)
    })
    .await;

    match encoded {
        Ok(Ok(buffer)) => (
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            buffer,
        )
            .into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => {
            error!(error = %e, "metrics collection task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn handle_landing(telemetry_path: Arc<str>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>Ceph OSD Exporter</title></head>\n\
         <body>\n\
         <h1>Ceph OSD Exporter</h1>\n\
         <p>Prometheus Exporter for Ceph OSD, version {}</p>\n\
         <p><a href=\"{}\">Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        crate::VERSION,
        telemetry_path
    ))
}
