//! A minimal `/metrics` + `/healthz` server. Business endpoints (proof
//! ingress, status) live in `sp-http`; this crate only owns the
//! observability surface.

use axum::{body::Bytes, http::header::CONTENT_TYPE, http::HeaderName, routing::get, Router};
use prometheus::{Encoder, TextEncoder};
use std::net::SocketAddr;
use tokio::signal;

async fn metrics_handler() -> ([(HeaderName, String); 1], Bytes) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::with_capacity(1 << 16);
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::error!(target: "telemetry", error = %e, "failed to encode prometheus metrics");
    }
    (
        [(CONTENT_TYPE, encoder.format_type().to_string())],
        buf.into(),
    )
}

async fn healthz_handler() -> &'static str {
    "OK"
}

pub async fn run_server(addr: SocketAddr, cancel: tokio_util::sync::CancellationToken) {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(target: "telemetry", error = %e, "failed to bind metrics http server");
            return;
        }
    };
    tracing::info!(target: "telemetry", addr = %addr, "metrics server listening");

    let graceful = axum::serve(listener, app.into_make_service()).with_graceful_shutdown(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = signal::ctrl_c() => {}
        }
        tracing::info!(target: "telemetry", "metrics server shutting down");
    });

    if let Err(e) = graceful.await {
        tracing::error!(target: "telemetry", error = %e, "metrics server error");
    }
}
