use crate::routes::{router, HttpState};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

pub async fn run(addr: SocketAddr, state: HttpState, cancel: CancellationToken) {
    let app = router(state);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(target: "http", error = %e, "failed to bind http ingress");
            return;
        }
    };
    tracing::info!(target: "http", addr = %addr, "http ingress listening");

    let graceful = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move { cancel.cancelled().await });

    if let Err(e) = graceful.await {
        tracing::error!(target: "http", error = %e, "http ingress server error");
    }
}
