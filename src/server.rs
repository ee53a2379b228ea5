//! # Liveness Server
//!
//! An `axum` server that answers `GET /ping` so an external uptime monitor
//! can keep the service awake, and optionally renders Prometheus metrics at
//! `GET /metrics`.
//!
//! The server listens to the application's shutdown signal and terminates
//! cleanly when it fires.

use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::Future;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, trace};

pub const PING_RESPONSE: &str = "👍 Backend is alive";

async fn ping() -> &'static str {
    info!("✅ Ping received");
    PING_RESPONSE
}

/// Builds the router, adding `/metrics` when a Prometheus handle is given.
pub fn router(prom_handle: Option<PrometheusHandle>) -> Router {
    let app = Router::new().route("/ping", get(ping));
    match prom_handle {
        Some(handle) => app.route("/metrics", get(move || async move { handle.render() })),
        None => app,
    }
}

pub struct LivenessServer {
    listener: TcpListener,
    prom_handle: Option<PrometheusHandle>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LivenessServer {
    /// Creates a new `LivenessServer` but does not spawn it.
    ///
    /// # Arguments
    ///
    /// * `listener` - A `TcpListener` that has already been bound to an address.
    /// * `prom_handle` - Renders `/metrics` when present.
    /// * `shutdown_rx` - A watch channel receiver for graceful shutdown.
    pub fn new(
        listener: TcpListener,
        prom_handle: Option<PrometheusHandle>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            listener,
            prom_handle,
            shutdown_rx,
        }
    }

    /// Returns a future that runs the server until a shutdown signal is received.
    pub fn run(mut self) -> impl Future<Output = ()> {
        let app = router(self.prom_handle.take());

        async move {
            tokio::select! {
                biased;
                _ = self.shutdown_rx.changed() => {
                    trace!("Liveness server received shutdown signal via select.");
                }
                result = axum::serve(self.listener, app.into_make_service()) => {
                    if let Err(e) = result {
                        error!("Liveness server error: {}", e);
                    }
                }
            }
            trace!("Liveness server task finished.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ping_responds() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(LivenessServer::new(listener, None, shutdown_rx).run());

        let body = reqwest::get(format!("http://{}/ping", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, PING_RESPONSE);

        let status = reqwest::get(format!("http://{}/metrics", addr))
            .await
            .unwrap()
            .status();
        assert_eq!(status, reqwest::StatusCode::NOT_FOUND);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
