//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding the registry,
//! metrics path, push statistics and uptime), [`build_router`] for the
//! scrape, landing and health routes, [`bind`] for the listener, and
//! [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use prometheus::Registry;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::ExporterError;
use crate::health::health_handler;
use crate::publisher::PushStats;
use crate::registry;

pub struct AppState {
    pub registry: Registry,
    pub metrics_path: String,
    pub start_time: Instant,
    pub push_stats: Option<Arc<PushStats>>,
}

impl AppState {
    #[must_use]
    pub fn new(registry: Registry, metrics_path: &str, push_stats: Option<Arc<PushStats>>) -> Self {
        Self {
            registry,
            metrics_path: metrics_path.to_string(),
            start_time: Instant::now(),
            push_stats,
        }
    }
}

/// Landing and health routes are only added when they don't collide with
/// the metrics path.
pub fn build_router(state: Arc<AppState>) -> Router {
    let metrics_path = state.metrics_path.clone();
    let mut router = Router::new().route(&metrics_path, get(metrics_handler));
    if metrics_path != "/" {
        router = router.route("/", get(landing_handler));
    }
    if metrics_path != "/health" {
        router = router.route("/health", get(health_handler));
    }
    router.layer(TraceLayer::new_for_http()).with_state(state)
}

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match registry::gather_text(state.registry.clone()).await {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to gather metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub async fn landing_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let version = env!("CARGO_PKG_VERSION");
    Html(format!(
        "<html>\n<head><title>Redis Exporter v{version}</title></head>\n<body>\n\
         <h1>Redis Exporter v{version}</h1>\n\
         <p><a href='{path}'>Metrics</a></p>\n\
         </body>\n</html>\n",
        path = state.metrics_path
    ))
}

/// `:9121` listens on all interfaces; anything else is used as given.
#[must_use]
pub fn listen_address(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

pub async fn bind(addr: &str) -> Result<TcpListener, ExporterError> {
    let normalized = listen_address(addr);
    TcpListener::bind(&normalized)
        .await
        .map_err(|source| ExporterError::Bind {
            addr: normalized,
            source,
        })
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
