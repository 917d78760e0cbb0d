//! `GET /health` endpoint handler.
//!
//! Returns a [`HealthResponse`] JSON payload with the exporter version,
//! uptime, metrics path, and cumulative push gateway statistics when the
//! publisher is running.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub metrics_path: String,
    pub push: Option<PushHealth>,
}

#[derive(Serialize, Deserialize)]
pub struct PushHealth {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub last_success_unix: Option<u64>,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let push = state.push_stats.as_ref().map(|stats| {
        let last = stats.last_success_unix.load(Ordering::Relaxed);
        PushHealth {
            attempts: stats.attempts.load(Ordering::Relaxed),
            successes: stats.successes.load(Ordering::Relaxed),
            failures: stats.failures.load(Ordering::Relaxed),
            last_success_unix: (last > 0).then_some(last),
        }
    });

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        metrics_path: state.metrics_path.clone(),
        push,
    })
}
