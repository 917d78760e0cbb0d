//! Unified error types for the exporter.
//!
//! [`ExporterError`] covers every fatal startup failure (validation,
//! collector construction, bind) and the per-tick push failures that the
//! publisher logs and swallows. Messages are written so that the single
//! diagnostic line printed by `main` is enough to fix the configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::duration::DurationParseError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExporterError {
    #[error("Couldn't parse connection timeout duration, err: {0}")]
    ConnectionTimeout(#[source] DurationParseError),

    #[error("Couldn't parse push timeout duration, err: {0}")]
    PushTimeout(#[source] DurationParseError),

    #[error("TLS client key file and cert file should both be present")]
    TlsPairing,

    #[error("Couldn't load TLS client key pair from {}: {reason}", path.display())]
    TlsLoad { path: PathBuf, reason: String },

    #[error("Couldn't build TLS client config: {0}")]
    TlsConfig(#[from] rustls::Error),

    #[error("Error loading script file {}    err: {source}", path.display())]
    ScriptLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid metric path '{0}' (must start with '/' and contain no route captures)")]
    MetricPath(String),

    #[error("Couldn't build collector for {addr}: {reason}")]
    Collector { addr: String, reason: String },

    #[error("Couldn't register collector: {0}")]
    Registration(#[source] prometheus::Error),

    #[error("Couldn't encode metrics: {0}")]
    Encode(#[source] prometheus::Error),

    #[error("Couldn't listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid push gateway address '{addr}': {reason}")]
    PushGatewayAddr { addr: String, reason: String },

    #[error("Push request failed: {source}")]
    PushRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Push gateway rejected push with status {status}: {body}")]
    PushRejected {
        status: hyper::StatusCode,
        body: String,
    },

    #[error("Push timed out after {0:?}")]
    PushTimedOut(Duration),

    #[error("Metrics gather task failed: {0}")]
    Gather(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
