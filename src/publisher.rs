//! Periodic publication of the registry to a Prometheus push gateway.
//!
//! [`Publisher::run`] ticks on a fixed interval (first tick immediately),
//! gathers the shared registry, and `PUT`s the text exposition to the
//! gateway under the job/app/instance grouping built by [`PushTarget`].
//! The push timeout bounds only the exchange with the gateway; the gather
//! is bounded by the collector's own connection timeout.
//! A failed push is logged and the loop waits for the next tick; nothing
//! is retried and nothing propagates to the HTTP serving path. The loop
//! stops when the watch channel flips or its sender is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::Method;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use prometheus::Registry;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use url::Url;

use crate::config::Config;
use crate::error::ExporterError;
use crate::registry;

pub const MIN_PUSH_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_JOB_NAME: &str = "redis_exporter";

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, Full<Bytes>>;

#[must_use]
pub fn build_http_client() -> HttpClient {
    // Several rustls providers may be compiled in; pin `ring` explicitly.
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

/// Interval between pushes. Non-positive values are clamped to
/// [`MIN_PUSH_INTERVAL`] instead of spinning.
#[must_use]
pub fn push_interval(secs: i64) -> Duration {
    match u64::try_from(secs) {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            tracing::warn!(
                configured = secs,
                clamped_to_secs = MIN_PUSH_INTERVAL.as_secs(),
                "push interval must be positive, clamping"
            );
            MIN_PUSH_INTERVAL
        }
    }
}

/// `METRICS_JOB_NAME`, else `APP_NAME`, else [`DEFAULT_JOB_NAME`].
#[must_use]
pub fn job_name(config: &Config) -> &str {
    [config.metrics_job_name.as_str(), config.app_name.as_str()]
        .into_iter()
        .find(|name| !name.is_empty())
        .unwrap_or(DEFAULT_JOB_NAME)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTarget {
    url: Url,
}

impl PushTarget {
    pub fn new(gateway: &str, job: &str, app: &str, instance: &str) -> Result<Self, ExporterError> {
        let invalid = |reason: &str| ExporterError::PushGatewayAddr {
            addr: gateway.to_string(),
            reason: reason.to_string(),
        };

        // `host:port` without a scheme means plain http
        let parsed = if gateway.contains("://") {
            Url::parse(gateway)
        } else {
            Url::parse(&format!("http://{gateway}"))
        };
        let mut url = parsed.map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if job.is_empty() {
            return Err(invalid("job name cannot be empty"));
        }

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| invalid("cannot be a base URL"))?;
            segments.pop_if_empty().extend(["metrics", "job", job]);
            if !app.is_empty() {
                segments.extend(["app", app]);
            }
            if !instance.is_empty() {
                segments.extend(["instance", instance]);
            }
        }
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self { url })
    }

    /// `None` when no gateway address is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, ExporterError> {
        if config.push_gateway_addr.is_empty() {
            return Ok(None);
        }
        Self::new(
            &config.push_gateway_addr,
            job_name(config),
            &config.app_name,
            &config.instance_id,
        )
        .map(Some)
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[derive(Debug, Default)]
pub struct PushStats {
    pub attempts: AtomicU64,
    pub successes: AtomicU64,
    pub failures: AtomicU64,
    pub last_success_unix: AtomicU64,
}

impl PushStats {
    fn record(&self, result: &Result<(), ExporterError>) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if result.is_ok() {
            self.successes.fetch_add(1, Ordering::Relaxed);
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs());
            self.last_success_unix.store(now, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

pub struct Publisher {
    client: HttpClient,
    registry: Registry,
    target: PushTarget,
    interval: Duration,
    timeout: Duration,
    stats: Arc<PushStats>,
}

impl Publisher {
    #[must_use]
    pub fn new(registry: Registry, target: PushTarget, interval: Duration, timeout: Duration) -> Self {
        Self {
            client: build_http_client(),
            registry,
            target,
            // tokio intervals panic on a zero period
            interval: if interval.is_zero() {
                MIN_PUSH_INTERVAL
            } else {
                interval
            },
            timeout,
            stats: Arc::new(PushStats::default()),
        }
    }

    #[must_use]
    pub fn stats(&self) -> Arc<PushStats> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn target(&self) -> &PushTarget {
        &self.target
    }

    /// Gather the registry, then push it. Only the gateway exchange is
    /// bounded by the push timeout.
    pub async fn push_once(&self) -> Result<(), ExporterError> {
        let body = registry::gather_text(self.registry.clone()).await?;
        tokio::time::timeout(self.timeout, self.send(body))
            .await
            .map_err(|_| ExporterError::PushTimedOut(self.timeout))?
    }

    async fn send(&self, body: String) -> Result<(), ExporterError> {
        let uri: hyper::Uri = self
            .target
            .url
            .as_str()
            .parse()
            .map_err(|e: hyper::http::uri::InvalidUri| ExporterError::PushRequest {
                source: Box::new(e),
            })?;
        let req = hyper::Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .header(CONTENT_TYPE, prometheus::TEXT_FORMAT)
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| ExporterError::PushRequest {
                source: Box::new(e),
            })?;

        let response = self
            .client
            .request(req)
            .await
            .map_err(|e| ExporterError::PushRequest {
                source: Box::new(e),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response
            .into_body()
            .collect()
            .await
            .map(|b| String::from_utf8_lossy(&b.to_bytes()).trim().to_string())
            .unwrap_or_default();
        Err(ExporterError::PushRejected { status, body })
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            url = %self.target.url,
            interval_secs = self.interval.as_secs_f64(),
            timeout_secs = self.timeout.as_secs_f64(),
            "publishing metrics to push gateway"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => {
                    tracing::debug!("publisher loop shutting down");
                    return;
                }
            }

            let result = self.push_once().await;
            self.stats.record(&result);
            match result {
                Ok(()) => tracing::debug!(url = %self.target.url, "pushed metrics"),
                Err(e) => {
                    tracing::info!(error = %e, "Error pushing metrics to push gateway");
                }
            }
        }
    }
}
