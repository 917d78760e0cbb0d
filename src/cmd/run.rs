//! `redis_exporter run` — start the exporter.
//!
//! Resolves configuration from the environment, validates it, selects the
//! registry, builds and registers the collector, then spawns the push
//! gateway publisher and serves the registry over HTTP until SIGTERM or
//! Ctrl+C. Every step before serving is fatal on failure.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::build_info;
use crate::collector::exporter::ExporterFactory;
use crate::collector::{register_collector, CollectorFactory, ExporterOptions};
use crate::config::validation;
use crate::config::Config;
use crate::error::ExporterError;
use crate::logging::{self, LogFormat};
use crate::publisher::{self, Publisher, PushTarget};
use crate::registry::select_registry;
use crate::server::{self, AppState};

pub async fn execute() -> Result<(), ExporterError> {
    let config = Config::from_env();
    logging::init(LogFormat::from_config(&config.log_format), config.is_debug);

    tracing::info!(
        version = build_info::VERSION,
        build_date = build_info::BUILD_DATE,
        commit_sha = build_info::COMMIT_SHA,
        rustc = build_info::RUSTC_VERSION,
        build_target = build_info::TARGET,
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        "Redis Metrics Exporter"
    );
    if config.is_debug {
        tracing::debug!("Enabling debug output");
    }
    tracing::debug!(config = ?config.masked(), "effective configuration");

    if config.show_version {
        return Ok(());
    }

    let service = Service::prepare(&config, &ExporterFactory).await?;
    service.serve(server::shutdown_signal()).await
}

/// A fully validated exporter whose listener is bound but not yet serving.
pub struct Service {
    listener: TcpListener,
    router: Router,
    publisher: Option<Publisher>,
}

impl Service {
    pub async fn prepare(
        config: &Config,
        factory: &dyn CollectorFactory,
    ) -> Result<Self, ExporterError> {
        let validated = validation::validate(config)?;
        let push_timeout = validated.push_timeout;

        let registry = select_registry(config.redis_metrics_only);
        let options = ExporterOptions::new(config, validated, registry.clone());
        register_collector(factory, &config.redis_addr, &options)?;

        let publisher = match PushTarget::from_config(config) {
            Ok(Some(target)) => Some(Publisher::new(
                registry.clone(),
                target,
                publisher::push_interval(config.push_interval_in_sec),
                push_timeout,
            )),
            Ok(None) => {
                tracing::warn!("no push gateway address configured, publisher disabled");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "publisher disabled");
                None
            }
        };

        let state = Arc::new(AppState::new(
            registry,
            &config.metric_path,
            publisher.as_ref().map(Publisher::stats),
        ));
        let router = server::build_router(state);
        let listener = server::bind(&config.listen_address).await?;

        tracing::info!(
            addr = %listener.local_addr()?,
            metrics_path = %config.metric_path,
            target = %config.redis_addr,
            exporter_only = config.redis_metrics_only,
            "Providing metrics"
        );

        Ok(Self {
            listener,
            router,
            publisher,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ExporterError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves, then stop the publisher and drain.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ExporterError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        let publisher_handle: Option<JoinHandle<()>> = self
            .publisher
            .map(|publisher| tokio::spawn(publisher.run(shutdown_rx)));

        let graceful_shutdown = async move {
            shutdown.await;
            let _ = shutdown_tx.send(true);
        };

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(graceful_shutdown)
            .await?;

        if let Some(handle) = publisher_handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "publisher task failed");
            }
        }

        tracing::info!("exporter stopped");
        Ok(())
    }
}
