//! Boundary between the bootstrap and the metric collector.
//!
//! The bootstrap never looks inside a collector. It gathers everything a
//! collector needs into [`ExporterOptions`], asks a [`CollectorFactory`] to
//! build one, and registers the result into the selected registry with
//! [`register_collector`]. [`exporter::ExporterFactory`] is the default
//! factory used by `run`.

pub mod exporter;

use std::time::Duration;

use prometheus::core::Collector;
use prometheus::Registry;

use crate::config::validation::Validated;
use crate::config::Config;
use crate::error::ExporterError;
use crate::tls::ClientTlsMaterial;

#[derive(Debug, Clone)]
pub struct ExporterOptions {
    pub password: String,
    pub namespace: String,
    pub config_command_name: String,
    pub check_keys: Vec<String>,
    pub check_single_keys: Vec<String>,
    pub script: Option<Vec<u8>>,
    pub incl_system_metrics: bool,
    pub is_tile38: bool,
    pub export_client_list: bool,
    pub skip_tls_verification: bool,
    pub set_client_name: bool,
    pub client_certificates: Option<ClientTlsMaterial>,
    pub connection_timeout: Duration,
    pub metrics_path: String,
    pub exporter_metrics_only: bool,
    pub registry: Registry,
}

impl ExporterOptions {
    #[must_use]
    pub fn new(config: &Config, validated: Validated, registry: Registry) -> Self {
        Self {
            password: config.redis_pwd.clone(),
            namespace: config.namespace.clone(),
            config_command_name: config.config_command.clone(),
            check_keys: config.check_keys(),
            check_single_keys: config.check_single_keys(),
            script: validated.script,
            incl_system_metrics: config.incl_system_metrics,
            is_tile38: config.is_tile38,
            export_client_list: config.export_client_list,
            skip_tls_verification: config.skip_tls_verification,
            set_client_name: config.set_client_name,
            client_certificates: validated.tls,
            connection_timeout: validated.connection_timeout,
            metrics_path: config.metric_path.clone(),
            exporter_metrics_only: config.redis_metrics_only,
            registry,
        }
    }
}

pub trait CollectorFactory: Send + Sync {
    fn build(
        &self,
        addr: &str,
        options: &ExporterOptions,
    ) -> Result<Box<dyn Collector>, ExporterError>;
}

/// Build a collector and register it into `options.registry`.
pub fn register_collector(
    factory: &dyn CollectorFactory,
    addr: &str,
    options: &ExporterOptions,
) -> Result<(), ExporterError> {
    let collector = factory.build(addr, options)?;
    options
        .registry
        .register(collector)
        .map_err(ExporterError::Registration)
}
