//! Default collector: target reachability and exporter self-metrics.
//!
//! [`Exporter`] implements `prometheus::core::Collector`. Each gather runs a
//! reachability probe against the target (TCP connect, plus a TLS handshake
//! for `rediss://` targets) bounded by the connection timeout, then reports
//! `up`, scrape counters and build info under the configured namespace.
//! It speaks no data-store protocol.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Gauge, GaugeVec, IntCounter, Opts};
use rustls::pki_types::ServerName;
use url::Url;

use super::{CollectorFactory, ExporterOptions};
use crate::build_info::{BUILD_DATE, COMMIT_SHA, RUSTC_VERSION, VERSION};
use crate::error::ExporterError;
use crate::tls;

pub const DEFAULT_PORT: u16 = 6379;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

impl Target {
    /// Accepts `redis://host[:port]`, `rediss://host[:port]` or `host[:port]`.
    pub fn parse(addr: &str) -> Result<Self, String> {
        if addr.trim().is_empty() {
            return Err("empty address".into());
        }
        let url = if addr.contains("://") {
            Url::parse(addr)
        } else {
            Url::parse(&format!("redis://{addr}"))
        }
        .map_err(|e| e.to_string())?;

        let tls = match url.scheme() {
            "redis" => false,
            "rediss" => true,
            other => return Err(format!("unsupported scheme '{other}'")),
        };
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| "missing host".to_string())?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();

        Ok(Self {
            host,
            port: url.port().unwrap_or(DEFAULT_PORT),
            tls,
        })
    }
}

pub struct Exporter {
    target: Target,
    connection_timeout: Duration,
    tls_config: Option<Arc<rustls::ClientConfig>>,
    up: Gauge,
    scrapes_total: IntCounter,
    last_scrape_duration: Gauge,
    last_scrape_error: Gauge,
    build_info: GaugeVec,
}

impl Exporter {
    pub fn new(addr: &str, options: &ExporterOptions) -> Result<Self, ExporterError> {
        let construct_err = |reason: String| ExporterError::Collector {
            addr: addr.to_string(),
            reason,
        };
        let prom_err = |e: prometheus::Error| construct_err(e.to_string());

        let target = Target::parse(addr).map_err(construct_err)?;

        let tls_config = if target.tls {
            let config = tls::client_config(
                options.client_certificates.as_ref(),
                options.skip_tls_verification,
            )?;
            Some(Arc::new(config))
        } else {
            None
        };

        let ns = options.namespace.as_str();
        let up = Gauge::with_opts(
            Opts::new("up", "Information about the target instance reachability").namespace(ns),
        )
        .map_err(prom_err)?;
        let scrapes_total = IntCounter::with_opts(
            Opts::new("scrapes_total", "Current total scrapes.")
                .namespace(ns)
                .subsystem("exporter"),
        )
        .map_err(prom_err)?;
        let last_scrape_duration = Gauge::with_opts(
            Opts::new("last_scrape_duration_seconds", "The last scrape duration.")
                .namespace(ns)
                .subsystem("exporter"),
        )
        .map_err(prom_err)?;
        let last_scrape_error = Gauge::with_opts(
            Opts::new("last_scrape_error", "The last scrape error status.")
                .namespace(ns)
                .subsystem("exporter"),
        )
        .map_err(prom_err)?;
        let build_info = GaugeVec::new(
            Opts::new("build_info", "Exporter build information")
                .namespace(ns)
                .subsystem("exporter"),
            &["version", "commit_sha", "build_date", "rustc_version"],
        )
        .map_err(prom_err)?;
        build_info
            .with_label_values(&[VERSION, COMMIT_SHA, BUILD_DATE, RUSTC_VERSION])
            .set(1.0);

        tracing::debug!(
            host = %target.host,
            port = target.port,
            tls = target.tls,
            auth = !options.password.is_empty(),
            client_cert = options.client_certificates.is_some(),
            check_keys = ?options.check_keys,
            check_single_keys = ?options.check_single_keys,
            script_bytes = options.script.as_ref().map_or(0, Vec::len),
            config_command = %options.config_command_name,
            tile38 = options.is_tile38,
            client_list = options.export_client_list,
            set_client_name = options.set_client_name,
            system_metrics = options.incl_system_metrics,
            "collector configured"
        );

        Ok(Self {
            target,
            connection_timeout: options.connection_timeout,
            tls_config,
            up,
            scrapes_total,
            last_scrape_duration,
            last_scrape_error,
            build_info,
        })
    }

    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    fn probe(&self) -> io::Result<()> {
        let addrs = (self.target.host.as_str(), self.target.port).to_socket_addrs()?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connection_timeout) {
                Ok(stream) => return self.handshake(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "address resolved to nothing")
        }))
    }

    fn handshake(&self, mut stream: TcpStream) -> io::Result<()> {
        let Some(config) = &self.tls_config else {
            return Ok(());
        };
        stream.set_read_timeout(Some(self.connection_timeout))?;
        stream.set_write_timeout(Some(self.connection_timeout))?;

        let name = ServerName::try_from(self.target.host.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let mut conn = rustls::ClientConnection::new(Arc::clone(config), name)
            .map_err(io::Error::other)?;
        while conn.is_handshaking() {
            conn.complete_io(&mut stream)?;
        }
        Ok(())
    }
}

impl Collector for Exporter {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs = Vec::with_capacity(5);
        descs.extend(self.up.desc());
        descs.extend(self.scrapes_total.desc());
        descs.extend(self.last_scrape_duration.desc());
        descs.extend(self.last_scrape_error.desc());
        descs.extend(self.build_info.desc());
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let start = Instant::now();
        self.scrapes_total.inc();

        match self.probe() {
            Ok(()) => {
                self.up.set(1.0);
                self.last_scrape_error.set(0.0);
            }
            Err(e) => {
                tracing::warn!(
                    host = %self.target.host,
                    port = self.target.port,
                    error = %e,
                    "couldn't connect to target instance"
                );
                self.up.set(0.0);
                self.last_scrape_error.set(1.0);
            }
        }
        self.last_scrape_duration.set(start.elapsed().as_secs_f64());

        let mut families = Vec::with_capacity(5);
        families.extend(self.up.collect());
        families.extend(self.scrapes_total.collect());
        families.extend(self.last_scrape_duration.collect());
        families.extend(self.last_scrape_error.collect());
        families.extend(self.build_info.collect());
        families
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExporterFactory;

impl CollectorFactory for ExporterFactory {
    fn build(
        &self,
        addr: &str,
        options: &ExporterOptions,
    ) -> Result<Box<dyn Collector>, ExporterError> {
        Ok(Box::new(Exporter::new(addr, options)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::register_collector;
    use crate::config::{validation, Config};
    use crate::registry::encode_text;
    use prometheus::Registry;

    fn options(namespace: &str, registry: Registry) -> ExporterOptions {
        let config = Config {
            namespace: namespace.into(),
            connection_timeout: "500ms".into(),
            ..Config::default()
        };
        let validated = validation::validate(&config).unwrap();
        ExporterOptions::new(&config, validated, registry)
    }

    fn render(registry: &Registry) -> String {
        encode_text(registry).unwrap()
    }

    #[test]
    fn parses_target_forms() {
        assert_eq!(
            Target::parse("redis://localhost:9851").unwrap(),
            Target {
                host: "localhost".into(),
                port: 9851,
                tls: false
            }
        );
        assert_eq!(
            Target::parse("rediss://cache.internal").unwrap(),
            Target {
                host: "cache.internal".into(),
                port: 6379,
                tls: true
            }
        );
        assert_eq!(
            Target::parse("10.0.0.5:7000").unwrap(),
            Target {
                host: "10.0.0.5".into(),
                port: 7000,
                tls: false
            }
        );
        assert_eq!(Target::parse("redis://[::1]:6380").unwrap().host, "::1");
    }

    #[test]
    fn rejects_bad_targets() {
        assert!(Target::parse("").is_err());
        assert!(Target::parse("http://localhost:6379").is_err());
        assert!(Target::parse("redis://:6379").is_err());
    }

    #[test]
    fn invalid_namespace_fails_construction() {
        let err = Exporter::new("redis://localhost:6379", &options("bad-ns", Registry::new()))
            .err()
            .unwrap();
        assert!(matches!(err, ExporterError::Collector { .. }));
    }

    #[test]
    fn reachable_target_reports_up() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = format!("redis://{}", listener.local_addr().unwrap());

        let registry = Registry::new();
        register_collector(&ExporterFactory, &addr, &options("reach", registry.clone())).unwrap();

        let text = render(&registry);
        assert!(text.contains("reach_up 1"));
        assert!(text.contains("reach_exporter_last_scrape_error 0"));
        assert!(text.contains("reach_exporter_scrapes_total 1"));
        assert!(text.contains("reach_exporter_build_info{"));
    }

    #[test]
    fn unreachable_target_reports_down() {
        // bind then drop to get a port nothing listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let addr = format!("redis://127.0.0.1:{port}");

        let registry = Registry::new();
        register_collector(&ExporterFactory, &addr, &options("down", registry.clone())).unwrap();

        let text = render(&registry);
        assert!(text.contains("down_up 0"));
        assert!(text.contains("down_exporter_last_scrape_error 1"));

        render(&registry);
        assert!(render(&registry).contains("down_exporter_scrapes_total 3"));
    }

    #[test]
    fn tls_target_builds_client_config() {
        let exporter =
            Exporter::new("rediss://localhost:6380", &options("tls", Registry::new())).unwrap();
        assert!(exporter.target().tls);
        assert!(exporter.tls_config.is_some());
    }
}
