//! Selection of the single metrics registry served by the process.
//!
//! The registry is chosen once at startup and handed explicitly to the
//! collector factory, the publisher, and the HTTP state. `prometheus::Registry`
//! is a cheap reference-counted handle, so every consumer holds a clone of
//! the same underlying collection.

use prometheus::{Registry, TextEncoder};

use crate::error::ExporterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryMode {
    /// Only the collector's own instruments.
    Isolated,
    /// The process-wide default registry, which also carries process metrics.
    Merged,
}

impl RegistryMode {
    #[must_use]
    pub const fn from_exporter_only(exporter_only: bool) -> Self {
        if exporter_only {
            Self::Isolated
        } else {
            Self::Merged
        }
    }
}

#[must_use]
pub fn select_registry(exporter_only: bool) -> Registry {
    match RegistryMode::from_exporter_only(exporter_only) {
        RegistryMode::Isolated => Registry::new(),
        RegistryMode::Merged => prometheus::default_registry().clone(),
    }
}

/// Gather every collector and encode in the Prometheus text format.
///
/// Blocks for as long as the slowest collector takes.
pub fn encode_text(registry: &Registry) -> Result<String, ExporterError> {
    TextEncoder::new()
        .encode_to_string(&registry.gather())
        .map_err(ExporterError::Encode)
}

/// [`encode_text`] on the blocking pool, for use from async handlers.
pub async fn gather_text(registry: Registry) -> Result<String, ExporterError> {
    tokio::task::spawn_blocking(move || encode_text(&registry)).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{IntCounter, Opts};

    fn render(registry: &Registry) -> String {
        encode_text(registry).unwrap()
    }

    #[test]
    fn exporter_only_selects_isolated_mode() {
        assert_eq!(RegistryMode::from_exporter_only(true), RegistryMode::Isolated);
        assert_eq!(RegistryMode::from_exporter_only(false), RegistryMode::Merged);
    }

    #[test]
    fn isolated_registry_starts_empty() {
        let registry = select_registry(true);
        assert!(registry.gather().is_empty());
    }

    #[test]
    fn isolated_registries_are_independent() {
        let a = select_registry(true);
        let b = select_registry(true);
        let counter = IntCounter::with_opts(Opts::new("registry_test_total", "test")).unwrap();
        a.register(Box::new(counter)).unwrap();
        assert_eq!(a.gather().len(), 1);
        assert!(b.gather().is_empty());
    }

    #[test]
    fn merged_registry_shares_default() {
        let counter =
            IntCounter::with_opts(Opts::new("registry_merged_test_total", "test")).unwrap();
        select_registry(false)
            .register(Box::new(counter))
            .unwrap();
        let text = render(prometheus::default_registry());
        assert!(text.contains("registry_merged_test_total 0"));
    }

    #[tokio::test]
    async fn gather_text_runs_off_the_runtime() {
        let registry = select_registry(true);
        let counter = IntCounter::with_opts(Opts::new("registry_async_total", "test")).unwrap();
        counter.inc_by(3);
        registry.register(Box::new(counter)).unwrap();

        let text = gather_text(registry).await.unwrap();
        assert!(text.contains("# TYPE registry_async_total counter"));
        assert!(text.contains("registry_async_total 3"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn merged_registry_exposes_process_metrics() {
        let text = render(&select_registry(false));
        assert!(text.contains("process_resident_memory_bytes"));
    }
}
