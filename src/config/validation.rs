//! Startup validation of a resolved [`Config`].
//!
//! [`validate`] parses the duration settings, enforces that the TLS client
//! key and certificate paths are set together, loads the key pair and the
//! optional script, and checks the metric path. Every failure is fatal:
//! the caller is expected to stop before allocating any network resource.

use std::path::Path;
use std::time::Duration;

use super::duration::parse_duration;
use super::Config;
use crate::error::ExporterError;
use crate::tls::ClientTlsMaterial;

/// Settings derived from a [`Config`] that only exist once it is valid.
#[derive(Debug, Clone)]
pub struct Validated {
    pub connection_timeout: Duration,
    pub push_timeout: Duration,
    pub tls: Option<ClientTlsMaterial>,
    pub script: Option<Vec<u8>>,
}

pub fn validate(config: &Config) -> Result<Validated, ExporterError> {
    let connection_timeout =
        parse_duration(&config.connection_timeout).map_err(ExporterError::ConnectionTimeout)?;
    let push_timeout = parse_duration(&config.push_timeout).map_err(ExporterError::PushTimeout)?;

    let tls = load_tls(&config.tls_client_cert_file, &config.tls_client_key_file)?;

    let script = if config.script_path.is_empty() {
        None
    } else {
        let path = Path::new(&config.script_path);
        let bytes = std::fs::read(path).map_err(|source| ExporterError::ScriptLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Some(bytes)
    };

    validate_metric_path(&config.metric_path)?;

    Ok(Validated {
        connection_timeout,
        push_timeout,
        tls,
        script,
    })
}

/// Both paths empty means no client certificate; exactly one set is an error.
pub fn load_tls(cert_file: &str, key_file: &str) -> Result<Option<ClientTlsMaterial>, ExporterError> {
    match (cert_file.is_empty(), key_file.is_empty()) {
        (true, true) => Ok(None),
        (false, false) => {
            ClientTlsMaterial::load(Path::new(cert_file), Path::new(key_file)).map(Some)
        }
        _ => Err(ExporterError::TlsPairing),
    }
}

/// The path is mounted as a literal route, so it must be absolute and free
/// of router capture syntax.
pub fn validate_metric_path(path: &str) -> Result<(), ExporterError> {
    let literal = path.starts_with('/')
        && !path.contains(['{', '}', '*'])
        && !path.split('/').any(|segment| segment.starts_with(':'));
    if literal {
        Ok(())
    } else {
        Err(ExporterError::MetricPath(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture(name: &str) -> String {
        format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
    }

    #[test]
    fn default_config_is_valid() {
        let validated = validate(&Config::default()).unwrap();
        assert_eq!(validated.connection_timeout, Duration::from_secs(15));
        assert_eq!(validated.push_timeout, Duration::from_secs(10));
        assert!(validated.tls.is_none());
        assert!(validated.script.is_none());
    }

    #[test]
    fn malformed_connection_timeout_is_fatal() {
        let config = Config {
            connection_timeout: "notaduration".into(),
            ..Config::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ExporterError::ConnectionTimeout(_)));
        assert!(err
            .to_string()
            .contains("time: invalid duration \"notaduration\""));
    }

    #[test]
    fn malformed_push_timeout_is_fatal() {
        let config = Config {
            push_timeout: "ten seconds".into(),
            ..Config::default()
        };
        assert!(matches!(
            validate(&config).unwrap_err(),
            ExporterError::PushTimeout(_)
        ));
    }

    #[test]
    fn only_key_file_is_fatal() {
        let config = Config {
            tls_client_key_file: fixture("client.key"),
            ..Config::default()
        };
        assert!(matches!(
            validate(&config).unwrap_err(),
            ExporterError::TlsPairing
        ));
    }

    #[test]
    fn only_cert_file_is_fatal() {
        let config = Config {
            tls_client_cert_file: fixture("client.crt"),
            ..Config::default()
        };
        let err = validate(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TLS client key file and cert file should both be present"
        );
    }

    #[test]
    fn both_tls_files_load_material() {
        let config = Config {
            tls_client_cert_file: fixture("client.crt"),
            tls_client_key_file: fixture("client.key"),
            ..Config::default()
        };
        let validated = validate(&config).unwrap();
        let tls = validated.tls.unwrap();
        assert_eq!(tls.certificates().len(), 1);
    }

    #[test]
    fn missing_tls_files_are_fatal() {
        let config = Config {
            tls_client_cert_file: "/nonexistent/client.crt".into(),
            tls_client_key_file: "/nonexistent/client.key".into(),
            ..Config::default()
        };
        assert!(matches!(
            validate(&config).unwrap_err(),
            ExporterError::TlsLoad { .. }
        ));
    }

    #[test]
    fn garbage_tls_files_are_fatal() {
        let mut cert = tempfile::NamedTempFile::new().unwrap();
        writeln!(cert, "not a certificate").unwrap();
        let mut key = tempfile::NamedTempFile::new().unwrap();
        writeln!(key, "not a key").unwrap();

        let config = Config {
            tls_client_cert_file: cert.path().display().to_string(),
            tls_client_key_file: key.path().display().to_string(),
            ..Config::default()
        };
        assert!(matches!(
            validate(&config).unwrap_err(),
            ExporterError::TlsLoad { .. }
        ));
    }

    #[test]
    fn script_is_loaded() {
        let mut script = tempfile::NamedTempFile::new().unwrap();
        write!(script, "return redis.call('INFO')").unwrap();

        let config = Config {
            script_path: script.path().display().to_string(),
            ..Config::default()
        };
        let validated = validate(&config).unwrap();
        assert_eq!(
            validated.script.as_deref(),
            Some(&b"return redis.call('INFO')"[..])
        );
    }

    #[test]
    fn missing_script_is_fatal() {
        let config = Config {
            script_path: "/nonexistent/collect.lua".into(),
            ..Config::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("Error loading script file"));
    }

    #[test]
    fn metric_path_must_be_absolute() {
        let config = Config {
            metric_path: "metrics".into(),
            ..Config::default()
        };
        assert!(matches!(
            validate(&config).unwrap_err(),
            ExporterError::MetricPath(_)
        ));
        assert!(validate_metric_path("/").is_ok());
    }

    #[test]
    fn metric_path_rejects_route_captures() {
        for path in ["/:x", "/metrics/:id", "/{a", "/{a}", "/a}", "/*rest", "/m*"] {
            let config = Config {
                metric_path: path.into(),
                ..Config::default()
            };
            assert!(
                matches!(validate(&config).unwrap_err(), ExporterError::MetricPath(_)),
                "{path} should be rejected"
            );
        }
        assert!(validate_metric_path("/metrics").is_ok());
        assert!(validate_metric_path("/prom/metrics:v1").is_ok());
    }
}
