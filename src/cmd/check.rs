//! `redis_exporter check` — validate the environment configuration.
//!
//! Resolves and validates the configuration without binding, registering
//! or pushing anything, and prints the effective settings (credential
//! masked) as text or JSON.

use std::fmt::Write;

use crate::cli::{CheckArgs, CheckFormat};
use crate::config::validation::{self, Validated};
use crate::config::{Config, EnvSource};
use crate::error::ExporterError;

pub fn execute(args: &CheckArgs, env: &impl EnvSource) -> Result<(), ExporterError> {
    let config = Config::resolve(env);

    match validation::validate(&config) {
        Ok(validated) => {
            println!("{}", render(&config, &validated, &args.format));
            Ok(())
        }
        Err(e) => {
            match args.format {
                CheckFormat::Text => eprintln!("\u{2717} configuration is invalid: {e}"),
                CheckFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "valid": false, "error": e.to_string() })
                ),
            }
            Err(e)
        }
    }
}

#[must_use]
pub fn render(config: &Config, validated: &Validated, format: &CheckFormat) -> String {
    let masked = serde_json::to_value(config.masked()).unwrap_or_default();

    match format {
        CheckFormat::Json => serde_json::json!({
            "valid": true,
            "config": masked,
            "connection_timeout_ms": validated.connection_timeout.as_millis(),
            "push_timeout_ms": validated.push_timeout.as_millis(),
            "tls_client_certificate": validated.tls.is_some(),
            "script_bytes": validated.script.as_ref().map_or(0, Vec::len),
        })
        .to_string(),
        CheckFormat::Text => {
            let mut out = String::from("\u{2713} configuration is valid\n");
            if let Some(fields) = masked.as_object() {
                for (key, value) in fields {
                    let value = value
                        .as_str()
                        .map_or_else(|| value.to_string(), String::from);
                    // write! to String is infallible
                    let _ = writeln!(out, "  {key:<24} {value}");
                }
            }
            let _ = write!(
                out,
                "  {:<24} {:?}",
                "(connection timeout)", validated.connection_timeout
            );
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn text_report_masks_credential() {
        let env: HashMap<&str, &str> = [("REDIS_PWD", "hunter2")].into_iter().collect();
        let config = Config::resolve(&env);
        let validated = validation::validate(&config).unwrap();

        let text = render(&config, &validated, &CheckFormat::Text);
        assert!(text.starts_with("\u{2713} configuration is valid"));
        assert!(text.contains("redis_pwd"));
        assert!(text.contains("******"));
        assert!(!text.contains("hunter2"));
        assert!(text.contains("15s"));
    }

    #[test]
    fn json_report_is_parseable() {
        let config = Config::default();
        let validated = validation::validate(&config).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&render(&config, &validated, &CheckFormat::Json)).unwrap();
        assert_eq!(json["valid"], true);
        assert_eq!(json["connection_timeout_ms"], 15_000);
        assert_eq!(json["config"]["listen_address"], ":9121");
        assert_eq!(json["config"]["push_interval_in_sec"], 30);
    }

    #[test]
    fn invalid_environment_is_an_error() {
        let env: HashMap<&str, &str> = [("TLS_CLIENT_KEY_FILE", "/tmp/only-key.pem")]
            .into_iter()
            .collect();
        let args = CheckArgs {
            format: CheckFormat::Json,
        };
        assert!(matches!(
            execute(&args, &env).unwrap_err(),
            ExporterError::TlsPairing
        ));
    }
}
