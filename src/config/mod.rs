//! Configuration resolution from the process environment.
//!
//! Every setting is read from a named environment variable through the
//! [`EnvSource`] trait and falls back to a static default when the
//! variable is absent. Booleans and integers that fail to parse are
//! treated as absent, so resolution never fails. Duration settings are
//! kept as raw strings and parsed by [`validation::validate`].

pub mod duration;
pub mod validation;

use std::collections::HashMap;

use serde::Serialize;

pub const REDIS_ADDR: &str = "REDIS_ADDR";
pub const REDIS_PWD: &str = "REDIS_PWD";
pub const NAMESPACE: &str = "NAMESPACE";
pub const CHECK_KEYS: &str = "CHECK_KEYS";
pub const CHECK_SINGLE_KEYS: &str = "CHECK_SINGLE_KEYS";
pub const SCRIPT_PATH: &str = "SCRIPT_PATH";
pub const LISTEN_ADDRESS: &str = "LISTEN_ADDRESS";
pub const METRIC_PATH: &str = "METRIC_PATH";
pub const LOG_FORMAT: &str = "LOG_FORMAT";
pub const CONFIG_COMMAND: &str = "CONFIG_COMMAND";
pub const CONNECTION_TIMEOUT: &str = "CONNECTION_TIMEOUT";
pub const TLS_CLIENT_KEY_FILE: &str = "TLS_CLIENT_KEY_FILE";
pub const TLS_CLIENT_CERT_FILE: &str = "TLS_CLIENT_CERT_FILE";
pub const IS_DEBUG: &str = "IS_DEBUG";
pub const IS_TILE38: &str = "IS_TILE38";
pub const EXPORT_CLIENT_LIST: &str = "EXPORT_CLIENT_LIST";
pub const SET_CLIENT_NAME: &str = "SET_CLIENT_NAME";
pub const SHOW_VERSION: &str = "SHOW_VERSION";
pub const REDIS_METRICS_ONLY: &str = "REDIS_METRICS_ONLY";
pub const INCL_SYSTEM_METRICS: &str = "INCL_SYSTEM_METRICS";
pub const SKIP_TLS_VERIFICATION: &str = "SKIP_TLS_VERIFICATION";
pub const PUSH_GATEWAY_ADDR: &str = "PUSH_GATEWAY_ADDR";
pub const METRICS_JOB_NAME: &str = "METRICS_JOB_NAME";
pub const APP_NAME: &str = "APP_NAME";
pub const INSTANCE_ID: &str = "INSTANCE_ID";
pub const PUSH_INTERVAL_IN_SEC: &str = "PUSH_INTERVAL_IN_SEC";
pub const PUSH_TIMEOUT: &str = "PUSH_TIMEOUT";

pub const DEFAULT_REDIS_ADDR: &str = "redis://localhost:9851";
pub const DEFAULT_NAMESPACE: &str = "namespace";
pub const DEFAULT_LISTEN_ADDRESS: &str = ":9121";
pub const DEFAULT_METRIC_PATH: &str = "/metrics";
pub const DEFAULT_LOG_FORMAT: &str = "txt";
pub const DEFAULT_CONFIG_COMMAND: &str = "CONFIG";
pub const DEFAULT_CONNECTION_TIMEOUT: &str = "15s";
pub const DEFAULT_IS_DEBUG: bool = false;
pub const DEFAULT_IS_TILE38: bool = true;
pub const DEFAULT_EXPORT_CLIENT_LIST: bool = false;
pub const DEFAULT_SET_CLIENT_NAME: bool = false;
pub const DEFAULT_SHOW_VERSION: bool = false;
pub const DEFAULT_REDIS_METRICS_ONLY: bool = false;
pub const DEFAULT_INCL_SYSTEM_METRICS: bool = true;
pub const DEFAULT_SKIP_TLS_VERIFICATION: bool = true;
pub const DEFAULT_PUSH_GATEWAY_ADDR: &str = "http://localhost:8081";
pub const DEFAULT_PUSH_INTERVAL_IN_SEC: i64 = 30;
pub const DEFAULT_PUSH_TIMEOUT: &str = "10s";

/// Read-only view of a set of environment variables.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// The real process environment. Non-UTF-8 values count as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl EnvSource for HashMap<&str, &str> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).map(|v| (*v).to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub redis_addr: String,
    pub redis_pwd: String,
    pub namespace: String,
    pub check_keys: String,
    pub check_single_keys: String,
    pub script_path: String,
    pub listen_address: String,
    pub metric_path: String,
    pub log_format: String,
    pub config_command: String,
    pub connection_timeout: String,
    pub tls_client_key_file: String,
    pub tls_client_cert_file: String,
    pub is_debug: bool,
    pub is_tile38: bool,
    pub export_client_list: bool,
    pub set_client_name: bool,
    pub show_version: bool,
    pub redis_metrics_only: bool,
    pub incl_system_metrics: bool,
    pub skip_tls_verification: bool,
    pub push_gateway_addr: String,
    pub metrics_job_name: String,
    pub app_name: String,
    pub instance_id: String,
    pub push_interval_in_sec: i64,
    pub push_timeout: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(&HashMap::<String, String>::new())
    }
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self::resolve(&ProcessEnv)
    }

    #[must_use]
    pub fn resolve(env: &impl EnvSource) -> Self {
        Self {
            redis_addr: get_string(env, REDIS_ADDR, DEFAULT_REDIS_ADDR),
            redis_pwd: get_string(env, REDIS_PWD, ""),
            namespace: get_string(env, NAMESPACE, DEFAULT_NAMESPACE),
            check_keys: get_string(env, CHECK_KEYS, ""),
            check_single_keys: get_string(env, CHECK_SINGLE_KEYS, ""),
            script_path: get_string(env, SCRIPT_PATH, ""),
            listen_address: get_string(env, LISTEN_ADDRESS, DEFAULT_LISTEN_ADDRESS),
            metric_path: get_string(env, METRIC_PATH, DEFAULT_METRIC_PATH),
            log_format: get_string(env, LOG_FORMAT, DEFAULT_LOG_FORMAT),
            config_command: get_string(env, CONFIG_COMMAND, DEFAULT_CONFIG_COMMAND),
            connection_timeout: get_string(env, CONNECTION_TIMEOUT, DEFAULT_CONNECTION_TIMEOUT),
            tls_client_key_file: get_string(env, TLS_CLIENT_KEY_FILE, ""),
            tls_client_cert_file: get_string(env, TLS_CLIENT_CERT_FILE, ""),
            is_debug: get_bool(env, IS_DEBUG, DEFAULT_IS_DEBUG),
            is_tile38: get_bool(env, IS_TILE38, DEFAULT_IS_TILE38),
            export_client_list: get_bool(env, EXPORT_CLIENT_LIST, DEFAULT_EXPORT_CLIENT_LIST),
            set_client_name: get_bool(env, SET_CLIENT_NAME, DEFAULT_SET_CLIENT_NAME),
            show_version: get_bool(env, SHOW_VERSION, DEFAULT_SHOW_VERSION),
            redis_metrics_only: get_bool(env, REDIS_METRICS_ONLY, DEFAULT_REDIS_METRICS_ONLY),
            incl_system_metrics: get_bool(env, INCL_SYSTEM_METRICS, DEFAULT_INCL_SYSTEM_METRICS),
            skip_tls_verification: get_bool(
                env,
                SKIP_TLS_VERIFICATION,
                DEFAULT_SKIP_TLS_VERIFICATION,
            ),
            push_gateway_addr: get_string(env, PUSH_GATEWAY_ADDR, DEFAULT_PUSH_GATEWAY_ADDR),
            metrics_job_name: get_string(env, METRICS_JOB_NAME, ""),
            app_name: get_string(env, APP_NAME, ""),
            instance_id: get_string(env, INSTANCE_ID, ""),
            push_interval_in_sec: get_int(env, PUSH_INTERVAL_IN_SEC, DEFAULT_PUSH_INTERVAL_IN_SEC),
            push_timeout: get_string(env, PUSH_TIMEOUT, DEFAULT_PUSH_TIMEOUT),
        }
    }

    /// Key patterns searched for with SCAN.
    #[must_use]
    pub fn check_keys(&self) -> Vec<String> {
        split_list(&self.check_keys)
    }

    #[must_use]
    pub fn check_single_keys(&self) -> Vec<String> {
        split_list(&self.check_single_keys)
    }

    /// Copy with the credential masked, for logs and `check` output.
    #[must_use]
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        if !masked.redis_pwd.is_empty() {
            masked.redis_pwd = "******".to_string();
        }
        masked
    }
}

fn get_string(env: &impl EnvSource, key: &str, default: &str) -> String {
    env.get(key).unwrap_or_else(|| default.to_string())
}

fn get_bool(env: &impl EnvSource, key: &str, default: bool) -> bool {
    env.get(key)
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn get_int(env: &impl EnvSource, key: &str, default: i64) -> i64 {
    env.get(key)
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}

/// Accepts the same spellings as Go's `strconv.ParseBool`.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
