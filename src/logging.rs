//! Structured logging setup using the `tracing` ecosystem.
//!
//! `LOG_FORMAT=json` selects JSON lines; anything else (the default `txt`)
//! selects plain text. `IS_DEBUG` lowers the level from info to debug.

use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    #[must_use]
    pub fn from_config(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

#[must_use]
pub const fn level(debug: bool) -> tracing::Level {
    if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    }
}

pub fn init(format: LogFormat, debug: bool) {
    let filter = Targets::new().with_default(level(debug));

    // try_init: a second call (tests, embedding) keeps the first subscriber
    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init(),
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "logging already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_the_only_alternate_format() {
        assert_eq!(LogFormat::from_config("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_config("txt"), LogFormat::Text);
        assert_eq!(LogFormat::from_config("JSON"), LogFormat::Text);
        assert_eq!(LogFormat::from_config(""), LogFormat::Text);
    }

    #[test]
    fn debug_toggle_sets_level() {
        assert_eq!(level(true), tracing::Level::DEBUG);
        assert_eq!(level(false), tracing::Level::INFO);
    }
}
