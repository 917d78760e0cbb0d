//! Build metadata embedded by `build.rs`.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT_SHA: &str = env!("EXPORTER_GIT_HASH");
pub const BUILD_DATE: &str = env!("EXPORTER_BUILD_TIME");
pub const RUSTC_VERSION: &str = env!("EXPORTER_RUSTC_VERSION");
pub const TARGET: &str = env!("EXPORTER_TARGET");
