//! Build script for embedding git and build metadata at compile time.
//!
//! Sets `cargo:rustc-env` variables consumed by `build_info` via `env!()`.
//! Falls back to `"unknown"` when git is unavailable (e.g. Docker builds
//! without `.git`).

use std::process::Command;

/// Try an override env var first (for Docker builds), then fall back to the command.
fn command_or_env(env_key: &str, program: &str, args: &[&str]) -> String {
    std::env::var(env_key)
        .ok()
        .filter(|s| !s.is_empty() && s != "unknown")
        .unwrap_or_else(|| {
            Command::new(program)
                .args(args)
                .output()
                .ok()
                .filter(|o| o.status.success())
                .and_then(|o| String::from_utf8(o.stdout).ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "unknown".into())
        })
}

fn main() {
    // Re-run when HEAD changes (branch switch, new commit)
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");

    println!(
        "cargo:rustc-env=EXPORTER_GIT_HASH={}",
        command_or_env("EXPORTER_GIT_HASH_OVERRIDE", "git", &["rev-parse", "HEAD"])
    );
    println!(
        "cargo:rustc-env=EXPORTER_BUILD_TIME={}",
        command_or_env(
            "EXPORTER_BUILD_TIME_OVERRIDE",
            "date",
            &["-u", "+%Y-%m-%dT%H:%M:%SZ"]
        )
    );

    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".into());
    println!(
        "cargo:rustc-env=EXPORTER_RUSTC_VERSION={}",
        command_or_env("EXPORTER_RUSTC_VERSION_OVERRIDE", &rustc, &["--version"])
    );

    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown".into());
    println!("cargo:rustc-env=EXPORTER_TARGET={target}");
}
