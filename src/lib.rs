//! Prometheus exporter for Redis and Tile38.
//!
//! Reads its settings from environment variables, validates them, registers
//! a collector for the configured instance, and exposes the registry over
//! HTTP. In parallel it periodically pushes the same registry to a
//! Prometheus push gateway.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, check).
//! - [`config`] -- Environment resolution, duration parsing and validation.
//! - [`tls`] -- Client certificate loading and rustls client configuration.
//! - [`registry`] -- Registry selection and text exposition encoding.
//! - [`collector`] -- Collector options, the [`CollectorFactory`](collector::CollectorFactory)
//!   seam and the default reachability collector.
//! - [`publisher`] -- Periodic push gateway publication.
//! - [`server`] -- Axum server setup, shared state, listener binding and
//!   graceful shutdown.
//! - [`health`] -- `GET /health` endpoint handler.
//! - [`logging`] -- Structured tracing setup with JSON and text output.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`build_info`] -- Version and build metadata captured at compile time.

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod build_info;
pub mod cli;
pub mod cmd;
pub mod collector;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod publisher;
pub mod registry;
pub mod server;
pub mod tls;
