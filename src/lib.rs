//! # statuswatch
//!
//! Prometheus exporter for third-party status pages.
//!
//! The binary loads [`config::Settings`], builds one source per configured
//! page with [`statuswatch_adapters::build_sources`], refreshes them in the
//! background and serves the cached results on `/metrics`.

pub mod config;
pub mod logging;

pub use config::Settings;
