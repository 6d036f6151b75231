//! tracing subscriber setup for the binary
//!
//! `RUST_LOG` takes the usual `EnvFilter` directives, e.g.
//! `RUST_LOG=padbridge::mapping=debug` for per-key dispatch lines.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub const DEFAULT_FILTER: &str = "info";

/// Filter from `directives`, or [`DEFAULT_FILTER`] when unset or blank
pub fn filter_from(directives: Option<&str>) -> EnvFilter {
    match directives.map(str::trim) {
        Some(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(DEFAULT_FILTER),
    }
}

/// Installs the global pretty subscriber, filtered by `RUST_LOG`
pub fn init() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    FmtSubscriber::builder()
        .with_env_filter(filter_from(directives.as_deref()))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
