//! Tracing subscriber setup.
//!
//! Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
//! wins over the configured level when it is set.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LogFormat;

/// Pick the filter directive: a non-empty `RUST_LOG`, else `level`.
pub fn filter_directive(rust_log: Option<String>, level: &str) -> String {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| level.to_string())
}

pub fn build_filter(level: &str) -> Result<EnvFilter> {
    let directive = filter_directive(std::env::var(EnvFilter::DEFAULT_ENV).ok(), level);
    EnvFilter::try_new(&directive).with_context(|| format!("Invalid log filter '{}'", directive))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(level: &str, format: LogFormat) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(level)?);

    let installed = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    installed.context("Failed to install tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_wins() {
        assert_eq!(
            filter_directive(Some("stratflow=trace".to_string()), "info"),
            "stratflow=trace"
        );
    }

    #[test]
    fn test_configured_level_when_rust_log_unset_or_blank() {
        assert_eq!(filter_directive(None, "warn"), "warn");
        assert_eq!(filter_directive(Some("  ".to_string()), "debug"), "debug");
    }

    #[test]
    fn test_filter_accepts_directives() {
        assert!(EnvFilter::try_new("stratflow=debug,reqwest=warn").is_ok());
    }
}
