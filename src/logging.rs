//! Logging for the bridge
//!
//! Diagnostics go to stderr so stdout carries nothing but tool output.
//! `JIRA_BRIDGE_LOG` takes precedence over `RUST_LOG`; both accept
//! `tracing_subscriber` filter directives.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Bridge-specific filter variable, checked before `RUST_LOG`
pub const LOG_ENV: &str = "JIRA_BRIDGE_LOG";

/// Used when neither variable holds a valid directive
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Build the filter from the first usable directive
///
/// `directive` is usually the value of [`LOG_ENV`]; an absent, blank or
/// unparseable value falls through to `RUST_LOG`, then to
/// [`DEFAULT_DIRECTIVE`].
pub fn filter_from(directive: Option<&str>) -> EnvFilter {
    directive
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber
///
/// - `JIRA_BRIDGE_LOG=info` logs which instance each call resolved to
/// - `JIRA_BRIDGE_LOG=jira_bridge=debug` adds resolution steps and HTTP statuses
///
/// # Errors
/// Fails if a global subscriber is already installed
pub fn init() -> crate::Result<()> {
    let directive = std::env::var(LOG_ENV).ok();

    tracing_subscriber::registry()
        .with(filter_from(directive.as_deref()))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| crate::BridgeError::Other(format!("Failed to initialize tracing: {}", e)))?;

    Ok(())
}

/// For tests; ignores an already-installed subscriber
pub fn init_test() {
    let _ = init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_helper() {
        init_test();
        init_test();
    }

    #[test]
    fn test_second_init_reports_error() {
        init_test();
        assert!(init().is_err());
    }

    #[test]
    fn test_filter_uses_explicit_directive() {
        let filter = filter_from(Some("jira_bridge=debug"));
        assert_eq!(filter.to_string(), "jira_bridge=debug");
    }
}
