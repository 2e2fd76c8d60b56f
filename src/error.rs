//! Error types for jira-bridge
//!
//! Defines a single error enum covering every failure mode of the bridge:
//! configuration defects, rejected credentials, ambiguous instance resolution,
//! and upstream Jira failures. Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for jira-bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Comprehensive error type for jira-bridge operations
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Structural defects in the configuration document
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A resolved instance failed credential validation
    #[error("Invalid credentials for Jira instance '{instance}':\n{report}")]
    Credential { instance: String, report: String },

    /// No single instance could be selected for the call
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Non-2xx response from the Jira APIs
    #[error("Jira API error: HTTP {status}: {body}")]
    Upstream {
        status: u16,
        body: serde_json::Value,
    },

    /// Tool arguments that cannot be used as given
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// HTTP transport errors (connection refused, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

/// Reasons instance resolution can fail
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error(
        "Jira instance '{name}' not found. Available instances: {}",
        .available.join(", ")
    )]
    UnknownInstance {
        name: String,
        available: Vec<String>,
    },

    #[error(
        "Multiple Jira instances are configured ({}) and none could be selected. \
         Pass `instance` to pick one explicitly, pass a `projectKey` mapped under `projects`, \
         or set `defaultInstance` in the configuration.",
        .available.join(", ")
    )]
    Ambiguous { available: Vec<String> },

    #[error(
        "A project key is required for this tool. Pass `projectKey` (e.g. \"MIG\") \
         or an issue key such as \"MIG-123\" so the Jira instance can be determined."
    )]
    ProjectRequired,
}

impl BridgeError {
    /// HTTP status of an upstream failure, if this is one
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            BridgeError::Upstream { status, .. } => Some(*status),
            BridgeError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_messages_name_missing_arguments() {
        let ambiguous = ResolutionError::Ambiguous {
            available: vec!["a".to_string(), "b".to_string()],
        };
        let msg = ambiguous.to_string();
        assert!(msg.contains("a, b"));
        assert!(msg.contains("`instance`"));
        assert!(msg.contains("`projectKey`"));

        let required = ResolutionError::ProjectRequired.to_string();
        assert!(required.contains("projectKey"));
    }

    #[test]
    fn test_unknown_instance_lists_available() {
        let err: BridgeError = ResolutionError::UnknownInstance {
            name: "ghost".to_string(),
            available: vec!["acme".to_string()],
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Jira instance 'ghost' not found. Available instances: acme"
        );
    }

    #[test]
    fn test_upstream_status() {
        let err = BridgeError::Upstream {
            status: 404,
            body: serde_json::json!({"errorMessages": ["Issue does not exist"]}),
        };
        assert_eq!(err.upstream_status(), Some(404));
        assert!(err.to_string().contains("HTTP 404"));

        let config = BridgeError::Configuration("missing".to_string());
        assert_eq!(config.upstream_status(), None);
    }
}
