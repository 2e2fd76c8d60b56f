//! Tool context builder
//!
//! [`with_context`] is the single entry point tool handlers go through. It
//! turns raw tool arguments into a [`ToolContext`] by resolving the Jira
//! instance, validating its credentials, and building the API clients, then
//! runs the tool's logic with it. Every call re-reads configuration; nothing
//! is cached between calls.

use crate::client::{build_clients, ApiClients, JiraClient};
use crate::config::{
    format_validation_results, validate_instance_config_with, InstanceConfig, MultiInstanceConfig,
};
use crate::error::ResolutionError;
use crate::resolver::{project_key_from_fields, resolve_instance};
use crate::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::path::PathBuf;
use tracing::{info, warn};

/// Raw arguments of a tool invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolArgs {
    /// Directory whose configuration applies
    pub working_dir: PathBuf,

    /// Explicit instance name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Explicit project key
    #[serde(
        default,
        rename = "projectKey",
        skip_serializing_if = "Option::is_none"
    )]
    pub project_key: Option<String>,

    /// Tool-specific fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ToolArgs {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn with_project_key(mut self, key: impl Into<String>) -> Self {
        self.project_key = Some(key.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// How a tool wants its context resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextOptions {
    /// Fail before running the tool when no project key can be determined
    pub requires_project: bool,

    /// Derive the project key from an issue/epic key in the tool fields
    pub extract_project_from_issue_key: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            requires_project: true,
            extract_project_from_issue_key: false,
        }
    }
}

impl ContextOptions {
    /// Tools addressing existing issues by key
    pub fn from_issue_key() -> Self {
        Self {
            requires_project: true,
            extract_project_from_issue_key: true,
        }
    }

    /// Tools that can run without any project key
    pub fn project_optional() -> Self {
        Self {
            requires_project: false,
            extract_project_from_issue_key: false,
        }
    }
}

/// Everything a tool needs to talk to one Jira instance
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Platform REST API client
    pub api: JiraClient,
    /// Agile REST API client
    pub agile: JiraClient,
    /// Project key used for resolution (possibly derived)
    pub project_key: Option<String>,
    pub instance_name: String,
    pub instance_config: InstanceConfig,
}

impl ToolContext {
    /// Assemble a context from parts (custom transports, tests)
    pub fn new(
        clients: ApiClients,
        instance_name: impl Into<String>,
        instance_config: InstanceConfig,
        project_key: Option<String>,
    ) -> Self {
        Self {
            api: clients.api,
            agile: clients.agile,
            project_key,
            instance_name: instance_name.into(),
            instance_config,
        }
    }

    /// Site hostname, for messages
    pub fn host(&self) -> String {
        self.instance_config.host()
    }
}

/// Resolve a context from the working directory's configuration and run
/// `inner` with it
pub async fn with_context<T, F, Fut>(args: ToolArgs, options: ContextOptions, inner: F) -> Result<T>
where
    F: FnOnce(Map<String, Value>, ToolContext) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let config = MultiInstanceConfig::load_for_dir(&args.working_dir)?;
    with_config(&config, args, options, inner).await
}

/// Same as [`with_context`] against an already-loaded configuration
pub async fn with_config<T, F, Fut>(
    config: &MultiInstanceConfig,
    args: ToolArgs,
    options: ContextOptions,
    inner: F,
) -> Result<T>
where
    F: FnOnce(Map<String, Value>, ToolContext) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let (fields, context) = build_context(config, args, options)?;
    inner(fields, context).await
}

/// Run resolution, validation and client construction
pub fn build_context(
    config: &MultiInstanceConfig,
    args: ToolArgs,
    options: ContextOptions,
) -> Result<(Map<String, Value>, ToolContext)> {
    let ToolArgs {
        instance,
        project_key,
        fields,
        ..
    } = args;

    let project_key = effective_project_key(project_key, &fields, options);
    if options.requires_project && project_key.is_none() {
        return Err(ResolutionError::ProjectRequired.into());
    }

    let resolved = resolve_instance(config, project_key.as_deref(), instance.as_deref())?;

    let validation =
        validate_instance_config_with(&resolved.name, &resolved.config, &config.validation_policy());
    if !validation.is_valid {
        return Err(BridgeError::Credential {
            instance: resolved.name.clone(),
            report: format_validation_results(
                &validation,
                &format!("Jira instance '{}'", resolved.name),
            ),
        });
    }
    for warning in &validation.warnings {
        warn!(instance = %resolved.name, "{}", warning);
    }

    let clients = build_clients(&resolved.config)?;

    info!(
        instance = %resolved.name,
        host = %resolved.config.host(),
        project_key = ?project_key,
        source = %resolved.source,
        "Tool context ready"
    );

    Ok((
        fields,
        ToolContext::new(clients, resolved.name, resolved.config, project_key),
    ))
}

fn effective_project_key(
    explicit: Option<String>,
    fields: &Map<String, Value>,
    options: ContextOptions,
) -> Option<String> {
    let explicit = explicit
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());
    if explicit.is_some() {
        return explicit;
    }
    if options.extract_project_from_issue_key {
        return project_key_from_fields(fields);
    }
    None
}
