//! Tool handlers
//!
//! Each tool is a thin request/response adapter: parse its fields, call one
//! or more Jira endpoints through the [`ToolContext`] it is handed, and
//! summarize the outcome as text. Instance resolution and credential checks
//! happen before a tool runs (see [`crate::context`]).
//!
//! # Built-in tools
//!
//! - **create_component**: create a project component
//! - **get_transitions**: list workflow transitions available to an issue
//! - **move_issues_to_sprint** / **move_issues_to_epic**: bulk moves via the Agile API
//! - **update_sprint** / **update_epic**: partial updates via the Agile API

mod components;
mod epics;
mod issues;
mod sprints;

pub use components::{CreateComponentParams, CreateComponentTool};
pub use epics::{EpicPatch, MoveIssuesToEpicTool, UpdateEpicParams, UpdateEpicTool};
pub use issues::{GetTransitionsTool, IssueKeyParams};
pub use sprints::{
    MoveIssuesToSprintTool, SprintPatch, SprintState, UpdateSprintParams, UpdateSprintTool,
};

use crate::context::{with_context, ContextOptions, ToolArgs, ToolContext};
use crate::{BridgeError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Most issues the Agile API accepts in one move request
pub const MAX_ISSUES_PER_MOVE: usize = 50;

/// Text result of a tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    /// The upstream call failed; `text` describes it
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    /// Describe a failed Jira call for the tool's caller
    ///
    /// Upstream failures become an error output; anything raised locally is
    /// propagated unchanged.
    pub fn from_upstream(action: &str, ctx: &ToolContext, err: BridgeError) -> Result<Self> {
        match err {
            BridgeError::Upstream { status, body } => Ok(Self::error(format!(
                "Failed to {} on {} (HTTP {}): {}",
                action,
                ctx.host(),
                status,
                describe_jira_errors(&body)
            ))),
            BridgeError::Http(e) => Ok(Self::error(format!(
                "Failed to {} on {}: {}",
                action,
                ctx.host(),
                e
            ))),
            other => Err(other),
        }
    }
}

/// A Jira operation exposed to tool-style clients
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// How the context for this tool is resolved
    fn options(&self) -> ContextOptions;

    /// Argument checks that do not need a resolved instance
    ///
    /// Runs before context resolution, so malformed calls are reported as
    /// such rather than as a missing project key.
    fn check(&self, _fields: &Map<String, Value>) -> Result<()> {
        Ok(())
    }

    /// Run against a resolved context
    async fn execute(&self, fields: Map<String, Value>, ctx: ToolContext) -> Result<ToolOutput>;
}

/// Tools addressable by name
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Registry with every built-in tool
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(CreateComponentTool));
        registry.register(Box::new(GetTransitionsTool));
        registry.register(Box::new(MoveIssuesToSprintTool));
        registry.register(Box::new(MoveIssuesToEpicTool));
        registry.register(Box::new(UpdateSprintTool));
        registry.register(Box::new(UpdateEpicTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.values().map(|t| t.as_ref())
    }

    /// Parse raw arguments and run a tool through [`with_context`]
    pub async fn invoke(&self, name: &str, raw_args: Value) -> Result<ToolOutput> {
        let tool = self
            .get(name)
            .ok_or_else(|| BridgeError::InvalidArguments(format!("Unknown tool: {}", name)))?;

        let args: ToolArgs = serde_json::from_value(raw_args)
            .map_err(|e| BridgeError::InvalidArguments(format!("{}: {}", name, e)))?;

        tool.check(&args.fields)?;

        tracing::debug!(tool = name, working_dir = %args.working_dir.display(), "Invoking tool");

        with_context(args, tool.options(), |fields, ctx| tool.execute(fields, ctx)).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_builtin_tools()
    }
}

/// Deserialize a tool's own parameters from its fields
pub(crate) fn parse_params<T: DeserializeOwned>(
    tool: &str,
    fields: Map<String, Value>,
) -> Result<T> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| BridgeError::InvalidArguments(format!("{}: {}", tool, e)))
}

/// Check a list of issue keys for a bulk move
pub(crate) fn check_issue_keys(tool: &str, keys: &[String]) -> Result<()> {
    if keys.is_empty() {
        return Err(BridgeError::InvalidArguments(format!(
            "{}: issueKeys must contain at least one issue key",
            tool
        )));
    }
    if keys.len() > MAX_ISSUES_PER_MOVE {
        return Err(BridgeError::InvalidArguments(format!(
            "{}: at most {} issues can be moved at once, got {}",
            tool,
            MAX_ISSUES_PER_MOVE,
            keys.len()
        )));
    }
    if let Some(blank) = keys.iter().position(|k| k.trim().is_empty()) {
        return Err(BridgeError::InvalidArguments(format!(
            "{}: issueKeys[{}] is empty",
            tool, blank
        )));
    }
    Ok(())
}

/// Encode a path segment (issue keys, ids)
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value.trim()).into_owned()
}

/// Flatten Jira's `errorMessages` / `errors` body into one line
pub fn describe_jira_errors(body: &Value) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(messages) = body.get("errorMessages").and_then(Value::as_array) {
        parts.extend(messages.iter().filter_map(Value::as_str).map(str::to_string));
    }
    if let Some(errors) = body.get("errors").and_then(Value::as_object) {
        parts.extend(
            errors
                .iter()
                .map(|(field, msg)| format!("{}: {}", field, msg.as_str().unwrap_or_default())),
        );
    }
    if let Some(message) = body.get("message").and_then(Value::as_str) {
        parts.push(message.to_string());
    }

    if !parts.is_empty() {
        return parts.join("; ");
    }

    match body {
        Value::Null => "no response body".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::build_clients;
    use crate::config::InstanceConfig;
    use serde_json::json;

    fn context() -> ToolContext {
        let config = InstanceConfig::new("acme", "dev@acme.com", "ATATT3xFfGF0abcdefghijklmnop");
        ToolContext::new(
            build_clients(&config).unwrap(),
            "acme",
            config,
            Some("MIG".to_string()),
        )
    }

    #[test]
    fn test_builtin_registry() {
        let registry = ToolRegistry::with_builtin_tools();
        assert_eq!(
            registry.names(),
            vec![
                "create_component",
                "get_transitions",
                "move_issues_to_epic",
                "move_issues_to_sprint",
                "update_epic",
                "update_sprint",
            ]
        );
        assert!(registry.get("update_sprint").is_some());
        assert!(registry.get("delete_everything").is_none());
        assert!(registry.iter().all(|t| !t.description().is_empty()));
    }

    #[test]
    fn test_tool_options() {
        let registry = ToolRegistry::default();
        let create = registry.get("create_component").unwrap().options();
        assert!(create.requires_project);
        assert!(!create.extract_project_from_issue_key);

        let transitions = registry.get("get_transitions").unwrap().options();
        assert!(transitions.extract_project_from_issue_key);

        let sprint = registry.get("update_sprint").unwrap().options();
        assert!(!sprint.requires_project);
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let registry = ToolRegistry::default();
        let err = registry
            .invoke("nope", json!({"working_dir": "/tmp"}))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArguments(msg) if msg.contains("nope")));
    }

    #[tokio::test]
    async fn test_invoke_requires_working_dir() {
        let registry = ToolRegistry::default();
        let err = registry
            .invoke("get_transitions", json!({"issueKey": "MIG-1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArguments(_)));
    }

    #[test]
    fn test_check_issue_keys() {
        assert!(check_issue_keys("t", &["MIG-1".to_string()]).is_ok());
        assert!(check_issue_keys("t", &[]).is_err());
        assert!(check_issue_keys("t", &["MIG-1".to_string(), " ".to_string()]).is_err());

        let many: Vec<String> = (0..=MAX_ISSUES_PER_MOVE).map(|i| format!("MIG-{i}")).collect();
        let err = check_issue_keys("t", &many).unwrap_err();
        assert!(err.to_string().contains("at most 50"));
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("MIG-123"), "MIG-123");
        assert_eq!(segment(" a/b "), "a%2Fb");
    }

    #[test]
    fn test_describe_jira_errors() {
        let body = json!({
            "errorMessages": ["Issue does not exist"],
            "errors": {"name": "A component with this name already exists"}
        });
        assert_eq!(
            describe_jira_errors(&body),
            "Issue does not exist; name: A component with this name already exists"
        );
        assert_eq!(describe_jira_errors(&Value::Null), "no response body");
        assert_eq!(describe_jira_errors(&json!("Bad Gateway")), "Bad Gateway");
    }

    #[test]
    fn test_from_upstream() {
        let ctx = context();
        let output = ToolOutput::from_upstream(
            "create component",
            &ctx,
            BridgeError::Upstream {
                status: 400,
                body: json!({"errorMessages": ["bad"]}),
            },
        )
        .unwrap();
        assert!(output.is_error);
        assert_eq!(
            output.text,
            "Failed to create component on acme.atlassian.net (HTTP 400): bad"
        );

        let local = ToolOutput::from_upstream(
            "x",
            &ctx,
            BridgeError::InvalidArguments("oops".to_string()),
        );
        assert!(local.is_err());
    }
}
