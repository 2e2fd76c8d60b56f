//! Project component tools

use super::{parse_params, Tool, ToolOutput};
use crate::context::{ContextOptions, ToolContext};
use crate::{BridgeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

/// Fields accepted by `create_component`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComponentParams {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lead_account_id: Option<String>,
    /// PROJECT_DEFAULT, COMPONENT_LEAD, PROJECT_LEAD or UNASSIGNED
    #[serde(default)]
    pub assignee_type: Option<String>,
}

/// Request body for `POST /component`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComponentRequest<'a> {
    project: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lead_account_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_type: Option<&'a str>,
}

/// Component as returned by Jira
#[derive(Debug, Clone, Deserialize)]
pub struct JiraComponent {
    pub id: String,
    pub name: String,
}

const ASSIGNEE_TYPES: &[&str] = &[
    "PROJECT_DEFAULT",
    "COMPONENT_LEAD",
    "PROJECT_LEAD",
    "UNASSIGNED",
];

pub struct CreateComponentTool;

#[async_trait]
impl Tool for CreateComponentTool {
    fn name(&self) -> &'static str {
        "create_component"
    }

    fn description(&self) -> &'static str {
        "Create a component in a Jira project"
    }

    fn options(&self) -> ContextOptions {
        ContextOptions::default()
    }

    async fn execute(&self, fields: Map<String, Value>, ctx: ToolContext) -> Result<ToolOutput> {
        let params: CreateComponentParams = parse_params(self.name(), fields)?;
        let name = params.name.trim();
        if name.is_empty() {
            return Err(BridgeError::InvalidArguments(
                "create_component: name must not be empty".to_string(),
            ));
        }
        if let Some(ref kind) = params.assignee_type {
            if !ASSIGNEE_TYPES.contains(&kind.as_str()) {
                return Err(BridgeError::InvalidArguments(format!(
                    "create_component: assigneeType must be one of {}",
                    ASSIGNEE_TYPES.join(", ")
                )));
            }
        }
        let project = ctx.project_key.as_deref().ok_or_else(|| {
            BridgeError::InvalidArguments("create_component: projectKey is required".to_string())
        })?;

        let request = ComponentRequest {
            project,
            name,
            description: params.description.as_deref(),
            lead_account_id: params.lead_account_id.as_deref(),
            assignee_type: params.assignee_type.as_deref(),
        };

        info!(project = %project, name = %name, instance = %ctx.instance_name, "Creating Jira component");

        let response = ctx.api.post("component", &request).await;
        let component: JiraComponent = match response.and_then(|r| r.json()) {
            Ok(c) => c,
            Err(e) => return ToolOutput::from_upstream("create component", &ctx, e),
        };

        Ok(ToolOutput::success(format!(
            "Created component '{}' (id {}) in project {} on {}",
            component.name,
            component.id,
            project,
            ctx.host()
        )))
    }
}
