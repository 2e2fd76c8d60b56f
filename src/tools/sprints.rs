//! Sprint tools (Agile API)

use super::{check_issue_keys, parse_params, Tool, ToolOutput};
use crate::context::{ContextOptions, ToolContext};
use crate::{BridgeError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

/// Sprint lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SprintState {
    Future,
    Active,
    Closed,
}

/// Partial sprint update; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SprintState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl SprintPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    pub fn state(mut self, state: SprintState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn start_date(mut self, date: impl Into<String>) -> Self {
        self.start_date = Some(date.into());
        self
    }

    pub fn end_date(mut self, date: impl Into<String>) -> Self {
        self.end_date = Some(date.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.goal.is_none()
            && self.state.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    /// Reject empty patches and malformed dates
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(BridgeError::InvalidArguments(
                "update_sprint: at least one of name, goal, state, startDate, endDate is required"
                    .to_string(),
            ));
        }
        for (field, value) in [("startDate", &self.start_date), ("endDate", &self.end_date)] {
            if let Some(date) = value {
                if !is_jira_date(date) {
                    return Err(BridgeError::InvalidArguments(format!(
                        "update_sprint: {} must be an RFC 3339 timestamp or YYYY-MM-DD, got '{}'",
                        field, date
                    )));
                }
            }
        }
        Ok(())
    }

    /// Names of the fields this patch sets
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.name.is_some() {
            names.push("name");
        }
        if self.goal.is_some() {
            names.push("goal");
        }
        if self.state.is_some() {
            names.push("state");
        }
        if self.start_date.is_some() {
            names.push("startDate");
        }
        if self.end_date.is_some() {
            names.push("endDate");
        }
        names
    }
}

fn is_jira_date(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// Fields accepted by `update_sprint`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSprintParams {
    pub sprint_id: u64,
    #[serde(flatten)]
    pub patch: SprintPatch,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveToSprintParams {
    sprint_id: u64,
    issue_keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SprintSummary {
    id: u64,
    name: String,
    #[serde(default)]
    state: Option<String>,
}

pub struct MoveIssuesToSprintTool;

#[async_trait]
impl Tool for MoveIssuesToSprintTool {
    fn name(&self) -> &'static str {
        "move_issues_to_sprint"
    }

    fn description(&self) -> &'static str {
        "Move issues into a sprint"
    }

    fn options(&self) -> ContextOptions {
        ContextOptions::from_issue_key()
    }

    fn check(&self, fields: &Map<String, Value>) -> Result<()> {
        let params: MoveToSprintParams = parse_params(self.name(), fields.clone())?;
        check_issue_keys(self.name(), &params.issue_keys)
    }

    async fn execute(&self, fields: Map<String, Value>, ctx: ToolContext) -> Result<ToolOutput> {
        let params: MoveToSprintParams = parse_params(self.name(), fields)?;
        check_issue_keys(self.name(), &params.issue_keys)?;
        let issues: Vec<&str> = params.issue_keys.iter().map(|k| k.trim()).collect();

        info!(
            sprint_id = params.sprint_id,
            count = issues.len(),
            instance = %ctx.instance_name,
            "Moving issues to sprint"
        );

        let path = format!("sprint/{}/issue", params.sprint_id);
        let body = json!({ "issues": issues });
        if let Err(e) = ctx.agile.post(&path, &body).await.and_then(|r| r.into_result()) {
            return ToolOutput::from_upstream("move issues to sprint", &ctx, e);
        }

        Ok(ToolOutput::success(format!(
            "Moved {} issue(s) to sprint {}: {}",
            issues.len(),
            params.sprint_id,
            issues.join(", ")
        )))
    }
}

pub struct UpdateSprintTool;

#[async_trait]
impl Tool for UpdateSprintTool {
    fn name(&self) -> &'static str {
        "update_sprint"
    }

    fn description(&self) -> &'static str {
        "Update a sprint's name, goal, state or dates"
    }

    fn options(&self) -> ContextOptions {
        ContextOptions::project_optional()
    }

    async fn execute(&self, fields: Map<String, Value>, ctx: ToolContext) -> Result<ToolOutput> {
        let params: UpdateSprintParams = parse_params(self.name(), fields)?;
        params.patch.validate()?;

        info!(
            sprint_id = params.sprint_id,
            fields = ?params.patch.field_names(),
            instance = %ctx.instance_name,
            "Updating sprint"
        );

        // POST on the sprint resource is a partial update
        let path = format!("sprint/{}", params.sprint_id);
        let sprint: SprintSummary = match ctx
            .agile
            .post(&path, &params.patch)
            .await
            .and_then(|r| r.json())
        {
            Ok(s) => s,
            Err(e) => return ToolOutput::from_upstream("update sprint", &ctx, e),
        };

        let mut text = format!(
            "Updated sprint '{}' (id {}): {}",
            sprint.name,
            sprint.id,
            params.patch.field_names().join(", ")
        );
        if let Some(state) = sprint.state {
            text.push_str(&format!("\nState: {}", state));
        }
        Ok(ToolOutput::success(text))
    }
}
