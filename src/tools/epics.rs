//! Epic tools (Agile API)

use super::{check_issue_keys, parse_params, segment, Tool, ToolOutput};
use crate::context::{ContextOptions, ToolContext};
use crate::{BridgeError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

/// Partial epic update; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpicPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Jira epic colour key, e.g. `color_4`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<EpicColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicColor {
    pub key: String,
}

impl EpicPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn color(mut self, key: impl Into<String>) -> Self {
        self.color = Some(EpicColor { key: key.into() });
        self
    }

    pub fn done(mut self, done: bool) -> Self {
        self.done = Some(done);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.summary.is_none() && self.color.is_none() && self.done.is_none()
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.name.is_some() {
            names.push("name");
        }
        if self.summary.is_some() {
            names.push("summary");
        }
        if self.color.is_some() {
            names.push("color");
        }
        if self.done.is_some() {
            names.push("done");
        }
        names
    }
}

/// Fields accepted by `update_epic`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEpicParams {
    pub epic_key: String,
    #[serde(flatten)]
    pub patch: EpicPatch,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveToEpicParams {
    epic_key: String,
    issue_keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct EpicSummary {
    key: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    done: Option<bool>,
}

fn require_epic_key(tool: &str, key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(BridgeError::InvalidArguments(format!(
            "{}: epicKey must not be empty",
            tool
        )));
    }
    Ok(())
}

pub struct MoveIssuesToEpicTool;

#[async_trait]
impl Tool for MoveIssuesToEpicTool {
    fn name(&self) -> &'static str {
        "move_issues_to_epic"
    }

    fn description(&self) -> &'static str {
        "Move issues into an epic"
    }

    fn options(&self) -> ContextOptions {
        ContextOptions::from_issue_key()
    }

    fn check(&self, fields: &Map<String, Value>) -> Result<()> {
        let params: MoveToEpicParams = parse_params(self.name(), fields.clone())?;
        require_epic_key(self.name(), &params.epic_key)?;
        check_issue_keys(self.name(), &params.issue_keys)
    }

    async fn execute(&self, fields: Map<String, Value>, ctx: ToolContext) -> Result<ToolOutput> {
        let params: MoveToEpicParams = parse_params(self.name(), fields)?;
        require_epic_key(self.name(), &params.epic_key)?;
        check_issue_keys(self.name(), &params.issue_keys)?;

        let epic = params.epic_key.trim();
        let issues: Vec<&str> = params.issue_keys.iter().map(|k| k.trim()).collect();

        info!(
            epic = %epic,
            count = issues.len(),
            instance = %ctx.instance_name,
            "Moving issues to epic"
        );

        let path = format!("epic/{}/issue", segment(epic));
        let body = json!({ "issues": issues });
        if let Err(e) = ctx.agile.post(&path, &body).await.and_then(|r| r.into_result()) {
            return ToolOutput::from_upstream("move issues to epic", &ctx, e);
        }

        Ok(ToolOutput::success(format!(
            "Moved {} issue(s) to epic {}: {}",
            issues.len(),
            epic,
            issues.join(", ")
        )))
    }
}

pub struct UpdateEpicTool;

#[async_trait]
impl Tool for UpdateEpicTool {
    fn name(&self) -> &'static str {
        "update_epic"
    }

    fn description(&self) -> &'static str {
        "Update an epic's name, summary, colour or done flag"
    }

    fn options(&self) -> ContextOptions {
        ContextOptions::from_issue_key()
    }

    async fn execute(&self, fields: Map<String, Value>, ctx: ToolContext) -> Result<ToolOutput> {
        let params: UpdateEpicParams = parse_params(self.name(), fields)?;
        require_epic_key(self.name(), &params.epic_key)?;
        if params.patch.is_empty() {
            return Err(BridgeError::InvalidArguments(
                "update_epic: at least one of name, summary, color, done is required".to_string(),
            ));
        }

        let key = params.epic_key.trim();
        info!(
            epic = %key,
            fields = ?params.patch.field_names(),
            instance = %ctx.instance_name,
            "Updating epic"
        );

        let path = format!("epic/{}", segment(key));
        let epic: EpicSummary = match ctx
            .agile
            .post(&path, &params.patch)
            .await
            .and_then(|r| r.json())
        {
            Ok(e) => e,
            Err(e) => return ToolOutput::from_upstream("update epic", &ctx, e),
        };

        let mut text = format!(
            "Updated epic {}: {}",
            epic.key,
            params.patch.field_names().join(", ")
        );
        if let Some(name) = epic.name {
            text.push_str(&format!("\nName: {}", name));
        }
        if let Some(done) = epic.done {
            text.push_str(&format!("\nDone: {}", done));
        }
        Ok(ToolOutput::success(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epic_patch_serialization() {
        let patch = EpicPatch::default().color("color_4").done(true);
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"color": {"key": "color_4"}, "done": true})
        );
        assert_eq!(patch.field_names(), vec!["color", "done"]);
        assert!(EpicPatch::default().is_empty());
    }

    #[test]
    fn test_update_epic_params() {
        let params: UpdateEpicParams = serde_json::from_value(json!({
            "epicKey": "MIG-7",
            "summary": "Migration cleanup"
        }))
        .unwrap();
        assert_eq!(params.epic_key, "MIG-7");
        assert_eq!(params.patch, EpicPatch::default().summary("Migration cleanup"));
    }
}
