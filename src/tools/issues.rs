//! Issue workflow tools

use super::{parse_params, segment, Tool, ToolOutput};
use crate::context::{ContextOptions, ToolContext};
use crate::{BridgeError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Fields accepted by tools addressing a single issue
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueKeyParams {
    pub issue_key: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TransitionsResponse {
    #[serde(default)]
    transitions: Vec<Transition>,
}

#[derive(Debug, Clone, Deserialize)]
struct Transition {
    id: String,
    name: String,
    to: TransitionTarget,
}

#[derive(Debug, Clone, Deserialize)]
struct TransitionTarget {
    name: String,
    #[serde(rename = "statusCategory", default)]
    status_category: Option<StatusCategory>,
}

#[derive(Debug, Clone, Deserialize)]
struct StatusCategory {
    name: String,
}

pub struct GetTransitionsTool;

#[async_trait]
impl Tool for GetTransitionsTool {
    fn name(&self) -> &'static str {
        "get_transitions"
    }

    fn description(&self) -> &'static str {
        "List the workflow transitions available for an issue"
    }

    fn options(&self) -> ContextOptions {
        ContextOptions::from_issue_key()
    }

    async fn execute(&self, fields: Map<String, Value>, ctx: ToolContext) -> Result<ToolOutput> {
        let params: IssueKeyParams = parse_params(self.name(), fields)?;
        let key = params.issue_key.trim();
        if key.is_empty() {
            return Err(BridgeError::InvalidArguments(
                "get_transitions: issueKey must not be empty".to_string(),
            ));
        }

        debug!(issue = %key, instance = %ctx.instance_name, "Fetching transitions");

        let path = format!("issue/{}/transitions", segment(key));
        let response = ctx.api.get(&path).await;
        let result: TransitionsResponse = match response.and_then(|r| r.json()) {
            Ok(r) => r,
            Err(e) => return ToolOutput::from_upstream("get transitions", &ctx, e),
        };

        if result.transitions.is_empty() {
            return Ok(ToolOutput::success(format!(
                "No transitions available for {}",
                key
            )));
        }

        let mut text = format!("Available transitions for {}:\n", key);
        for t in &result.transitions {
            match t.to.status_category {
                Some(ref category) => text.push_str(&format!(
                    "- {} (id {}) → {} [{}]\n",
                    t.name, t.id, t.to.name, category.name
                )),
                None => text.push_str(&format!("- {} (id {}) → {}\n", t.name, t.id, t.to.name)),
            }
        }

        Ok(ToolOutput::success(text))
    }
}
