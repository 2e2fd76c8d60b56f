//! Instance resolution
//!
//! Picks exactly one Jira instance for a tool call. Precedence, first match
//! wins:
//!
//! 1. Explicit instance name
//! 2. Project key mapped under `projects`
//! 3. `defaultInstance`
//! 4. The only configured instance
//!
//! Anything else is ambiguous. Resolution is a pure lookup over the
//! configuration it is handed; it never mutates or caches it.

use crate::config::{InstanceConfig, MultiInstanceConfig};
use crate::error::ResolutionError;
use crate::{BridgeError, Result};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Separator between project key and issue number (`MIG-123`)
const ISSUE_KEY_SEPARATOR: char = '-';

/// Tool fields that may carry an issue-style key, in lookup order
const ISSUE_KEY_FIELDS: &[&str] = &["issueKey", "epicKey", "parentKey"];

/// Tool field carrying a list of issue keys
const ISSUE_KEYS_FIELD: &str = "issueKeys";

/// Which precedence rule selected the instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Explicit,
    ProjectMapping,
    Default,
    SingleInstance,
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResolutionSource::Explicit => "explicit instance",
            ResolutionSource::ProjectMapping => "project mapping",
            ResolutionSource::Default => "default instance",
            ResolutionSource::SingleInstance => "only configured instance",
        };
        write!(f, "{}", s)
    }
}

/// Instance chosen for a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstance {
    pub name: String,
    pub config: InstanceConfig,
    pub source: ResolutionSource,
}

/// Load the configuration for `working_dir` and resolve an instance
pub fn resolve(
    working_dir: impl AsRef<Path>,
    project_key: Option<&str>,
    explicit_instance: Option<&str>,
) -> Result<ResolvedInstance> {
    let config = MultiInstanceConfig::load_for_dir(working_dir)?;
    resolve_instance(&config, project_key, explicit_instance)
}

/// Resolve an instance from an already-loaded configuration
pub fn resolve_instance(
    config: &MultiInstanceConfig,
    project_key: Option<&str>,
    explicit_instance: Option<&str>,
) -> Result<ResolvedInstance> {
    if config.instances.is_empty() {
        return Err(BridgeError::Configuration(format!(
            "No Jira instances defined in {}",
            config.source
        )));
    }

    if let Some(name) = explicit_instance {
        return match config.get_instance(name) {
            Some(instance) => Ok(resolved(name, instance, ResolutionSource::Explicit)),
            None => Err(ResolutionError::UnknownInstance {
                name: name.to_string(),
                available: config.instance_names(),
            }
            .into()),
        };
    }

    if let Some(key) = project_key {
        if let Some(name) = config.instance_for_project(key) {
            let instance = config.get_instance(name).ok_or_else(|| {
                BridgeError::Configuration(format!(
                    "Project '{}' is mapped to unknown instance '{}'",
                    key, name
                ))
            })?;
            return Ok(resolved(name, instance, ResolutionSource::ProjectMapping));
        }
        debug!(project_key = %key, "No project mapping, falling back");
    }

    if let Some(ref name) = config.default_instance {
        let instance = config.get_instance(name).ok_or_else(|| {
            BridgeError::Configuration(format!(
                "defaultInstance '{}' does not match any configured instance",
                name
            ))
        })?;
        return Ok(resolved(name, instance, ResolutionSource::Default));
    }

    if config.instances.len() == 1 {
        if let Some((name, instance)) = config.instances.iter().next() {
            return Ok(resolved(name, instance, ResolutionSource::SingleInstance));
        }
    }

    Err(ResolutionError::Ambiguous {
        available: config.instance_names(),
    }
    .into())
}

fn resolved(name: &str, instance: &InstanceConfig, source: ResolutionSource) -> ResolvedInstance {
    debug!(instance = %name, source = %source, "Resolved Jira instance");
    ResolvedInstance {
        name: name.to_string(),
        config: instance.clone(),
        source,
    }
}

/// Project key prefix of an issue key (`MIG-123` → `MIG`)
///
/// Purely syntactic; returns `None` when there is no separator or the
/// prefix is empty.
pub fn project_key_from_issue_key(issue_key: &str) -> Option<String> {
    let (prefix, _) = issue_key.trim().split_once(ISSUE_KEY_SEPARATOR)?;
    let prefix = prefix.trim();
    if prefix.is_empty() {
        None
    } else {
        Some(prefix.to_string())
    }
}

/// Derive a project key from whichever issue-style key the tool fields carry
pub fn project_key_from_fields(fields: &Map<String, Value>) -> Option<String> {
    let single = ISSUE_KEY_FIELDS
        .iter()
        .filter_map(|field| fields.get(*field).and_then(Value::as_str))
        .find_map(project_key_from_issue_key);
    if single.is_some() {
        return single;
    }

    fields
        .get(ISSUE_KEYS_FIELD)
        .and_then(Value::as_array)
        .and_then(|keys| keys.first())
        .and_then(Value::as_str)
        .and_then(project_key_from_issue_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TOKEN: &str = "ATATT3xFfGF0abcdefghijklmnop";

    fn instance(domain: &str) -> InstanceConfig {
        InstanceConfig::new(domain, format!("dev@{domain}.com"), TOKEN)
    }

    fn two_instances() -> MultiInstanceConfig {
        MultiInstanceConfig::new()
            .with_instance("a", instance("alpha"))
            .with_instance("b", instance("beta"))
    }

    #[test]
    fn test_project_mapping_beats_default() {
        let config = two_instances().with_default("a").with_project("PRJ", "b");

        let by_project = resolve_instance(&config, Some("PRJ"), None).unwrap();
        assert_eq!(by_project.name, "b");
        assert_eq!(by_project.source, ResolutionSource::ProjectMapping);

        let by_default = resolve_instance(&config, None, None).unwrap();
        assert_eq!(by_default.name, "a");
        assert_eq!(by_default.source, ResolutionSource::Default);

        let unmapped = resolve_instance(&config, Some("OTHER"), None).unwrap();
        assert_eq!(unmapped.name, "a");
    }

    #[test]
    fn test_explicit_wins() {
        let config = two_instances().with_default("a").with_project("PRJ", "b");

        let same = resolve_instance(&config, Some("PRJ"), Some("b")).unwrap();
        assert_eq!(same.name, "b");
        assert_eq!(same.source, ResolutionSource::Explicit);

        // Explicit also wins when it disagrees with the project mapping
        let disagree = resolve_instance(&config, Some("PRJ"), Some("a")).unwrap();
        assert_eq!(disagree.name, "a");
        assert_eq!(disagree.config.domain, "alpha");
    }

    #[test]
    fn test_unknown_explicit_instance() {
        let config = two_instances();
        let err = resolve_instance(&config, None, Some("ghost")).unwrap_err();
        match err {
            BridgeError::Resolution(ResolutionError::UnknownInstance { name, available }) => {
                assert_eq!(name, "ghost");
                assert_eq!(available, vec!["a", "b"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ambiguous_without_default() {
        let config = two_instances();
        let err = resolve_instance(&config, None, None).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Resolution(ResolutionError::Ambiguous { .. })
        ));

        let err = resolve_instance(&config, Some("UNMAPPED"), None).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Resolution(ResolutionError::Ambiguous { .. })
        ));
    }

    #[test]
    fn test_single_instance_convenience() {
        let config = MultiInstanceConfig::new().with_instance("acme", instance("acme"));
        let resolved = resolve_instance(&config, None, None).unwrap();
        assert_eq!(resolved.name, "acme");
        assert_eq!(resolved.source, ResolutionSource::SingleInstance);
    }

    #[test]
    fn test_zero_instances_is_configuration_error() {
        let config = MultiInstanceConfig::new().with_default("a");
        for explicit in [None, Some("a")] {
            let err = resolve_instance(&config, Some("PRJ"), explicit).unwrap_err();
            assert!(matches!(err, BridgeError::Configuration(_)));
        }
    }

    #[test]
    fn test_dangling_references_are_configuration_errors() {
        let config = two_instances().with_project("PRJ", "gone");
        let err = resolve_instance(&config, Some("PRJ"), None).unwrap_err();
        assert!(matches!(err, BridgeError::Configuration(msg) if msg.contains("'gone'")));

        let config = two_instances().with_default("gone");
        let err = resolve_instance(&config, None, None).unwrap_err();
        assert!(matches!(err, BridgeError::Configuration(_)));
    }

    #[test]
    fn test_resolution_does_not_mutate_config() {
        let config = two_instances().with_default("a");
        let before = config.clone();
        let _ = resolve_instance(&config, Some("X"), None);
        let _ = resolve_instance(&config, None, Some("nope"));
        assert_eq!(config, before);
    }

    #[test]
    fn test_project_key_from_issue_key() {
        assert_eq!(project_key_from_issue_key("MIG-123").as_deref(), Some("MIG"));
        assert_eq!(
            project_key_from_issue_key(" DATA2-7-x ").as_deref(),
            Some("DATA2")
        );
        assert_eq!(project_key_from_issue_key("MIG"), None);
        assert_eq!(project_key_from_issue_key("-12"), None);
        assert_eq!(project_key_from_issue_key(""), None);
    }

    #[test]
    fn test_project_key_from_fields() {
        let fields = json!({ "issueKey": "MIG-123" });
        assert_eq!(
            project_key_from_fields(fields.as_object().unwrap()).as_deref(),
            Some("MIG")
        );

        let fields = json!({ "epicKey": "OPS-1", "issueKeys": ["MIG-1"] });
        assert_eq!(
            project_key_from_fields(fields.as_object().unwrap()).as_deref(),
            Some("OPS")
        );

        let fields = json!({ "issueKeys": ["WEB-9", "MIG-2"], "sprintId": 4 });
        assert_eq!(
            project_key_from_fields(fields.as_object().unwrap()).as_deref(),
            Some("WEB")
        );

        let fields = json!({ "sprintId": 4, "issueKeys": [] });
        assert_eq!(project_key_from_fields(fields.as_object().unwrap()), None);
    }
}
