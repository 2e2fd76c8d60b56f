//! Multi-instance configuration file handling
//!
//! Loads the `.jira-config.json` file for a working directory. Each named
//! instance carries the credentials for one Jira Cloud site; the `projects`
//! block maps project keys to instance names.

use crate::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = ".jira-config.json";

/// Public suffix of Jira Cloud sites
pub const CLOUD_SUFFIX: &str = ".atlassian.net";

/// Instance name used for the environment-variable fallback
pub const ENV_INSTANCE_NAME: &str = "default";

pub const ENV_DOMAIN: &str = "JIRA_DOMAIN";
pub const ENV_EMAIL: &str = "JIRA_EMAIL";
pub const ENV_API_TOKEN: &str = "JIRA_API_TOKEN";

/// Credentials for one Jira tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceConfig {
    /// Site subdomain (`acme` for `acme.atlassian.net`)
    #[serde(default)]
    pub domain: String,

    /// Account email used for basic auth
    #[serde(default)]
    pub email: String,

    /// API token used for basic auth
    #[serde(default)]
    pub api_token: String,
}

impl InstanceConfig {
    pub fn new(
        domain: impl Into<String>,
        email: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            email: email.into(),
            api_token: api_token.into(),
        }
    }

    /// Hostname of the site.
    ///
    /// Tolerates a scheme, trailing slashes, and an already-present cloud
    /// suffix in `domain`; validation still warns about the latter. A bare
    /// `atlassian.net` is kept as is rather than doubled.
    pub fn host(&self) -> String {
        let mut host = self.domain.trim();
        for scheme in ["https://", "http://"] {
            if let Some(rest) = host.strip_prefix(scheme) {
                host = rest;
            }
        }
        let host = host.trim_end_matches('/');

        let bare_suffix = CLOUD_SUFFIX.trim_start_matches('.');
        if host.eq_ignore_ascii_case(bare_suffix) {
            return bare_suffix.to_string();
        }

        let split = host.len().saturating_sub(CLOUD_SUFFIX.len());
        let subdomain = match host.get(split..) {
            Some(tail) if tail.eq_ignore_ascii_case(CLOUD_SUFFIX) => &host[..split],
            _ => host,
        };

        format!("{}{}", subdomain, CLOUD_SUFFIX)
    }

    /// Site root, e.g. `https://acme.atlassian.net`
    pub fn site_url(&self) -> String {
        format!("https://{}", self.host())
    }
}

/// Project → instance mapping entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMapping {
    pub instance: String,
}

/// Tunables for credential validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationPolicy {
    /// Tokens shorter than this only produce a warning
    #[serde(default = "default_min_token_length")]
    pub min_token_length: usize,
}

fn default_min_token_length() -> usize {
    20
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_token_length: default_min_token_length(),
        }
    }
}

/// Where a configuration was loaded from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built in memory (tests, `sample()`)
    #[default]
    Inline,
    /// Read from a configuration file
    File(PathBuf),
    /// Assembled from `JIRA_*` environment variables
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Inline => write!(f, "inline"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Environment => {
                write!(f, "environment ({}, {}, {})", ENV_DOMAIN, ENV_EMAIL, ENV_API_TOKEN)
            }
        }
    }
}

/// Root configuration for a working directory
///
/// Ordered maps keep iteration (and every message derived from it)
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiInstanceConfig {
    /// Named Jira instances
    #[serde(default)]
    pub instances: BTreeMap<String, InstanceConfig>,

    /// Instance used when nothing more specific applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_instance: Option<String>,

    /// Project key → instance mapping
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub projects: BTreeMap<String, ProjectMapping>,

    /// Validation heuristics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationPolicy>,

    #[serde(skip)]
    pub source: ConfigSource,
}

/// Layers consulted when the working directory has no config file
#[derive(Debug, Clone)]
pub struct ConfigSources {
    /// Global fallback file
    pub global_path: Option<PathBuf>,

    /// Whether to fall back to `JIRA_*` environment variables
    pub use_env: bool,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            global_path: Some(MultiInstanceConfig::global_path()),
            use_env: true,
        }
    }
}

impl ConfigSources {
    /// Only the working directory's own file
    pub fn local_only() -> Self {
        Self {
            global_path: None,
            use_env: false,
        }
    }
}

impl MultiInstanceConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an instance
    pub fn with_instance(mut self, name: impl Into<String>, instance: InstanceConfig) -> Self {
        self.instances.insert(name.into(), instance);
        self
    }

    /// Set the default instance
    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default_instance = Some(name.into());
        self
    }

    /// Map a project key to an instance
    pub fn with_project(mut self, key: impl Into<String>, instance: impl Into<String>) -> Self {
        self.projects.insert(
            key.into(),
            ProjectMapping {
                instance: instance.into(),
            },
        );
        self
    }

    /// Path of the config file inside a working directory
    pub fn path_for_dir(working_dir: impl AsRef<Path>) -> PathBuf {
        working_dir.as_ref().join(CONFIG_FILE_NAME)
    }

    /// Global fallback path (~/.config/jira-bridge/config.json)
    pub fn global_path() -> PathBuf {
        // Always use ~/.config for consistency across platforms (macOS, Linux)
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("jira-bridge");
        path.push("config.json");
        path
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(BridgeError::Configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), "Loading Jira configuration");

        let content = fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content).map_err(|e| {
            BridgeError::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.source = ConfigSource::File(path.to_path_buf());

        tracing::debug!(
            instances = config.instances.len(),
            projects = config.projects.len(),
            default_instance = ?config.default_instance,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Load the configuration that applies to a working directory
    ///
    /// Looks for `<dir>/.jira-config.json`, then the global file, then the
    /// `JIRA_*` environment variables.
    pub fn discover(working_dir: impl AsRef<Path>, sources: &ConfigSources) -> Result<Self> {
        let working_dir = working_dir.as_ref();
        let local = Self::path_for_dir(working_dir);
        if local.exists() {
            return Self::load(&local);
        }

        if let Some(ref global) = sources.global_path {
            if global.exists() {
                tracing::debug!(path = %global.display(), "Using global Jira configuration");
                return Self::load(global);
            }
        }

        if sources.use_env {
            if let Some(config) = Self::from_env() {
                tracing::debug!("Using Jira configuration from environment");
                return Ok(config);
            }
        }

        Err(BridgeError::Configuration(format!(
            "No Jira configuration found for {}. Create {} (run `jira-bridge init`) \
             or set {}, {} and {}.",
            working_dir.display(),
            local.display(),
            ENV_DOMAIN,
            ENV_EMAIL,
            ENV_API_TOKEN
        )))
    }

    /// Load the configuration for a working directory using every layer
    pub fn load_for_dir(working_dir: impl AsRef<Path>) -> Result<Self> {
        Self::discover(working_dir, &ConfigSources::default())
    }

    /// Single-instance configuration from `JIRA_DOMAIN`, `JIRA_EMAIL` and
    /// `JIRA_API_TOKEN`; `None` unless all three are set
    pub fn from_env() -> Option<Self> {
        let domain = std::env::var(ENV_DOMAIN).ok()?;
        let email = std::env::var(ENV_EMAIL).ok()?;
        let api_token = std::env::var(ENV_API_TOKEN).ok()?;

        let mut config = Self::new()
            .with_instance(ENV_INSTANCE_NAME, InstanceConfig::new(domain, email, api_token));
        config.source = ConfigSource::Environment;
        Some(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving Jira configuration");

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        Ok(())
    }

    /// Starter configuration with placeholder credentials
    pub fn sample() -> Self {
        Self::new()
            .with_instance(
                "primary",
                InstanceConfig::new("your-company", "you@example.com", "YOUR_API_TOKEN"),
            )
            .with_default("primary")
            .with_project("PROJ", "primary")
    }

    /// Get an instance by name
    pub fn get_instance(&self, name: &str) -> Option<&InstanceConfig> {
        self.instances.get(name)
    }

    /// All instance names, sorted
    pub fn instance_names(&self) -> Vec<String> {
        self.instances.keys().cloned().collect()
    }

    /// Instance name mapped to a project key, if any
    pub fn instance_for_project(&self, project_key: &str) -> Option<&str> {
        self.projects.get(project_key).map(|p| p.instance.as_str())
    }

    /// Effective validation policy
    pub fn validation_policy(&self) -> ValidationPolicy {
        self.validation.clone().unwrap_or_default()
    }
}
