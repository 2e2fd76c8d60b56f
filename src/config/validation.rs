//! Configuration validation
//!
//! Checks Jira credentials and the multi-instance document for correctness:
//! - Every instance has a domain, an email and a real API token
//! - `defaultInstance` names an existing instance
//! - Every project mapping points at an existing instance
//!
//! Errors block usage of the configuration; warnings are advisory and are
//! returned as data, never raised.

use super::instances::{InstanceConfig, MultiInstanceConfig, ValidationPolicy, CLOUD_SUFFIX};

/// Literal tokens shipped in sample configurations
const PLACEHOLDER_TOKENS: &[&str] = &[
    "YOUR_API_TOKEN",
    "your-api-token",
    "<api-token>",
    "your_api_token_here",
];

/// Substring that marks placeholder text
const PLACEHOLDER_MARKER: &str = "YOUR_";

/// Outcome of a validation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn from_parts(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Validate one instance's credentials with the default policy
pub fn validate_instance_config(name: &str, config: &InstanceConfig) -> ValidationResult {
    validate_instance_config_with(name, config, &ValidationPolicy::default())
}

/// Validate one instance's credentials
pub fn validate_instance_config_with(
    name: &str,
    config: &InstanceConfig,
    policy: &ValidationPolicy,
) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let prefix = format!("Instance '{}'", name);

    // Email
    let email = config.email.trim();
    if email.is_empty() {
        errors.push(format!("{}: email is required", prefix));
    } else if !email.contains('@') {
        warnings.push(format!(
            "{}: email '{}' does not look like an email address",
            prefix, email
        ));
    }

    // API token
    let token = config.api_token.trim();
    if token.is_empty() {
        errors.push(format!("{}: apiToken is required", prefix));
    } else if is_placeholder_token(token) {
        errors.push(format!(
            "{}: apiToken is still a placeholder value; replace it with a real Jira API token",
            prefix
        ));
    } else if token.chars().count() < policy.min_token_length {
        warnings.push(format!(
            "{}: apiToken is shorter than {} characters and may be truncated",
            prefix, policy.min_token_length
        ));
    }

    // Domain
    let domain = config.domain.trim();
    if domain.is_empty() {
        errors.push(format!("{}: domain is required", prefix));
    } else if includes_cloud_suffix(domain) {
        warnings.push(format!(
            "{}: domain '{}' should be the subdomain only (e.g. 'acme', not 'acme{}')",
            prefix, domain, CLOUD_SUFFIX
        ));
    }

    ValidationResult::from_parts(errors, warnings)
}

/// Validate the whole multi-instance document
pub fn validate_multi_instance_config(config: &MultiInstanceConfig) -> ValidationResult {
    if config.instances.is_empty() {
        return ValidationResult::from_parts(
            vec!["No Jira instances configured: `instances` must define at least one entry"
                .to_string()],
            Vec::new(),
        );
    }

    let policy = config.validation_policy();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (name, instance) in &config.instances {
        let result = validate_instance_config_with(name, instance, &policy);
        errors.extend(result.errors);
        warnings.extend(result.warnings);
    }

    if let Some(ref default) = config.default_instance {
        if !config.instances.contains_key(default) {
            errors.push(format!(
                "defaultInstance '{}' does not match any configured instance",
                default
            ));
        }
    }

    for (project_key, mapping) in &config.projects {
        if !config.instances.contains_key(&mapping.instance) {
            errors.push(format!(
                "Project '{}' references unknown instance '{}'",
                project_key, mapping.instance
            ));
        }
    }

    ValidationResult::from_parts(errors, warnings)
}

/// Render a validation result for humans
pub fn format_validation_results(result: &ValidationResult, context: &str) -> String {
    let mut out = String::new();

    if result.is_valid {
        out.push_str(&format!("✓ {}: configuration is valid\n", context));
        if result.has_warnings() {
            out.push_str("\nWarnings:\n");
            push_numbered(&mut out, &result.warnings);
        }
        return out;
    }

    out.push_str(&format!("✗ {}: configuration is invalid\n", context));
    out.push_str("\nErrors:\n");
    push_numbered(&mut out, &result.errors);

    if result.has_warnings() {
        out.push_str("\nWarnings:\n");
        push_numbered(&mut out, &result.warnings);
    }

    out.push_str("\nTo fix:\n");
    out.push_str("  1. Open .jira-config.json in your working directory\n");
    out.push_str(
        "  2. Make sure every instance has \"domain\" (subdomain only), \"email\" and \"apiToken\"\n",
    );
    out.push_str(
        "  3. Create an API token at https://id.atlassian.com/manage-profile/security/api-tokens\n",
    );
    out.push_str(
        "  4. Check that \"defaultInstance\" and every \"projects\" entry name a defined instance\n",
    );

    out
}

fn push_numbered(out: &mut String, items: &[String]) {
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, item));
    }
}

fn is_placeholder_token(token: &str) -> bool {
    PLACEHOLDER_TOKENS.contains(&token) || token.contains(PLACEHOLDER_MARKER)
}

fn includes_cloud_suffix(domain: &str) -> bool {
    let normalized = domain.trim_end_matches('/').to_lowercase();
    normalized.ends_with(CLOUD_SUFFIX) || normalized == CLOUD_SUFFIX.trim_start_matches('.')
}
