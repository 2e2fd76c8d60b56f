//! Configuration system
//!
//! Multi-instance configuration for Jira Cloud sites.
//!
//! Loads `.jira-config.json` from the working directory with support for:
//! - Multiple named Jira instances (one per site/tenant)
//! - A default instance
//! - Project key → instance mapping
//! - Global and environment-variable fallbacks

mod instances;
pub mod validation;

pub use instances::{
    ConfigSource, ConfigSources, InstanceConfig, MultiInstanceConfig, ProjectMapping,
    ValidationPolicy, CLOUD_SUFFIX, CONFIG_FILE_NAME, ENV_API_TOKEN, ENV_DOMAIN, ENV_EMAIL,
    ENV_INSTANCE_NAME,
};
pub use validation::{
    format_validation_results, validate_instance_config, validate_instance_config_with,
    validate_multi_instance_config, ValidationResult,
};
