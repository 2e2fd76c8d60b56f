//! jira-bridge - Multi-instance Jira bridge for tool-style clients
//!
//! Lets generic tools invoke Jira operations without knowing which Jira site,
//! credentials, or API family to use. A working directory's
//! `.jira-config.json` names the instances; every tool call resolves exactly
//! one of them, validates its credentials, and receives ready-to-use clients
//! for the platform and Agile REST APIs.
//!
//! # Architecture
//!
//! - **config**: Multi-instance configuration and credential validation
//! - **resolver**: Instance selection (explicit → project → default → single)
//! - **client**: Platform and Agile REST clients
//! - **context**: `with_context`, the entry point every tool goes through
//! - **tools**: Built-in tool handlers and the tool registry

// Core modules
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod resolver;

// Peripheral handlers
pub mod tools;

// Re-exports
pub use context::{with_config, with_context, ContextOptions, ToolArgs, ToolContext};
pub use error::{BridgeError, ResolutionError, Result};
pub use resolver::{resolve, resolve_instance, ResolvedInstance};
