//! jira-bridge - Multi-instance Jira bridge
//!
//! Main entry point for the jira-bridge CLI.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use jira_bridge::config::{
    format_validation_results, validate_multi_instance_config, MultiInstanceConfig,
};
use jira_bridge::tools::ToolRegistry;
use std::path::PathBuf;
use std::process;

/// jira-bridge - Route Jira tool calls to the right instance
#[derive(Parser, Debug)]
#[command(name = "jira-bridge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Working directory whose .jira-config.json applies (default: current directory)
    #[arg(short, long, env = "JIRA_BRIDGE_DIR")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a sample .jira-config.json
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the configuration and print a report
    Validate,

    /// List configured instances and project mappings
    Instances,

    /// Show which instance a call would use
    Resolve {
        /// Explicit instance name
        #[arg(short, long)]
        instance: Option<String>,

        /// Project key (e.g. MIG)
        #[arg(short, long)]
        project: Option<String>,
    },

    /// List available tools
    Tools,

    /// Invoke a tool
    Call {
        /// Tool name (see `jira-bridge tools`)
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

fn main() {
    // Initialize logging
    if let Err(e) = jira_bridge::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the command ran but reported a failure
fn run(cli: Cli) -> anyhow::Result<bool> {
    let dir = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    match cli.command {
        Commands::Init { force } => {
            let path = MultiInstanceConfig::path_for_dir(&dir);
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            MultiInstanceConfig::sample().save(&path)?;
            println!("Wrote {}", path.display());
            println!("Replace the placeholder credentials, then run `jira-bridge validate`.");
            Ok(true)
        }

        Commands::Validate => {
            let config = MultiInstanceConfig::load_for_dir(&dir)?;
            let result = validate_multi_instance_config(&config);
            print!(
                "{}",
                format_validation_results(&result, &config.source.to_string())
            );
            Ok(result.is_valid)
        }

        Commands::Instances => {
            let config = MultiInstanceConfig::load_for_dir(&dir)?;
            println!("Source: {}", config.source);
            println!("\nInstances:");
            for (name, instance) in &config.instances {
                let marker = if config.default_instance.as_deref() == Some(name.as_str()) {
                    " (default)"
                } else {
                    ""
                };
                println!("  {}{} → {} as {}", name, marker, instance.host(), instance.email);
            }
            if !config.projects.is_empty() {
                println!("\nProjects:");
                for (key, mapping) in &config.projects {
                    println!("  {} → {}", key, mapping.instance);
                }
            }
            Ok(true)
        }

        Commands::Resolve { instance, project } => {
            let resolved =
                jira_bridge::resolve(&dir, project.as_deref(), instance.as_deref())?;
            println!(
                "{} ({}) via {}",
                resolved.name,
                resolved.config.host(),
                resolved.source
            );
            Ok(true)
        }

        Commands::Tools => {
            let registry = ToolRegistry::with_builtin_tools();
            for tool in registry.iter() {
                println!("{:<24} {}", tool.name(), tool.description());
            }
            Ok(true)
        }

        Commands::Call { tool, args } => {
            let mut raw: serde_json::Value =
                serde_json::from_str(&args).context("--args must be a JSON object")?;
            let object = raw
                .as_object_mut()
                .context("--args must be a JSON object")?;
            object
                .entry("working_dir")
                .or_insert_with(|| serde_json::Value::String(dir.display().to_string()));

            let runtime = tokio::runtime::Runtime::new()?;
            let registry = ToolRegistry::with_builtin_tools();
            let output = runtime.block_on(registry.invoke(&tool, raw))?;

            if output.is_error {
                eprintln!("{}", output.text);
                Ok(false)
            } else {
                println!("{}", output.text);
                Ok(true)
            }
        }
    }
}
