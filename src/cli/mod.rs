//! Command-line interface.

pub mod completions;
pub mod config;
pub mod deploy;
pub mod destroy;
pub mod output;
pub mod progress;
pub mod prompt;
pub mod status;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::config::Settings;
use crate::core::resolver::{self, Resolved};
use crate::core::sequencer;
use crate::error::{ConfigError, Result};

/// Rigger - deploy and tear down the chatbot platform.
#[derive(Parser)]
#[command(
    name = "rigger",
    about = "Deploy and tear down Terraform + SAM stacks, one environment at a time",
    version,
    after_help = "Infrastructure first, application second. Teardown in reverse."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: Global,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every command.
#[derive(Args, Debug, Clone)]
pub struct Global {
    /// Target environment (dev, staging, prod)
    #[arg(short, long, global = true, env = "ENVIRONMENT", default_value = "dev")]
    pub env: String,

    /// Project name (defaults to rigger.toml, then aws-chatbot)
    #[arg(short, long, global = true, env = "PROJECT_NAME")]
    pub project: Option<String>,

    /// Project root containing infrastructure/ and backend/
    #[arg(short = 'C', long = "dir", global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Apply infrastructure, publish parameters, build and deploy the application
    Deploy,

    /// Apply infrastructure and publish parameters
    DeployInfra,

    /// Build and deploy the application from published parameters
    DeployApp,

    /// Delete the application stack, empty buckets, destroy infrastructure
    Destroy {
        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,
        /// Show what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Empty the environment's managed buckets (all versions)
    Cleanup {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// List what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,
        /// Extra bucket to consider; must still match the managed pattern
        #[arg(long = "bucket", value_name = "NAME")]
        buckets: Vec<String>,
    },

    /// Show published parameters, secret, stack and infrastructure state
    Status,

    /// Show the resolved configuration (no AWS access)
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Settings and resolved environment for one invocation.
pub struct Context {
    pub settings: Settings,
    pub resolved: Resolved,
}

impl Context {
    /// Load `rigger.toml` from `--dir` and resolve the environment.
    pub fn load(global: &Global) -> Result<Self> {
        let root = std::fs::canonicalize(&global.dir).map_err(|source| ConfigError::ReadFile {
            path: global.dir.clone(),
            source,
        })?;
        let settings = Settings::load(&root)?;
        let project = settings.project_name(global.project.as_deref());
        let resolved = resolver::resolve(&settings, &project, &global.env)?;
        Ok(Self { settings, resolved })
    }
}

/// Execute a command.
pub fn execute(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Command::Deploy => deploy::execute(&global, sequencer::DEPLOY, "Deploy"),
        Command::DeployInfra => deploy::execute(&global, sequencer::DEPLOY_INFRA, "Deploy infrastructure"),
        Command::DeployApp => deploy::execute(&global, sequencer::DEPLOY_APP, "Deploy application"),
        Command::Destroy { yes, dry_run } => destroy::execute(&global, yes, dry_run),
        Command::Cleanup {
            yes,
            dry_run,
            buckets,
        } => destroy::cleanup(&global, yes, dry_run, buckets),
        Command::Status => status::execute(&global),
        Command::Config { json } => config::execute(&global, json),
        Command::Completions { shell } => completions::execute(shell),
    }
}
