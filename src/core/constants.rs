//! Constants used throughout rigger.
//!
//! Centralizes magic strings and defaults.

/// Optional project configuration file (rigger.toml).
pub const CONFIG_FILE: &str = "rigger.toml";

/// Project name used when neither flag, env var nor config sets one.
pub const DEFAULT_PROJECT: &str = "aws-chatbot";

/// Region used when neither the variable set nor config names one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Terraform root module directory, relative to the project root.
pub const DEFAULT_INFRA_DIR: &str = "infrastructure";

/// SAM application directory, relative to the project root.
pub const DEFAULT_APP_DIR: &str = "backend";

/// Lock files and saved plans, relative to the project root.
pub const DEFAULT_STATE_DIR: &str = ".rigger";

/// Directory under the infra dir holding one `.tfvars` per environment.
pub const VARIABLES_DIR: &str = "environments";

/// Variable-set key naming the AWS region.
pub const REGION_VARIABLE: &str = "aws_region";

/// OpenSearch master user when Terraform does not export one.
pub const DEFAULT_OPENSEARCH_USER: &str = "admin";

/// Seconds between stack status polls while a delete is in progress.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Status polls before giving up on a stack delete (30 minutes at 5s).
pub const DEFAULT_MAX_POLLS: u32 = 360;
