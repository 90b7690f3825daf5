//! Error types.
//!
//! One enum per concern, wrapped by the top-level [`Error`]. Stage failures
//! raised inside a sequenced run are wrapped in [`Error::Step`] so the
//! caller always knows which step and environment failed.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::sequencer::Step;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Cleanup(#[from] CleanupError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lock(#[from] LockError),

    /// A sequenced step failed.
    #[error("{step} failed for {environment}: {source}")]
    Step {
        step: Step,
        environment: String,
        #[source]
        source: Box<Error>,
    },

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an error with the step and environment it came from.
    pub fn in_step(self, step: Step, environment: impl Into<String>) -> Self {
        Error::Step {
            step,
            environment: environment.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through step context.
    pub fn root(&self) -> &Error {
        match self {
            Error::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// The step a failure was raised in, if any.
    pub fn step(&self) -> Option<Step> {
        match self {
            Error::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Configuration and environment resolution errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown environment '{name}': {reason}")]
    UnknownEnvironment { name: String, reason: String },

    #[error("failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rigger.toml: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{}:{line}: {reason}", .path.display())]
    InvalidVariable {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Infrastructure and application stage errors.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("{tool} not found on PATH")]
    ToolNotFound { tool: String },

    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("terraform apply failed for {environment}:\n{diagnostic}")]
    InfraApplyFailed {
        environment: String,
        diagnostic: String,
    },

    #[error("no infrastructure state for {environment}: {reason}")]
    StateUnavailable { environment: String, reason: String },

    #[error("sam build failed:\n{diagnostic}")]
    BuildFailed { diagnostic: String },

    #[error("sam deploy failed for {environment}:\n{diagnostic}")]
    DeployFailed {
        environment: String,
        diagnostic: String,
    },

    #[error("failed to destroy {target}:\n{diagnostic}")]
    DestroyFailed { target: String, diagnostic: String },

    #[error("missing published parameter: {path}")]
    MissingPublishedParameter { path: String },

    #[error("unreadable terraform outputs: {0}")]
    Outputs(#[from] serde_json::Error),
}

/// Parameter/secret publishing errors.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error(
        "published {} of {} entries; failed: {}",
        .written.len(),
        .written.len() + .failed.len(),
        describe_failures(.failed)
    )]
    Failed {
        written: Vec<String>,
        failed: Vec<(String, String)>,
    },
}

fn describe_failures(failed: &[(String, String)]) -> String {
    failed
        .iter()
        .map(|(path, reason)| format!("{} ({})", path, reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Bucket cleanup errors.
#[derive(Error, Debug)]
pub enum CleanupError {
    #[error("bucket cleanup cancelled; nothing was deleted")]
    Cancelled,

    #[error("failed to empty bucket(s): {}", .buckets.join(", "))]
    BucketsFailed { buckets: Vec<String> },
}

/// Remote store (AWS) errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("parameter {path}: {reason}")]
    Parameter { path: String, reason: String },

    #[error("secret {name}: {reason}")]
    Secret { name: String, reason: String },

    #[error("bucket {bucket}: {reason}")]
    Object { bucket: String, reason: String },

    #[error("stack {stack}: {reason}")]
    Stack { stack: String, reason: String },

    #[error("failed to start AWS runtime: {0}")]
    Runtime(String),
}

/// Deployment lock errors.
#[derive(Error, Debug)]
pub enum LockError {
    #[error("another run holds {} ({holder})", .path.display())]
    Held { path: PathBuf, holder: String },

    #[error("failed to open lock {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
