//! Configuration file management.
//!
//! Reads and validates the optional `rigger.toml` at the project root.
//! Every section is optional; a missing file means all defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::core::constants;
use crate::core::domain::Environment;
use crate::error::{ConfigError, Result};

/// Project configuration stored in `rigger.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub project: ProjectSettings,
    pub paths: PathSettings,
    pub tools: ToolSettings,
    pub aws: AwsSettings,
    pub destroy: DestroySettings,
    /// Directory the file was loaded from; relative paths resolve against it.
    #[serde(skip)]
    root: PathBuf,
}

/// `[project]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Project name, overridden by `--project` / `PROJECT_NAME`
    pub name: Option<String>,
}

/// `[paths]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Terraform root module
    pub infra_dir: PathBuf,
    /// SAM application (template.yaml)
    pub app_dir: PathBuf,
    /// Lock files and saved plans
    pub state_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            infra_dir: PathBuf::from(constants::DEFAULT_INFRA_DIR),
            app_dir: PathBuf::from(constants::DEFAULT_APP_DIR),
            state_dir: PathBuf::from(constants::DEFAULT_STATE_DIR),
        }
    }
}

/// `[tools]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub terraform: String,
    pub sam: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            terraform: "terraform".to_string(),
            sam: "sam".to_string(),
        }
    }
}

/// `[aws]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsSettings {
    /// Region used when the variable set has no `aws_region`
    pub region: Option<String>,
    /// Named profile from the shared AWS config
    pub profile: Option<String>,
}

/// `[destroy]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DestroySettings {
    /// Seconds between stack status polls
    pub poll_interval_secs: u64,
    /// Polls before a stack delete is reported as failed
    pub max_polls: u32,
}

impl Default for DestroySettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: constants::DEFAULT_POLL_INTERVAL_SECS,
            max_polls: constants::DEFAULT_MAX_POLLS,
        }
    }
}

impl DestroySettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Settings {
    /// Load `rigger.toml` from `root`, or defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` or `ConfigError::Parse` for an
    /// unreadable or malformed file, and `ConfigError::InvalidValue` if
    /// validation fails.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let path = root.join(constants::CONFIG_FILE);
        debug!(path = %path.display(), "loading settings");

        let mut settings = if path.exists() {
            let contents =
                std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
                    path: path.clone(),
                    source,
                })?;
            toml::from_str::<Settings>(&contents).map_err(ConfigError::Parse)?
        } else {
            debug!("no rigger.toml, using defaults");
            Settings::default()
        };
        settings.root = root.to_path_buf();

        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration contents.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.tools.terraform.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tools.terraform",
                reason: "cannot be empty".to_string(),
            }
            .into());
        }
        if self.tools.sam.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tools.sam",
                reason: "cannot be empty".to_string(),
            }
            .into());
        }
        if self.destroy.max_polls == 0 {
            return Err(ConfigError::InvalidValue {
                field: "destroy.max_polls",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if let Some(region) = &self.aws.region {
            if region.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "aws.region",
                    reason: "cannot be empty".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn infra_dir(&self) -> PathBuf {
        self.root.join(&self.paths.infra_dir)
    }

    pub fn app_dir(&self) -> PathBuf {
        self.root.join(&self.paths.app_dir)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(&self.paths.state_dir)
    }

    /// `{infra_dir}/environments/{env}.tfvars`
    pub fn variable_file(&self, environment: Environment) -> PathBuf {
        self.infra_dir()
            .join(constants::VARIABLES_DIR)
            .join(format!("{}.tfvars", environment))
    }

    /// Project name: explicit value, then `[project] name`, then the default.
    pub fn project_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_string)
            .or_else(|| self.project.name.clone())
            .unwrap_or_else(|| constants::DEFAULT_PROJECT.to_string())
    }
}
