//! Configuration resolution.
//!
//! Turns a requested `(project, environment)` into everything later stages
//! need: the environment, its variable set, the resource prefix and the
//! region. Resolution only reads files, so it is safe to repeat.

use std::path::PathBuf;

use tracing::debug;

use crate::core::config::Settings;
use crate::core::constants;
use crate::core::domain::{Environment, Prefix, VariableSet};
use crate::error::{ConfigError, Result};

/// Output of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub environment: Environment,
    pub prefix: Prefix,
    pub variables: VariableSet,
    pub region: String,
}

impl Resolved {
    pub fn project(&self) -> &str {
        self.prefix.project()
    }

    /// Absolute path of the environment's `.tfvars` file.
    pub fn variable_file(&self) -> PathBuf {
        self.variables.path().to_path_buf()
    }
}

/// Resolve an environment by name.
///
/// # Errors
///
/// Returns `ConfigError::UnknownEnvironment` if `environment` is not a
/// declared environment or has no variable-set file, and
/// `ConfigError::InvalidValue` for an unusable project name.
pub fn resolve(settings: &Settings, project: &str, environment: &str) -> Result<Resolved> {
    let env: Environment = environment.parse()?;
    let prefix = Prefix::new(project, env)?;

    let path = settings.variable_file(env);
    if !path.is_file() {
        return Err(ConfigError::UnknownEnvironment {
            name: environment.to_string(),
            reason: format!("no variable set at {}", path.display()),
        }
        .into());
    }
    let variables = VariableSet::load(&path)?;

    let region = variables
        .get(constants::REGION_VARIABLE)
        .map(str::to_string)
        .or_else(|| settings.aws.region.clone())
        .unwrap_or_else(|| constants::DEFAULT_REGION.to_string());

    debug!(
        prefix = %prefix,
        region = %region,
        variables = variables.len(),
        "resolved environment"
    );

    Ok(Resolved {
        environment: env,
        prefix,
        variables,
        region,
    })
}
