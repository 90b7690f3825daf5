//! Resource naming.
//!
//! Every managed name (parameter paths, the credential secret, the
//! application stack, bucket patterns) is built here from a single
//! [`Prefix`], so re-running against the same `(project, environment)`
//! always targets the same resources.

use std::fmt;

use regex::Regex;

use super::{Environment, ParameterKey};
use crate::error::{ConfigError, Result};

/// Suffix of the OpenSearch credential secret.
const CREDENTIALS_SUFFIX: &str = "opensearch-credentials";

/// Suffix of the SAM application stack.
const STACK_SUFFIX: &str = "app";

/// The `{project}-{environment}` prefix scoping every managed resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prefix {
    project: String,
    environment: Environment,
}

impl Prefix {
    /// Build a prefix, validating the project name.
    ///
    /// Project names end up in bucket names and SSM paths, so only
    /// lowercase ASCII letters, digits and inner hyphens are accepted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unusable project name.
    pub fn new(project: &str, environment: Environment) -> Result<Self> {
        validate_project(project)?;
        Ok(Self {
            project: project.to_string(),
            environment,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Root of the published parameter tree: `/{project}/{environment}`.
    pub fn parameter_root(&self) -> String {
        format!("/{}/{}", self.project, self.environment)
    }

    /// Full parameter path for a schema key.
    ///
    /// `/aws-chatbot/dev/s3/documents_bucket`
    pub fn parameter_path(&self, key: ParameterKey) -> String {
        format!("{}/{}", self.parameter_root(), key.relative_path())
    }

    /// Name of the OpenSearch credential secret.
    pub fn secret_name(&self) -> String {
        format!("{}-{}", self, CREDENTIALS_SUFFIX)
    }

    /// Name of the SAM application stack.
    pub fn stack_name(&self) -> String {
        format!("{}-{}", self, STACK_SUFFIX)
    }

    /// Leading part of every bucket name for a role: `{prefix}-{role}-`.
    pub fn bucket_stem(&self, role: BucketRole) -> String {
        format!("{}-{}-", self, role.as_str())
    }

    /// Strict deletion-target pattern for this prefix.
    pub fn bucket_pattern(&self) -> Result<BucketPattern> {
        BucketPattern::new(self)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.project, self.environment)
    }
}

fn validate_project(project: &str) -> Result<()> {
    let invalid = |reason: String| -> crate::error::Error {
        ConfigError::InvalidValue {
            field: "project name",
            reason,
        }
        .into()
    };

    if project.is_empty() {
        return Err(invalid("cannot be empty".to_string()));
    }

    for (i, ch) in project.chars().enumerate() {
        if !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-') {
            return Err(invalid(format!(
                "invalid character '{}' at position {} in '{}'. Only a-z, 0-9 and '-' are allowed",
                ch,
                i + 1,
                project
            )));
        }
    }

    if project.starts_with('-') || project.ends_with('-') {
        return Err(invalid(format!(
            "'{}' cannot start or end with '-'",
            project
        )));
    }

    Ok(())
}

/// Role of a managed bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketRole {
    Documents,
    LambdaCode,
}

impl BucketRole {
    /// Both managed roles. Cleanup never looks beyond these.
    pub const ALL: [BucketRole; 2] = [BucketRole::Documents, BucketRole::LambdaCode];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Documents => "documents",
            Self::LambdaCode => "lambda-code",
        }
    }

    /// Published parameter holding this bucket's name.
    pub fn parameter(&self) -> ParameterKey {
        match self {
            Self::Documents => ParameterKey::DocumentsBucket,
            Self::LambdaCode => ParameterKey::LambdaCodeBucket,
        }
    }
}

impl fmt::Display for BucketRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `^{prefix}-(documents|lambda-code)-<suffix>$`
///
/// The suffix must be non-empty and made of characters S3 allows in bucket
/// names. Anything else is not a deletion target.
#[derive(Debug, Clone)]
pub struct BucketPattern {
    regex: Regex,
}

impl BucketPattern {
    fn new(prefix: &Prefix) -> Result<Self> {
        let source = format!(
            r"^{}-(documents|lambda-code)-[a-z0-9][a-z0-9.-]*$",
            regex::escape(&prefix.to_string())
        );
        let regex = Regex::new(&source).map_err(|e| ConfigError::InvalidValue {
            field: "bucket pattern",
            reason: e.to_string(),
        })?;
        Ok(Self { regex })
    }

    /// Role of `name` if it is a valid deletion target.
    pub fn classify(&self, name: &str) -> Option<BucketRole> {
        let captures = self.regex.captures(name)?;
        match captures.get(1)?.as_str() {
            "documents" => Some(BucketRole::Documents),
            "lambda-code" => Some(BucketRole::LambdaCode),
            _ => None,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.classify(name).is_some()
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
