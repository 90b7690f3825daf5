//! Parameter publishing.
//!
//! Copies infrastructure outputs into the parameter tree the application
//! stage reads from, and the OpenSearch credential pair into one secret.
//! Every write is attempted even after a failure so the report shows the
//! full picture.

use tracing::{debug, info, warn};

use crate::core::constants;
use crate::core::domain::{Credentials, ParameterKey, Password};
use crate::core::resolver::Resolved;
use crate::core::stage::InfraOutputs;
use crate::core::store::{ParameterStore, SecretStore};
use crate::error::{PublishError, Result};

/// Terraform output holding the OpenSearch master password.
const PASSWORD_OUTPUT: &str = "opensearch_password";

/// Terraform output feeding the subnet keys.
const SUBNETS_OUTPUT: &str = "private_subnet_ids";

/// What was written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Parameter paths written, in schema order.
    pub written: Vec<String>,
    /// Name of the credential secret.
    pub secret: String,
}

/// Writes the published parameter tree and credential secret.
pub struct Publisher<'a> {
    params: &'a dyn ParameterStore,
    secrets: &'a dyn SecretStore,
}

impl<'a> Publisher<'a> {
    pub fn new(params: &'a dyn ParameterStore, secrets: &'a dyn SecretStore) -> Self {
        Self { params, secrets }
    }

    /// Publish every schema parameter and the credential secret.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::Failed` listing written and failed entries if
    /// any write failed or any required output was missing.
    pub fn publish(&self, resolved: &Resolved, outputs: &InfraOutputs) -> Result<PublishReport> {
        let mut written = Vec::new();
        let mut failed = Vec::new();

        for key in ParameterKey::ALL {
            let path = resolved.prefix.parameter_path(key);
            let value = match value_for(key, resolved, outputs) {
                Ok(value) => value,
                Err(reason) => {
                    warn!(path = %path, reason = %reason, "cannot publish");
                    failed.push((path, reason));
                    continue;
                }
            };
            match self.params.put_parameter(&path, &value) {
                Ok(()) => {
                    debug!(path = %path, "published");
                    written.push(path);
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "publish failed");
                    failed.push((path, e.to_string()));
                }
            }
        }

        let secret = resolved.prefix.secret_name();
        match self.publish_secret(&secret, outputs) {
            Ok(()) => {
                debug!(secret = %secret, "credential secret stored");
                written.push(format!("secret:{}", secret));
            }
            Err(reason) => {
                warn!(secret = %secret, "credential secret not stored");
                failed.push((format!("secret:{}", secret), reason));
            }
        }

        if !failed.is_empty() {
            return Err(PublishError::Failed { written, failed }.into());
        }

        info!(
            prefix = %resolved.prefix,
            parameters = written.len() - 1,
            "parameters published"
        );
        // The secret entry is reported separately.
        written.retain(|w| !w.starts_with("secret:"));
        Ok(PublishReport { written, secret })
    }

    fn publish_secret(&self, name: &str, outputs: &InfraOutputs) -> std::result::Result<(), String> {
        let password = outputs
            .get_str(PASSWORD_OUTPUT)
            .map(Password::new)
            .ok_or_else(|| format!("missing output {}", PASSWORD_OUTPUT))?;
        let credentials = Credentials::new(username(outputs), password);
        let payload = credentials.to_json().map_err(|e| e.to_string())?;
        self.secrets
            .put_secret(name, &payload)
            .map_err(|e| e.to_string())
    }
}

fn username(outputs: &InfraOutputs) -> String {
    outputs
        .get_str("opensearch_username")
        .unwrap_or_else(|| constants::DEFAULT_OPENSEARCH_USER.to_string())
}

/// Resolve the value for one schema key.
fn value_for(
    key: ParameterKey,
    resolved: &Resolved,
    outputs: &InfraOutputs,
) -> std::result::Result<String, String> {
    let output = |name: &str| {
        outputs
            .get_str(name)
            .ok_or_else(|| format!("missing output {}", name))
    };
    let subnet = |index: usize| {
        outputs
            .get_list(SUBNETS_OUTPUT)
            .and_then(|ids| ids.get(index).cloned())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| format!("output {} has no entry {}", SUBNETS_OUTPUT, index))
    };

    match key {
        ParameterKey::VpcId => output("vpc_id"),
        ParameterKey::VpcSubnetIds => outputs
            .get_list(SUBNETS_OUTPUT)
            .filter(|ids| !ids.is_empty())
            .map(|ids| ids.join(","))
            .ok_or_else(|| format!("missing output {}", SUBNETS_OUTPUT)),
        ParameterKey::VpcSubnetId1 => subnet(0),
        ParameterKey::VpcSubnetId2 => subnet(1),
        ParameterKey::VpcSecurityGroupId => output("security_group_id"),
        ParameterKey::OpenSearchEndpoint => output("opensearch_endpoint"),
        ParameterKey::OpenSearchUsername => Ok(username(outputs)),
        ParameterKey::DocumentsBucket => output("documents_bucket"),
        ParameterKey::LambdaCodeBucket => output("lambda_code_bucket"),
        ParameterKey::AppEnvironment => Ok(resolved.environment.to_string()),
        ParameterKey::AppProjectName => Ok(resolved.project().to_string()),
        ParameterKey::AppAwsRegion => Ok(resolved.region.clone()),
    }
}
