//! AWS-backed stores.
//!
//! Wraps the async SDK clients behind the blocking store traits. One
//! current-thread runtime is built at connect time and every call blocks on
//! it; the CLI is single-threaded and runs one call at a time.
//!
//! Credentials come from the default provider chain (environment, shared
//! config, SSO, instance role). The region is always explicit.

use std::collections::BTreeMap;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudformation::error::ProvideErrorMetadata;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::types::ParameterType;
use tokio::runtime::Runtime;
use tracing::{debug, trace};

use super::{ObjectStore, ObjectVersion, ParameterStore, SecretStore, StackInspector, VersionListing};
use crate::error::{Result, StoreError};

/// SDK clients for every service the orchestrator touches.
pub struct AwsClients {
    runtime: Runtime,
    ssm: aws_sdk_ssm::Client,
    secrets: aws_sdk_secretsmanager::Client,
    s3: aws_sdk_s3::Client,
    cfn: aws_sdk_cloudformation::Client,
}

impl std::fmt::Debug for AwsClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsClients").finish_non_exhaustive()
    }
}

fn describe<E: std::error::Error>(err: &E) -> String {
    DisplayErrorContext(err).to_string()
}

impl AwsClients {
    /// Load shared AWS config for `region` and build clients.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Runtime` if the async runtime cannot be built.
    pub fn connect(region: &str, profile: Option<&str>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Runtime(format!("failed to create runtime: {}", e)))?;

        debug!(region, profile = ?profile, "loading AWS config");
        let config = runtime.block_on(async {
            let mut loader =
                aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
            if let Some(profile) = profile {
                loader = loader.profile_name(profile);
            }
            loader.load().await
        });

        Ok(Self {
            ssm: aws_sdk_ssm::Client::new(&config),
            secrets: aws_sdk_secretsmanager::Client::new(&config),
            s3: aws_sdk_s3::Client::new(&config),
            cfn: aws_sdk_cloudformation::Client::new(&config),
            runtime,
        })
    }
}

impl ParameterStore for AwsClients {
    fn put_parameter(&self, path: &str, value: &str) -> Result<()> {
        trace!(path, "put parameter");
        self.runtime
            .block_on(
                self.ssm
                    .put_parameter()
                    .name(path)
                    .value(value)
                    .r#type(ParameterType::String)
                    .overwrite(true)
                    .send(),
            )
            .map_err(|e| StoreError::Parameter {
                path: path.to_string(),
                reason: describe(&e),
            })?;
        Ok(())
    }

    fn get_parameter(&self, path: &str) -> Result<Option<String>> {
        trace!(path, "get parameter");
        match self
            .runtime
            .block_on(self.ssm.get_parameter().name(path).send())
        {
            Ok(out) => Ok(out
                .parameter()
                .and_then(|p| p.value())
                .map(str::to_string)),
            Err(e) if e.as_service_error().is_some_and(|s| s.is_parameter_not_found()) => Ok(None),
            Err(e) => Err(StoreError::Parameter {
                path: path.to_string(),
                reason: describe(&e),
            }
            .into()),
        }
    }

    fn parameters_by_path(&self, root: &str) -> Result<BTreeMap<String, String>> {
        let mut found = BTreeMap::new();
        let mut token: Option<String> = None;
        loop {
            let out = self
                .runtime
                .block_on(
                    self.ssm
                        .get_parameters_by_path()
                        .path(root)
                        .recursive(true)
                        .set_next_token(token.take())
                        .send(),
                )
                .map_err(|e| StoreError::Parameter {
                    path: root.to_string(),
                    reason: describe(&e),
                })?;

            for p in out.parameters() {
                if let (Some(name), Some(value)) = (p.name(), p.value()) {
                    found.insert(name.to_string(), value.to_string());
                }
            }

            match out.next_token() {
                Some(next) if !next.is_empty() => token = Some(next.to_string()),
                _ => break,
            }
        }
        trace!(root, count = found.len(), "listed parameters");
        Ok(found)
    }
}

impl SecretStore for AwsClients {
    fn put_secret(&self, name: &str, value: &str) -> Result<()> {
        let updated = self.runtime.block_on(
            self.secrets
                .put_secret_value()
                .secret_id(name)
                .secret_string(value)
                .send(),
        );
        match updated {
            Ok(_) => {
                trace!(name, "secret updated");
                Ok(())
            }
            Err(e)
                if e.as_service_error()
                    .is_some_and(|s| s.is_resource_not_found_exception()) =>
            {
                self.runtime
                    .block_on(
                        self.secrets
                            .create_secret()
                            .name(name)
                            .secret_string(value)
                            .send(),
                    )
                    .map_err(|e| StoreError::Secret {
                        name: name.to_string(),
                        reason: describe(&e),
                    })?;
                trace!(name, "secret created");
                Ok(())
            }
            Err(e) => Err(StoreError::Secret {
                name: name.to_string(),
                reason: describe(&e),
            }
            .into()),
        }
    }

    fn secret_exists(&self, name: &str) -> Result<bool> {
        match self
            .runtime
            .block_on(self.secrets.describe_secret().secret_id(name).send())
        {
            Ok(_) => Ok(true),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|s| s.is_resource_not_found_exception()) =>
            {
                Ok(false)
            }
            Err(e) => Err(StoreError::Secret {
                name: name.to_string(),
                reason: describe(&e),
            }
            .into()),
        }
    }
}

impl ObjectStore for AwsClients {
    fn list_buckets(&self) -> Result<Vec<String>> {
        let out = self
            .runtime
            .block_on(self.s3.list_buckets().send())
            .map_err(|e| StoreError::Object {
                bucket: "*".to_string(),
                reason: describe(&e),
            })?;
        Ok(out
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect())
    }

    fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self
            .runtime
            .block_on(self.s3.head_bucket().bucket(bucket).send())
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|s| s.is_not_found()) => Ok(false),
            Err(e) => Err(StoreError::Object {
                bucket: bucket.to_string(),
                reason: describe(&e),
            }
            .into()),
        }
    }

    fn list_objects(&self, bucket: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let out = self
                .runtime
                .block_on(
                    self.s3
                        .list_objects_v2()
                        .bucket(bucket)
                        .set_continuation_token(token.take())
                        .send(),
                )
                .map_err(|e| StoreError::Object {
                    bucket: bucket.to_string(),
                    reason: describe(&e),
                })?;

            keys.extend(out.contents().iter().filter_map(|o| o.key().map(str::to_string)));

            if out.is_truncated().unwrap_or(false) {
                token = out.next_continuation_token().map(str::to_string);
                if token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }
        Ok(keys)
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.runtime
            .block_on(self.s3.delete_object().bucket(bucket).key(key).send())
            .map_err(|e| StoreError::Object {
                bucket: bucket.to_string(),
                reason: format!("{}: {}", key, describe(&e)),
            })?;
        Ok(())
    }

    fn list_object_versions(&self, bucket: &str) -> Result<VersionListing> {
        let mut listing = VersionListing::default();
        let mut key_marker: Option<String> = None;
        let mut version_marker: Option<String> = None;
        loop {
            let out = self
                .runtime
                .block_on(
                    self.s3
                        .list_object_versions()
                        .bucket(bucket)
                        .set_key_marker(key_marker.take())
                        .set_version_id_marker(version_marker.take())
                        .send(),
                )
                .map_err(|e| StoreError::Object {
                    bucket: bucket.to_string(),
                    reason: describe(&e),
                })?;

            for v in out.versions() {
                if let (Some(key), Some(id)) = (v.key(), v.version_id()) {
                    listing.versions.push(ObjectVersion {
                        key: key.to_string(),
                        version_id: id.to_string(),
                    });
                }
            }
            for m in out.delete_markers() {
                if let (Some(key), Some(id)) = (m.key(), m.version_id()) {
                    listing.delete_markers.push(ObjectVersion {
                        key: key.to_string(),
                        version_id: id.to_string(),
                    });
                }
            }

            if !out.is_truncated().unwrap_or(false) {
                break;
            }
            key_marker = out.next_key_marker().map(str::to_string);
            version_marker = out.next_version_id_marker().map(str::to_string);
            if key_marker.is_none() {
                break;
            }
        }
        Ok(listing)
    }

    fn delete_object_version(&self, bucket: &str, key: &str, version_id: &str) -> Result<()> {
        self.runtime
            .block_on(
                self.s3
                    .delete_object()
                    .bucket(bucket)
                    .key(key)
                    .version_id(version_id)
                    .send(),
            )
            .map_err(|e| StoreError::Object {
                bucket: bucket.to_string(),
                reason: format!("{}@{}: {}", key, version_id, describe(&e)),
            })?;
        Ok(())
    }
}

impl StackInspector for AwsClients {
    fn stack_status(&self, stack: &str) -> Result<Option<String>> {
        match self
            .runtime
            .block_on(self.cfn.describe_stacks().stack_name(stack).send())
        {
            Ok(out) => {
                let status = out
                    .stacks()
                    .first()
                    .and_then(|s| s.stack_status())
                    .map(|s| s.as_str().to_string());
                // Deleted stacks are only visible by id; by name they are gone.
                Ok(status.filter(|s| s != "DELETE_COMPLETE"))
            }
            Err(e)
                if e.as_service_error()
                    .and_then(|s| s.message())
                    .is_some_and(|m| m.contains("does not exist")) =>
            {
                Ok(None)
            }
            Err(e) => Err(StoreError::Stack {
                stack: stack.to_string(),
                reason: describe(&e),
            }
            .into()),
        }
    }
}
