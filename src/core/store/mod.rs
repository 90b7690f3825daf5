//! Remote state stores.
//!
//! Orchestration code never talks to AWS directly; it goes through these
//! traits so it can run against in-memory fakes.
//!
//! ## Implementations
//!
//! - [`AwsClients`]: SSM, Secrets Manager, S3 and CloudFormation
//! - [`memory`]: in-memory stores for tests and benches

use std::collections::BTreeMap;

use crate::error::Result;

mod aws;
pub mod memory;

pub use aws::AwsClients;

/// Hierarchical key/value parameter store (SSM Parameter Store).
pub trait ParameterStore {
    /// Write a plain string parameter, overwriting any existing value.
    fn put_parameter(&self, path: &str, value: &str) -> Result<()>;

    /// Read a parameter. `Ok(None)` if it does not exist.
    fn get_parameter(&self, path: &str) -> Result<Option<String>>;

    /// Every parameter under `root`, recursively, keyed by full path.
    fn parameters_by_path(&self, root: &str) -> Result<BTreeMap<String, String>>;
}

/// Secret store (Secrets Manager).
pub trait SecretStore {
    /// Create the secret, or store a new value if it already exists.
    fn put_secret(&self, name: &str, value: &str) -> Result<()>;

    /// Whether the secret exists. Never returns the value.
    fn secret_exists(&self, name: &str) -> Result<bool>;
}

/// A single object version or delete marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectVersion {
    pub key: String,
    pub version_id: String,
}

/// All versions and delete markers in a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionListing {
    pub versions: Vec<ObjectVersion>,
    pub delete_markers: Vec<ObjectVersion>,
}

/// Object storage (S3).
pub trait ObjectStore {
    /// Names of every bucket visible to the caller.
    fn list_buckets(&self) -> Result<Vec<String>>;

    fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Keys of current objects.
    fn list_objects(&self, bucket: &str) -> Result<Vec<String>>;

    /// Delete the current version of `key`.
    fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    fn list_object_versions(&self, bucket: &str) -> Result<VersionListing>;

    /// Permanently delete one version or delete marker.
    fn delete_object_version(&self, bucket: &str, key: &str, version_id: &str) -> Result<()>;
}

/// Read-only view of deployed stacks (CloudFormation).
pub trait StackInspector {
    /// Current status (`CREATE_COMPLETE`, `DELETE_IN_PROGRESS`, ...), or
    /// `None` if the stack does not exist.
    fn stack_status(&self, stack: &str) -> Result<Option<String>>;
}
