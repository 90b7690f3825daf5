//! In-memory stores.
//!
//! Behave like the AWS services closely enough for orchestration tests:
//! versioned buckets keep every version and add delete markers, and every
//! mutating object call is recorded. Individual operations can be made to
//! fail.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use super::{ObjectStore, ObjectVersion, ParameterStore, SecretStore, StackInspector, VersionListing};
use crate::error::{Result, StoreError};

/// In-memory parameter store.
#[derive(Debug, Default)]
pub struct MemoryParameterStore {
    values: RefCell<BTreeMap<String, String>>,
    failing: RefCell<BTreeSet<String>>,
    writes: RefCell<Vec<String>>,
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without recording a write.
    pub fn insert(&self, path: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(path.to_string(), value.to_string());
    }

    /// Make writes to `path` fail.
    pub fn fail_on(&self, path: &str) {
        self.failing.borrow_mut().insert(path.to_string());
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.values.borrow().get(path).cloned()
    }

    /// Every path written, in order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.borrow().clone()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values.borrow().clone()
    }
}

impl ParameterStore for MemoryParameterStore {
    fn put_parameter(&self, path: &str, value: &str) -> Result<()> {
        if self.failing.borrow().contains(path) {
            return Err(StoreError::Parameter {
                path: path.to_string(),
                reason: "access denied".to_string(),
            }
            .into());
        }
        self.writes.borrow_mut().push(path.to_string());
        self.insert(path, value);
        Ok(())
    }

    fn get_parameter(&self, path: &str) -> Result<Option<String>> {
        Ok(self.get(path))
    }

    fn parameters_by_path(&self, root: &str) -> Result<BTreeMap<String, String>> {
        let root = format!("{}/", root.trim_end_matches('/'));
        Ok(self
            .values
            .borrow()
            .iter()
            .filter(|(k, _)| k.starts_with(&root))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// In-memory secret store.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    values: RefCell<BTreeMap<String, String>>,
    fail: RefCell<bool>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self) {
        *self.fail.borrow_mut() = true;
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.values.borrow().get(name).cloned()
    }
}

impl SecretStore for MemorySecretStore {
    fn put_secret(&self, name: &str, value: &str) -> Result<()> {
        if *self.fail.borrow() {
            return Err(StoreError::Secret {
                name: name.to_string(),
                reason: "access denied".to_string(),
            }
            .into());
        }
        self.values
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn secret_exists(&self, name: &str) -> Result<bool> {
        Ok(self.values.borrow().contains_key(name))
    }
}

/// A mutating call against [`MemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectCall {
    DeleteObject {
        bucket: String,
        key: String,
    },
    DeleteVersion {
        bucket: String,
        key: String,
        version_id: String,
    },
}

impl ObjectCall {
    pub fn bucket(&self) -> &str {
        match self {
            Self::DeleteObject { bucket, .. } | Self::DeleteVersion { bucket, .. } => bucket,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredVersion {
    id: String,
    marker: bool,
}

#[derive(Debug, Default)]
struct Bucket {
    versioned: bool,
    // Oldest first; the last entry is current.
    objects: BTreeMap<String, Vec<StoredVersion>>,
}

/// In-memory object store with S3 versioning semantics.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: RefCell<BTreeMap<String, Bucket>>,
    calls: RefCell<Vec<ObjectCall>>,
    failing_versions: RefCell<BTreeSet<(String, String, String)>>,
    failing_lists: RefCell<BTreeSet<String>>,
    failing_exists: RefCell<BTreeSet<String>>,
    failing_bucket_list: RefCell<bool>,
    next_id: RefCell<u64>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_bucket(&self, name: &str, versioned: bool) {
        self.buckets.borrow_mut().insert(
            name.to_string(),
            Bucket {
                versioned,
                objects: BTreeMap::new(),
            },
        );
    }

    /// Write an object, returning its version id.
    pub fn put_object(&self, bucket: &str, key: &str) -> String {
        let id = self.allocate_id();
        let mut buckets = self.buckets.borrow_mut();
        let b = buckets.entry(bucket.to_string()).or_default();
        let history = b.objects.entry(key.to_string()).or_default();
        if !b.versioned {
            history.clear();
        }
        history.push(StoredVersion {
            id: id.clone(),
            marker: false,
        });
        id
    }

    /// Drop a bucket, as Terraform would. Refuses while anything is left in
    /// it and returns whether the bucket was removed.
    pub fn remove_bucket(&self, name: &str) -> bool {
        if self.remaining(name) > 0 {
            return false;
        }
        self.buckets.borrow_mut().remove(name).is_some()
    }

    /// Make deleting this exact version fail.
    pub fn fail_version(&self, bucket: &str, key: &str, version_id: &str) {
        self.failing_versions.borrow_mut().insert((
            bucket.to_string(),
            key.to_string(),
            version_id.to_string(),
        ));
    }

    /// Make every listing call on `bucket` fail.
    pub fn fail_listing(&self, bucket: &str) {
        self.failing_lists.borrow_mut().insert(bucket.to_string());
    }

    /// Make the existence check on `bucket` fail.
    pub fn fail_exists(&self, bucket: &str) {
        self.failing_exists.borrow_mut().insert(bucket.to_string());
    }

    /// Make listing the account's buckets fail.
    pub fn fail_bucket_listing(&self) {
        *self.failing_bucket_list.borrow_mut() = true;
    }

    /// Every mutating call, in order.
    pub fn calls(&self) -> Vec<ObjectCall> {
        self.calls.borrow().clone()
    }

    /// Versions plus delete markers left in `bucket`.
    pub fn remaining(&self, bucket: &str) -> usize {
        self.buckets
            .borrow()
            .get(bucket)
            .map(|b| b.objects.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    fn allocate_id(&self) -> String {
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        format!("v{:06}", *next)
    }

    fn missing(bucket: &str) -> crate::error::Error {
        StoreError::Object {
            bucket: bucket.to_string(),
            reason: "NoSuchBucket".to_string(),
        }
        .into()
    }

    fn check_listing(&self, bucket: &str) -> Result<()> {
        if self.failing_lists.borrow().contains(bucket) {
            return Err(StoreError::Object {
                bucket: bucket.to_string(),
                reason: "listing failed".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl ObjectStore for MemoryObjectStore {
    fn list_buckets(&self) -> Result<Vec<String>> {
        if *self.failing_bucket_list.borrow() {
            return Err(StoreError::Object {
                bucket: "*".to_string(),
                reason: "AccessDenied".to_string(),
            }
            .into());
        }
        Ok(self.buckets.borrow().keys().cloned().collect())
    }

    fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        if self.failing_exists.borrow().contains(bucket) {
            return Err(StoreError::Object {
                bucket: bucket.to_string(),
                reason: "403 Forbidden".to_string(),
            }
            .into());
        }
        Ok(self.buckets.borrow().contains_key(bucket))
    }

    fn list_objects(&self, bucket: &str) -> Result<Vec<String>> {
        self.check_listing(bucket)?;
        let buckets = self.buckets.borrow();
        let b = buckets.get(bucket).ok_or_else(|| Self::missing(bucket))?;
        Ok(b.objects
            .iter()
            .filter(|(_, history)| history.last().is_some_and(|v| !v.marker))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.calls.borrow_mut().push(ObjectCall::DeleteObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        let id = self.allocate_id();
        let mut buckets = self.buckets.borrow_mut();
        let b = buckets.get_mut(bucket).ok_or_else(|| Self::missing(bucket))?;
        if b.versioned {
            b.objects
                .entry(key.to_string())
                .or_default()
                .push(StoredVersion { id, marker: true });
        } else {
            b.objects.remove(key);
        }
        Ok(())
    }

    fn list_object_versions(&self, bucket: &str) -> Result<VersionListing> {
        self.check_listing(bucket)?;
        let buckets = self.buckets.borrow();
        let b = buckets.get(bucket).ok_or_else(|| Self::missing(bucket))?;
        let mut listing = VersionListing::default();
        for (key, history) in &b.objects {
            for v in history {
                let entry = ObjectVersion {
                    key: key.clone(),
                    version_id: v.id.clone(),
                };
                if v.marker {
                    listing.delete_markers.push(entry);
                } else {
                    listing.versions.push(entry);
                }
            }
        }
        Ok(listing)
    }

    fn delete_object_version(&self, bucket: &str, key: &str, version_id: &str) -> Result<()> {
        self.calls.borrow_mut().push(ObjectCall::DeleteVersion {
            bucket: bucket.to_string(),
            key: key.to_string(),
            version_id: version_id.to_string(),
        });
        let failing = (bucket.to_string(), key.to_string(), version_id.to_string());
        if self.failing_versions.borrow().contains(&failing) {
            return Err(StoreError::Object {
                bucket: bucket.to_string(),
                reason: format!("AccessDenied deleting {}@{}", key, version_id),
            }
            .into());
        }
        let mut buckets = self.buckets.borrow_mut();
        let b = buckets.get_mut(bucket).ok_or_else(|| Self::missing(bucket))?;
        if let Some(history) = b.objects.get_mut(key) {
            history.retain(|v| v.id != version_id);
            if history.is_empty() {
                b.objects.remove(key);
            }
        }
        Ok(())
    }
}

/// In-memory stack inspector.
///
/// Each stack has a queue of statuses; every query pops the next one and
/// the last is sticky, which models a delete progressing between polls.
#[derive(Debug, Default)]
pub struct MemoryStacks {
    statuses: RefCell<BTreeMap<String, Vec<Option<String>>>>,
}

impl MemoryStacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the statuses returned for `stack`. `None` means absent.
    pub fn script(&self, stack: &str, statuses: &[Option<&str>]) {
        self.statuses.borrow_mut().insert(
            stack.to_string(),
            statuses.iter().map(|s| s.map(str::to_string)).collect(),
        );
    }
}

impl StackInspector for MemoryStacks {
    fn stack_status(&self, stack: &str) -> Result<Option<String>> {
        let mut statuses = self.statuses.borrow_mut();
        let Some(queue) = statuses.get_mut(stack) else {
            return Ok(None);
        };
        if queue.len() > 1 {
            Ok(queue.remove(0))
        } else {
            Ok(queue.first().cloned().flatten())
        }
    }
}
