//! Bucket cleanup before infrastructure teardown.
//!
//! Terraform cannot delete a non-empty bucket, and versioned buckets keep
//! every version and delete marker after a plain delete. Cleanup empties
//! the managed buckets completely:
//!
//! 1. Discover candidates (published bucket parameters, account buckets
//!    with a managed stem, operator-supplied names)
//! 2. Validate every candidate against the strict prefix pattern
//! 3. Confirm the target list
//! 4. Delete current objects, then every version, then every delete marker
//!
//! A name that fails validation never reaches a delete call. A failure on
//! one object or bucket never stops the rest of the batch.

use std::fmt;

use tracing::{debug, info, warn};

use crate::core::domain::BucketRole;
use crate::core::resolver::Resolved;
use crate::core::store::{ObjectStore, ParameterStore};
use crate::error::{CleanupError, Result};

/// Emptying phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Objects,
    Versions,
    DeleteMarkers,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Objects => "objects",
            Self::Versions => "versions",
            Self::DeleteMarkers => "delete-markers",
        })
    }
}

/// Terminal state of one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketStatus {
    Emptied,
    /// Dry run: would have been emptied.
    WouldEmpty,
    /// Not a managed bucket for this prefix; left untouched.
    Rejected { reason: String },
    /// Valid name, but the bucket does not exist.
    Absent,
    /// Some deletes failed; see `errors`.
    Failed,
}

impl fmt::Display for BucketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emptied => f.write_str("emptied"),
            Self::WouldEmpty => f.write_str("would empty"),
            Self::Rejected { reason } => write!(f, "rejected: {}", reason),
            Self::Absent => f.write_str("absent"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Per-bucket result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketReport {
    pub name: String,
    pub role: Option<BucketRole>,
    pub status: BucketStatus,
    /// Current objects deleted (or found, on a dry run).
    pub objects: usize,
    pub versions: usize,
    pub delete_markers: usize,
    pub errors: Vec<String>,
}

impl BucketReport {
    fn new(name: &str, role: Option<BucketRole>, status: BucketStatus) -> Self {
        Self {
            name: name.to_string(),
            role,
            status,
            objects: 0,
            versions: 0,
            delete_markers: 0,
            errors: Vec::new(),
        }
    }
}

/// Result of a cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub buckets: Vec<BucketReport>,
    pub dry_run: bool,
}

impl CleanupReport {
    /// Names of buckets that could not be fully emptied.
    pub fn failed(&self) -> Vec<String> {
        self.with_status(|s| matches!(s, BucketStatus::Failed))
    }

    pub fn rejected(&self) -> Vec<String> {
        self.with_status(|s| matches!(s, BucketStatus::Rejected { .. }))
    }

    pub fn emptied(&self) -> Vec<String> {
        self.with_status(|s| matches!(s, BucketStatus::Emptied))
    }

    /// No bucket failed.
    pub fn is_clean(&self) -> bool {
        self.failed().is_empty()
    }

    /// `Err(BucketsFailed)` if any bucket failed.
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failed();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(CleanupError::BucketsFailed { buckets: failed }.into())
        }
    }

    fn with_status(&self, pred: impl Fn(&BucketStatus) -> bool) -> Vec<String> {
        self.buckets
            .iter()
            .filter(|b| pred(&b.status))
            .map(|b| b.name.clone())
            .collect()
    }
}

/// Asks the operator to approve deletion.
pub trait Confirm {
    /// `targets` are the validated, existing buckets about to be emptied.
    fn confirm(&self, targets: &[String]) -> Result<bool>;
}

/// Always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&self, _targets: &[String]) -> Result<bool> {
        Ok(self.0)
    }
}

/// Run options.
#[derive(Debug, Clone, Default)]
pub struct CleanupOptions {
    /// Enumerate only; issue no delete calls and skip confirmation.
    pub dry_run: bool,
    /// Extra candidate names from the operator. Validated like the rest.
    pub extra: Vec<String>,
}

/// The cleanup operator.
pub struct Cleanup<'a> {
    objects: &'a dyn ObjectStore,
    params: &'a dyn ParameterStore,
    confirm: &'a dyn Confirm,
}

impl<'a> Cleanup<'a> {
    pub fn new(
        objects: &'a dyn ObjectStore,
        params: &'a dyn ParameterStore,
        confirm: &'a dyn Confirm,
    ) -> Self {
        Self {
            objects,
            params,
            confirm,
        }
    }

    /// Candidate bucket names, deduplicated, in discovery order.
    ///
    /// Candidates are not validated here.
    pub fn discover(&self, resolved: &Resolved, extra: &[String]) -> Result<Vec<String>> {
        let mut found: Vec<String> = Vec::new();
        let mut add = |name: String| {
            if !name.is_empty() && !found.contains(&name) {
                found.push(name);
            }
        };

        for role in BucketRole::ALL {
            let path = resolved.prefix.parameter_path(role.parameter());
            if let Some(name) = self.params.get_parameter(&path)? {
                debug!(path = %path, bucket = %name, "bucket from published parameter");
                add(name);
            }
        }

        let stems: Vec<String> = BucketRole::ALL
            .iter()
            .map(|r| resolved.prefix.bucket_stem(*r))
            .collect();
        for name in self.objects.list_buckets()? {
            if stems.iter().any(|s| name.starts_with(s.as_str())) {
                debug!(bucket = %name, "bucket from account listing");
                add(name);
            }
        }

        for name in extra {
            add(name.trim().to_string());
        }
        Ok(found)
    }

    /// Discover, validate, confirm and empty.
    ///
    /// # Errors
    ///
    /// Returns `CleanupError::Cancelled` if the operator declines. Store
    /// failures during discovery propagate; failures while emptying are
    /// recorded per bucket instead.
    pub fn run(&self, resolved: &Resolved, options: &CleanupOptions) -> Result<CleanupReport> {
        let pattern = resolved.prefix.bucket_pattern()?;
        let mut report = CleanupReport {
            buckets: Vec::new(),
            dry_run: options.dry_run,
        };
        let mut targets: Vec<(String, BucketRole)> = Vec::new();

        for name in self.discover(resolved, &options.extra)? {
            let Some(role) = pattern.classify(&name) else {
                let reason = format!("does not match {}", pattern.as_str());
                warn!(bucket = %name, "rejected bucket outside managed pattern");
                report
                    .buckets
                    .push(BucketReport::new(&name, None, BucketStatus::Rejected { reason }));
                continue;
            };
            match self.objects.bucket_exists(&name) {
                Ok(true) => targets.push((name, role)),
                Ok(false) => {
                    debug!(bucket = %name, "bucket already absent");
                    report
                        .buckets
                        .push(BucketReport::new(&name, Some(role), BucketStatus::Absent));
                }
                Err(e) => {
                    warn!(bucket = %name, error = %e, "cannot check bucket");
                    let mut bucket = BucketReport::new(&name, Some(role), BucketStatus::Failed);
                    bucket.errors.push(e.to_string());
                    report.buckets.push(bucket);
                }
            }
        }

        if targets.is_empty() {
            info!(prefix = %resolved.prefix, "no managed buckets to empty");
            return Ok(report);
        }

        if options.dry_run {
            for (name, role) in &targets {
                report.buckets.push(self.survey(name, *role));
            }
            return Ok(report);
        }

        let names: Vec<String> = targets.iter().map(|(n, _)| n.clone()).collect();
        if !self.confirm.confirm(&names)? {
            info!("cleanup declined");
            return Err(CleanupError::Cancelled.into());
        }

        for (name, role) in &targets {
            let bucket = self.empty(name, *role);
            match bucket.status {
                BucketStatus::Emptied => info!(
                    bucket = %name,
                    objects = bucket.objects,
                    versions = bucket.versions,
                    delete_markers = bucket.delete_markers,
                    "bucket emptied"
                ),
                _ => warn!(bucket = %name, errors = bucket.errors.len(), "bucket not fully emptied"),
            }
            report.buckets.push(bucket);
        }
        Ok(report)
    }

    /// Count what would be deleted.
    fn survey(&self, name: &str, role: BucketRole) -> BucketReport {
        let mut bucket = BucketReport::new(name, Some(role), BucketStatus::WouldEmpty);
        match self.objects.list_objects(name) {
            Ok(keys) => bucket.objects = keys.len(),
            Err(e) => bucket.errors.push(e.to_string()),
        }
        match self.objects.list_object_versions(name) {
            Ok(listing) => {
                bucket.versions = listing.versions.len();
                bucket.delete_markers = listing.delete_markers.len();
            }
            Err(e) => bucket.errors.push(e.to_string()),
        }
        bucket
    }

    fn empty(&self, name: &str, role: BucketRole) -> BucketReport {
        let mut bucket = BucketReport::new(name, Some(role), BucketStatus::Emptied);

        debug!(bucket = %name, phase = %Phase::Objects, "emptying");
        match self.objects.list_objects(name) {
            Ok(keys) => {
                for key in keys {
                    match self.objects.delete_object(name, &key) {
                        Ok(()) => bucket.objects += 1,
                        Err(e) => bucket.errors.push(e.to_string()),
                    }
                }
            }
            Err(e) => bucket.errors.push(e.to_string()),
        }

        // Markers are listed after versions are gone, which also picks up
        // the markers created by the object phase.
        for phase in [Phase::Versions, Phase::DeleteMarkers] {
            debug!(bucket = %name, phase = %phase, "emptying");
            let listing = match self.objects.list_object_versions(name) {
                Ok(listing) => listing,
                Err(e) => {
                    bucket.errors.push(e.to_string());
                    continue;
                }
            };
            let entries = match phase {
                Phase::DeleteMarkers => listing.delete_markers,
                _ => listing.versions,
            };
            for entry in entries {
                match self
                    .objects
                    .delete_object_version(name, &entry.key, &entry.version_id)
                {
                    Ok(()) if phase == Phase::DeleteMarkers => bucket.delete_markers += 1,
                    Ok(()) => bucket.versions += 1,
                    Err(e) => bucket.errors.push(e.to_string()),
                }
            }
        }

        if !bucket.errors.is_empty() {
            bucket.status = BucketStatus::Failed;
        }
        bucket
    }
}
