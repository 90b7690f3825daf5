//! In-process stage fakes.
//!
//! Every call is appended to a shared [`Journal`] so tests can assert on
//! ordering across stages and stores.

use std::cell::{Cell, RefCell};

use rigger::core::cleanup::FixedAnswer;
use rigger::core::resolver::Resolved;
use rigger::core::sequencer::Stages;
use rigger::core::stage::{AppStage, ApplyOutcome, InfraOutputs, InfraStage, TeardownOutcome};
use rigger::core::store::memory::{MemoryObjectStore, MemoryParameterStore, MemorySecretStore};
use rigger::core::store::{ObjectStore, ParameterStore};
use rigger::error::{Result, StageError};

/// Ordered record of stage calls.
#[derive(Debug, Default)]
pub struct Journal(RefCell<Vec<String>>);

impl Journal {
    pub fn record(&self, entry: &str) {
        self.0.borrow_mut().push(entry.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.borrow().iter().any(|e| e == entry)
    }
}

/// Terraform stand-in that behaves like a real workspace: the first apply
/// creates, later applies are no-ops, destroy empties it.
///
/// With [`FakeInfra::owning`] it also creates and removes the two managed
/// buckets, and destroy fails like Terraform does on a non-empty bucket.
pub struct FakeInfra<'a> {
    journal: &'a Journal,
    applied: Cell<bool>,
    fail_destroy: bool,
    objects: Option<&'a MemoryObjectStore>,
}

impl<'a> FakeInfra<'a> {
    pub fn new(journal: &'a Journal) -> Self {
        Self {
            journal,
            applied: Cell::new(false),
            fail_destroy: false,
            objects: None,
        }
    }

    /// Manage the fixture buckets in `objects`.
    pub fn owning(mut self, objects: &'a MemoryObjectStore) -> Self {
        self.objects = Some(objects);
        self
    }

    /// Start as already applied.
    pub fn applied(journal: &'a Journal) -> Self {
        let infra = Self::new(journal);
        infra.applied.set(true);
        infra
    }

    pub fn failing_destroy(mut self) -> Self {
        self.fail_destroy = true;
        self
    }
}

impl InfraStage for FakeInfra<'_> {
    fn apply(&self, _resolved: &Resolved) -> Result<ApplyOutcome> {
        self.journal.record("infra.apply");
        if let Some(objects) = self.objects {
            for bucket in [super::DOCUMENTS_BUCKET, super::LAMBDA_CODE_BUCKET] {
                if !objects.bucket_exists(bucket)? {
                    objects.create_bucket(bucket, true);
                }
            }
        }
        if self.applied.replace(true) {
            Ok(ApplyOutcome::Unchanged)
        } else {
            Ok(ApplyOutcome::Applied)
        }
    }

    fn outputs(&self, resolved: &Resolved) -> Result<InfraOutputs> {
        self.journal.record("infra.outputs");
        if !self.applied.get() {
            return Err(StageError::StateUnavailable {
                environment: resolved.environment.to_string(),
                reason: "no outputs".to_string(),
            }
            .into());
        }
        Ok(super::outputs())
    }

    fn destroy(&self, _resolved: &Resolved) -> Result<TeardownOutcome> {
        self.journal.record("infra.destroy");
        if self.fail_destroy {
            return Err(StageError::DestroyFailed {
                target: "infrastructure".to_string(),
                diagnostic: "Error: DependencyViolation".to_string(),
            }
            .into());
        }
        if let Some(objects) = self.objects {
            for bucket in [super::DOCUMENTS_BUCKET, super::LAMBDA_CODE_BUCKET] {
                if objects.bucket_exists(bucket)? && !objects.remove_bucket(bucket) {
                    return Err(StageError::DestroyFailed {
                        target: "infrastructure".to_string(),
                        diagnostic: format!("Error: deleting S3 Bucket ({}): BucketNotEmpty", bucket),
                    }
                    .into());
                }
            }
        }
        if self.applied.replace(false) {
            Ok(TeardownOutcome::Destroyed)
        } else {
            Ok(TeardownOutcome::Absent)
        }
    }
}

/// SAM stand-in. Deploy reads the code bucket from the parameter store
/// exactly like the real driver.
pub struct FakeApp<'a> {
    journal: &'a Journal,
    deployed: Cell<bool>,
}

impl<'a> FakeApp<'a> {
    pub fn new(journal: &'a Journal) -> Self {
        Self {
            journal,
            deployed: Cell::new(false),
        }
    }

    pub fn deployed(journal: &'a Journal) -> Self {
        let app = Self::new(journal);
        app.deployed.set(true);
        app
    }
}

impl AppStage for FakeApp<'_> {
    fn build(&self) -> Result<()> {
        self.journal.record("app.build");
        Ok(())
    }

    fn deploy(&self, resolved: &Resolved, params: &dyn ParameterStore) -> Result<()> {
        self.journal.record("app.deploy");
        let path = resolved
            .prefix
            .parameter_path(rigger::core::domain::ParameterKey::LambdaCodeBucket);
        if params.get_parameter(&path)?.is_none() {
            return Err(StageError::MissingPublishedParameter { path }.into());
        }
        self.deployed.set(true);
        Ok(())
    }

    fn destroy(&self, _resolved: &Resolved) -> Result<TeardownOutcome> {
        self.journal.record("app.destroy");
        if self.deployed.replace(false) {
            Ok(TeardownOutcome::Destroyed)
        } else {
            Ok(TeardownOutcome::Absent)
        }
    }
}

/// In-memory AWS.
#[derive(Default)]
pub struct Cloud {
    pub params: MemoryParameterStore,
    pub secrets: MemorySecretStore,
    pub objects: MemoryObjectStore,
}

impl Cloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages<'a>(
        &'a self,
        infra: &'a dyn InfraStage,
        app: &'a dyn AppStage,
        confirm: &'a FixedAnswer,
    ) -> Stages<'a> {
        Stages {
            infra,
            app,
            params: &self.params,
            secrets: &self.secrets,
            objects: &self.objects,
            confirm,
        }
    }
}
