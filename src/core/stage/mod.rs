//! Stage drivers.
//!
//! The infrastructure stage is Terraform, the application stage is SAM.
//! Both are driven through the [`Runner`](crate::core::runner::Runner)
//! seam and exposed behind traits so the sequencer can run against fakes.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::core::resolver::Resolved;
use crate::core::store::ParameterStore;
use crate::error::{Result, StageError};

pub mod sam;
pub mod terraform;

pub use sam::Sam;
pub use terraform::Terraform;

/// Result of applying a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Changes were made.
    Applied,
    /// Already in the desired state; nothing was run.
    Unchanged,
}

/// Result of tearing a stage down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownOutcome {
    Destroyed,
    /// Nothing existed to destroy.
    Absent,
}

/// Terraform outputs, by name.
///
/// Values may include sensitive outputs, so `Debug` only lists names.
#[derive(Clone, Default, PartialEq)]
pub struct InfraOutputs(BTreeMap<String, Value>);

impl InfraOutputs {
    /// Parse `terraform output -json`.
    ///
    /// The tool prints `{"name": {"sensitive": .., "type": .., "value": ..}}`;
    /// only the values are kept.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, Value> =
            serde_json::from_str(json).map_err(StageError::Outputs)?;
        let values = raw
            .into_iter()
            .map(|(name, entry)| {
                let value = match entry {
                    Value::Object(mut fields) if fields.contains_key("value") => {
                        fields.remove("value").unwrap_or(Value::Null)
                    }
                    other => other,
                };
                (name, value)
            })
            .collect();
        Ok(Self(values))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// A scalar output as a string. Numbers and booleans are stringified.
    pub fn get_str(&self, name: &str) -> Option<String> {
        match self.0.get(name)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// A list output. A comma-separated string is accepted too.
    pub fn get_list(&self, name: &str) -> Option<Vec<String>> {
        match self.0.get(name)? {
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            Value::String(s) if !s.is_empty() => {
                Some(s.split(',').map(|p| p.trim().to_string()).collect())
            }
            _ => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for InfraOutputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// The infrastructure stage.
pub trait InfraStage {
    /// Bring infrastructure to the desired state. Repeating with no config
    /// change returns [`ApplyOutcome::Unchanged`].
    fn apply(&self, resolved: &Resolved) -> Result<ApplyOutcome>;

    /// Current outputs.
    ///
    /// # Errors
    ///
    /// `StageError::StateUnavailable` if there is no state or no outputs.
    fn outputs(&self, resolved: &Resolved) -> Result<InfraOutputs>;

    fn destroy(&self, resolved: &Resolved) -> Result<TeardownOutcome>;
}

/// The application stage.
pub trait AppStage {
    /// Build artifacts. Environment-independent.
    fn build(&self) -> Result<()>;

    /// Deploy, reading inputs only from published parameters.
    fn deploy(&self, resolved: &Resolved, params: &dyn ParameterStore) -> Result<()>;

    /// Delete the stack and wait until it is gone.
    fn destroy(&self, resolved: &Resolved) -> Result<TeardownOutcome>;
}
