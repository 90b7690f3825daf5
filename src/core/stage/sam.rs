//! SAM application stage.
//!
//! Deploy inputs come only from the published parameter tree, never from
//! Terraform, so the application stage can be redeployed on its own.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use super::{AppStage, TeardownOutcome};
use crate::core::config::Settings;
use crate::core::domain::ParameterKey;
use crate::core::resolver::Resolved;
use crate::core::runner::{Invocation, Runner, ToolOutput};
use crate::core::store::{ParameterStore, StackInspector};
use crate::error::{Result, StageError};

const DELETE_FAILED: &str = "DELETE_FAILED";

/// Drives the `sam` binary.
pub struct Sam<'a> {
    runner: &'a dyn Runner,
    stacks: &'a dyn StackInspector,
    program: String,
    app_dir: PathBuf,
    poll_interval: Duration,
    max_polls: u32,
}

impl<'a> Sam<'a> {
    pub fn new(runner: &'a dyn Runner, stacks: &'a dyn StackInspector, settings: &Settings) -> Self {
        Self {
            runner,
            stacks,
            program: settings.tools.sam.clone(),
            app_dir: settings.app_dir(),
            poll_interval: settings.destroy.poll_interval(),
            max_polls: settings.destroy.max_polls,
        }
    }

    /// Override the stack-delete polling schedule.
    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls.max(1);
        self
    }

    fn run<I, S>(&self, args: I) -> Result<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner
            .run(&Invocation::new(&self.program, &self.app_dir).args(args))
    }

    /// Poll until the stack is gone.
    fn wait_for_delete(&self, stack: &str) -> Result<()> {
        let mut last = String::new();
        for attempt in 1..=self.max_polls {
            match self.stacks.stack_status(stack)? {
                None => {
                    debug!(stack, attempt, "stack gone");
                    return Ok(());
                }
                Some(status) if status == DELETE_FAILED => {
                    return Err(StageError::DestroyFailed {
                        target: format!("stack {}", stack),
                        diagnostic: format!("stack status is {}", status),
                    }
                    .into());
                }
                Some(status) => {
                    debug!(stack, attempt, status = %status, "waiting for stack delete");
                    last = status;
                }
            }
            if attempt < self.max_polls {
                thread::sleep(self.poll_interval);
            }
        }
        Err(StageError::DestroyFailed {
            target: format!("stack {}", stack),
            diagnostic: format!("still {} after {} polls", last, self.max_polls),
        }
        .into())
    }
}

impl AppStage for Sam<'_> {
    fn build(&self) -> Result<()> {
        let output = self.run(["build"])?;
        if !output.success() {
            return Err(StageError::BuildFailed {
                diagnostic: output.diagnostic(),
            }
            .into());
        }
        info!("application built");
        Ok(())
    }

    fn deploy(&self, resolved: &Resolved, params: &dyn ParameterStore) -> Result<()> {
        let path = resolved.prefix.parameter_path(ParameterKey::LambdaCodeBucket);
        let bucket = params
            .get_parameter(&path)?
            .filter(|v| !v.trim().is_empty())
            .ok_or(StageError::MissingPublishedParameter { path })?;

        let stack = resolved.prefix.stack_name();
        let output = self.run([
            "deploy".to_string(),
            "--stack-name".to_string(),
            stack.clone(),
            "--s3-bucket".to_string(),
            bucket,
            "--region".to_string(),
            resolved.region.clone(),
            "--capabilities".to_string(),
            "CAPABILITY_IAM".to_string(),
            "CAPABILITY_NAMED_IAM".to_string(),
            "--no-confirm-changeset".to_string(),
            "--no-fail-on-empty-changeset".to_string(),
            "--parameter-overrides".to_string(),
            format!("Environment={}", resolved.environment),
            format!("ProjectName={}", resolved.project()),
        ])?;

        if !output.success() {
            return Err(StageError::DeployFailed {
                environment: resolved.environment.to_string(),
                diagnostic: output.diagnostic(),
            }
            .into());
        }
        info!(stack = %stack, "application deployed");
        Ok(())
    }

    fn destroy(&self, resolved: &Resolved) -> Result<TeardownOutcome> {
        let stack = resolved.prefix.stack_name();
        let Some(status) = self.stacks.stack_status(&stack)? else {
            info!(stack = %stack, "stack already absent");
            return Ok(TeardownOutcome::Absent);
        };
        debug!(stack = %stack, status = %status, "deleting stack");

        let output = self.run([
            "delete",
            "--stack-name",
            stack.as_str(),
            "--region",
            resolved.region.as_str(),
            "--no-prompts",
        ])?;
        if !output.success() {
            // A nested resource can be missing while the stack remains.
            if output.mentions("does not exist") && self.stacks.stack_status(&stack)?.is_none() {
                info!(stack = %stack, "stack already absent");
                return Ok(TeardownOutcome::Absent);
            }
            return Err(StageError::DestroyFailed {
                target: format!("stack {}", stack),
                diagnostic: output.diagnostic(),
            }
            .into());
        }

        self.wait_for_delete(&stack)?;
        info!(stack = %stack, "application stack deleted");
        Ok(TeardownOutcome::Destroyed)
    }
}
