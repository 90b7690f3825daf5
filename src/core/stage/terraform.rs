//! Terraform infrastructure stage.
//!
//! Each environment gets its own workspace. Applies go through a saved
//! plan so that a clean plan (`-detailed-exitcode` 0) skips apply entirely.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{ApplyOutcome, InfraOutputs, InfraStage, TeardownOutcome};
use crate::core::config::Settings;
use crate::core::resolver::Resolved;
use crate::core::runner::{Invocation, Runner, ToolOutput};
use crate::error::{Result, StageError};

/// `plan -detailed-exitcode`: succeeded, diff present.
const PLAN_HAS_CHANGES: i32 = 2;

/// Diagnostics meaning there is nothing left to destroy.
const ABSENT_MARKERS: &[&str] = &[
    "no state file was found",
    "doesn't exist",
    "does not exist",
];

/// Drives the `terraform` binary.
pub struct Terraform<'a> {
    runner: &'a dyn Runner,
    program: String,
    infra_dir: PathBuf,
    plan_dir: PathBuf,
}

impl<'a> Terraform<'a> {
    pub fn new(runner: &'a dyn Runner, settings: &Settings) -> Self {
        Self {
            runner,
            program: settings.tools.terraform.clone(),
            infra_dir: settings.infra_dir(),
            plan_dir: settings.state_dir(),
        }
    }

    fn run<I, S>(&self, args: I) -> Result<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner
            .run(&Invocation::new(&self.program, &self.infra_dir).args(args))
    }

    /// `-var-file` and `-var` arguments shared by plan and destroy.
    fn variable_args(&self, resolved: &Resolved) -> Vec<String> {
        let file = resolved.variable_file();
        let file = file
            .strip_prefix(&self.infra_dir)
            .map(Path::to_path_buf)
            .unwrap_or(file);
        vec![
            format!("-var-file={}", file.display()),
            format!("-var=project_name={}", resolved.project()),
            format!("-var=environment={}", resolved.environment),
        ]
    }

    fn init(&self) -> Result<ToolOutput> {
        self.run(["init", "-input=false", "-no-color"])
    }

    fn select_workspace(&self, resolved: &Resolved, create: bool) -> Result<ToolOutput> {
        let mut args = vec!["workspace".to_string(), "select".to_string()];
        if create {
            args.push("-or-create=true".to_string());
        }
        args.push(resolved.environment.to_string());
        self.run(args)
    }

    /// Read outputs without touching the working directory: no `init`, and
    /// the workspace comes from `TF_WORKSPACE` rather than `workspace select`.
    pub fn read_outputs(&self, resolved: &Resolved) -> Result<InfraOutputs> {
        let output = self.runner.run(
            &Invocation::new(&self.program, &self.infra_dir)
                .args(["output", "-json", "-no-color"])
                .env("TF_WORKSPACE", resolved.environment.to_string()),
        )?;
        parse_outputs(resolved, &output)
    }

    /// Whether `state list` in the selected workspace shows nothing.
    fn state_is_empty(&self) -> Result<bool> {
        let state = self.run(["state", "list"])?;
        Ok(state.success() && state.stdout.trim().is_empty())
    }

    fn plan_file(&self, resolved: &Resolved) -> PathBuf {
        self.plan_dir.join(format!("{}.tfplan", resolved.prefix))
    }
}

fn is_absent(output: &ToolOutput) -> bool {
    ABSENT_MARKERS.iter().any(|m| output.mentions(m))
}

fn parse_outputs(resolved: &Resolved, output: &ToolOutput) -> Result<InfraOutputs> {
    let unavailable = |reason: String| StageError::StateUnavailable {
        environment: resolved.environment.to_string(),
        reason,
    };
    if !output.success() {
        return Err(unavailable(output.diagnostic()).into());
    }
    let outputs = InfraOutputs::from_json(&output.stdout)?;
    if outputs.is_empty() {
        return Err(unavailable("no outputs; has the infrastructure been applied?".into()).into());
    }
    debug!(count = outputs.len(), "read terraform outputs");
    Ok(outputs)
}

impl InfraStage for Terraform<'_> {
    fn apply(&self, resolved: &Resolved) -> Result<ApplyOutcome> {
        let failed = |output: &ToolOutput| StageError::InfraApplyFailed {
            environment: resolved.environment.to_string(),
            diagnostic: output.diagnostic(),
        };

        let init = self.init()?;
        if !init.success() {
            return Err(failed(&init).into());
        }
        let workspace = self.select_workspace(resolved, true)?;
        if !workspace.success() {
            return Err(failed(&workspace).into());
        }

        std::fs::create_dir_all(&self.plan_dir)?;
        let plan_file = self.plan_file(resolved);

        let mut args = vec![
            "plan".to_string(),
            "-detailed-exitcode".to_string(),
            "-input=false".to_string(),
            "-no-color".to_string(),
            format!("-out={}", plan_file.display()),
        ];
        args.extend(self.variable_args(resolved));
        let plan = self.run(args)?;

        match plan.code {
            Some(0) => {
                info!(prefix = %resolved.prefix, "infrastructure unchanged");
                let _ = std::fs::remove_file(&plan_file);
                Ok(ApplyOutcome::Unchanged)
            }
            Some(PLAN_HAS_CHANGES) => {
                debug!(plan = %plan_file.display(), "plan has changes, applying");
                let apply = self.run([
                    "apply".to_string(),
                    "-input=false".to_string(),
                    "-no-color".to_string(),
                    plan_file.display().to_string(),
                ])?;
                let _ = std::fs::remove_file(&plan_file);
                if !apply.success() {
                    return Err(failed(&apply).into());
                }
                info!(prefix = %resolved.prefix, "infrastructure applied");
                Ok(ApplyOutcome::Applied)
            }
            _ => Err(failed(&plan).into()),
        }
    }

    fn outputs(&self, resolved: &Resolved) -> Result<InfraOutputs> {
        let unavailable = |reason: String| StageError::StateUnavailable {
            environment: resolved.environment.to_string(),
            reason,
        };

        let init = self.init()?;
        if !init.success() {
            return Err(unavailable(init.diagnostic()).into());
        }
        let workspace = self.select_workspace(resolved, false)?;
        if !workspace.success() {
            return Err(unavailable(workspace.diagnostic()).into());
        }

        let output = self.run(["output", "-json", "-no-color"])?;
        parse_outputs(resolved, &output)
    }

    fn destroy(&self, resolved: &Resolved) -> Result<TeardownOutcome> {
        let target = format!("infrastructure {}", resolved.prefix);
        let failed = |output: &ToolOutput| StageError::DestroyFailed {
            target: target.clone(),
            diagnostic: output.diagnostic(),
        };

        let init = self.init()?;
        if !init.success() {
            return Err(failed(&init).into());
        }

        let workspace = self.select_workspace(resolved, false)?;
        if !workspace.success() {
            if is_absent(&workspace) {
                info!(prefix = %resolved.prefix, "no workspace, infrastructure already absent");
                return Ok(TeardownOutcome::Absent);
            }
            return Err(failed(&workspace).into());
        }

        let state = self.run(["state", "list"])?;
        if state.success() && state.stdout.trim().is_empty() {
            info!(prefix = %resolved.prefix, "state is empty, infrastructure already absent");
            return Ok(TeardownOutcome::Absent);
        }
        if !state.success() && is_absent(&state) {
            return Ok(TeardownOutcome::Absent);
        }

        let mut args = vec![
            "destroy".to_string(),
            "-auto-approve".to_string(),
            "-input=false".to_string(),
            "-no-color".to_string(),
        ];
        args.extend(self.variable_args(resolved));
        let destroy = self.run(args)?;

        if destroy.success() {
            info!(prefix = %resolved.prefix, "infrastructure destroyed");
            return Ok(TeardownOutcome::Destroyed);
        }
        // A failed destroy only counts as absent if nothing is left in state.
        if is_absent(&destroy) && self.state_is_empty()? {
            info!(prefix = %resolved.prefix, "infrastructure already absent");
            return Ok(TeardownOutcome::Absent);
        }
        Err(failed(&destroy).into())
    }
}
