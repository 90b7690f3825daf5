//! Step sequencing.
//!
//! Deploy and teardown are fixed plans of [`Step`]s. Each step declares
//! what must hold before it runs; the sequencer checks that, runs the
//! step, and stops at the first failure with the step and environment
//! attached to the error.

use std::fmt;

use tracing::{debug, info};

use crate::core::cleanup::{Cleanup, CleanupOptions, CleanupReport, Confirm};
use crate::core::domain::ParameterKey;
use crate::core::publisher::{PublishReport, Publisher};
use crate::core::resolver::Resolved;
use crate::core::stage::{AppStage, ApplyOutcome, InfraOutputs, InfraStage, TeardownOutcome};
use crate::core::store::{ObjectStore, ParameterStore, SecretStore};
use crate::error::{Result, StageError};

/// A unit of work in a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    InfraApply,
    Publish,
    AppBuild,
    AppDeploy,
    AppDestroy,
    Cleanup,
    InfraDestroy,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InfraApply => "infra-apply",
            Self::Publish => "publish",
            Self::AppBuild => "app-build",
            Self::AppDeploy => "app-deploy",
            Self::AppDestroy => "app-destroy",
            Self::Cleanup => "cleanup",
            Self::InfraDestroy => "infra-destroy",
        }
    }

    /// What must hold before this step may run.
    pub fn preconditions(&self) -> &'static [Precondition] {
        match self {
            Self::Publish => &[Precondition::InfraOutputs],
            Self::AppDeploy => &[Precondition::PublishedParameters],
            _ => &[],
        }
    }

    /// Whether the step deletes anything.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::AppDestroy | Self::Cleanup | Self::InfraDestroy)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A condition checked before a step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Infrastructure outputs can be read.
    InfraOutputs,
    /// Every parameter the application needs is published.
    PublishedParameters,
}

/// How a step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// Already in the desired state.
    Unchanged,
    /// Nothing existed to tear down.
    Absent,
    /// Not executed (dry run).
    Skipped,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Done => "done",
            Self::Unchanged => "unchanged",
            Self::Absent => "already absent",
            Self::Skipped => "skipped",
        })
    }
}

/// Full deploy.
pub const DEPLOY: &[Step] = &[Step::InfraApply, Step::Publish, Step::AppBuild, Step::AppDeploy];

/// Infrastructure only, including publishing.
pub const DEPLOY_INFRA: &[Step] = &[Step::InfraApply, Step::Publish];

/// Application only. Needs published parameters.
pub const DEPLOY_APP: &[Step] = &[Step::AppBuild, Step::AppDeploy];

/// Teardown, application first.
pub const DESTROY: &[Step] = &[Step::AppDestroy, Step::Cleanup, Step::InfraDestroy];

/// Everything a plan may touch.
pub struct Stages<'a> {
    pub infra: &'a dyn InfraStage,
    pub app: &'a dyn AppStage,
    pub params: &'a dyn ParameterStore,
    pub secrets: &'a dyn SecretStore,
    pub objects: &'a dyn ObjectStore,
    pub confirm: &'a dyn Confirm,
}

/// Progress callbacks.
pub trait Observer {
    fn started(&self, _step: Step) {}
    fn finished(&self, _step: Step, _outcome: Outcome) {}
    fn failed(&self, _step: Step) {}
    /// Called with the cleanup report, including when it fails the step.
    fn cleanup(&self, _report: &CleanupReport) {}
}

/// What a run did.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub steps: Vec<(Step, Outcome)>,
    pub publish: Option<PublishReport>,
    pub cleanup: Option<CleanupReport>,
}

impl RunReport {
    pub fn outcome(&self, step: Step) -> Option<Outcome> {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, o)| *o)
    }
}

/// Runs plans for one resolved environment.
pub struct Sequencer<'a> {
    stages: Stages<'a>,
    resolved: &'a Resolved,
    cleanup: CleanupOptions,
    observer: Option<&'a dyn Observer>,
}

/// Per-run state carried between steps.
#[derive(Default)]
struct Context {
    outputs: Option<InfraOutputs>,
    report: RunReport,
}

impl<'a> Sequencer<'a> {
    pub fn new(stages: Stages<'a>, resolved: &'a Resolved) -> Self {
        Self {
            stages,
            resolved,
            cleanup: CleanupOptions::default(),
            observer: None,
        }
    }

    /// Options for the cleanup step. A dry run also skips both destroys.
    pub fn with_cleanup_options(mut self, options: CleanupOptions) -> Self {
        self.cleanup = options;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run `plan` in order, halting at the first failure.
    ///
    /// # Errors
    ///
    /// The failing step's error wrapped in `Error::Step`.
    pub fn run(&self, plan: &[Step]) -> Result<RunReport> {
        let environment = self.resolved.environment.to_string();
        let mut ctx = Context::default();

        let names: Vec<&str> = plan.iter().map(Step::name).collect();
        info!(prefix = %self.resolved.prefix, steps = %names.join(","), "starting run");

        for &step in plan {
            if let Some(observer) = self.observer {
                observer.started(step);
            }
            let outcome = match self
                .check(step, &mut ctx)
                .and_then(|()| self.execute(step, &mut ctx))
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    if let Some(observer) = self.observer {
                        observer.failed(step);
                    }
                    return Err(e.in_step(step, environment));
                }
            };

            info!(step = %step, outcome = %outcome, "step finished");
            if let Some(observer) = self.observer {
                observer.finished(step, outcome);
            }
            ctx.report.steps.push((step, outcome));
        }
        Ok(ctx.report)
    }

    fn check(&self, step: Step, ctx: &mut Context) -> Result<()> {
        for condition in step.preconditions() {
            debug!(step = %step, condition = ?condition, "checking precondition");
            match condition {
                Precondition::InfraOutputs => {
                    if ctx.outputs.is_none() {
                        ctx.outputs = Some(self.stages.infra.outputs(self.resolved)?);
                    }
                }
                Precondition::PublishedParameters => {
                    for key in ParameterKey::REQUIRED_BY_APP {
                        let path = self.resolved.prefix.parameter_path(key);
                        let present = self
                            .stages
                            .params
                            .get_parameter(&path)?
                            .is_some_and(|v| !v.trim().is_empty());
                        if !present {
                            return Err(StageError::MissingPublishedParameter { path }.into());
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn execute(&self, step: Step, ctx: &mut Context) -> Result<Outcome> {
        let resolved = self.resolved;
        let dry_run = self.cleanup.dry_run;

        match step {
            Step::InfraApply => {
                let outcome = self.stages.infra.apply(resolved)?;
                // Outputs may have changed; re-read them for publishing.
                ctx.outputs = None;
                Ok(match outcome {
                    ApplyOutcome::Applied => Outcome::Done,
                    ApplyOutcome::Unchanged => Outcome::Unchanged,
                })
            }
            Step::Publish => {
                let outputs = match ctx.outputs.take() {
                    Some(outputs) => outputs,
                    None => self.stages.infra.outputs(resolved)?,
                };
                let report = Publisher::new(self.stages.params, self.stages.secrets)
                    .publish(resolved, &outputs)?;
                ctx.report.publish = Some(report);
                Ok(Outcome::Done)
            }
            Step::AppBuild => {
                self.stages.app.build()?;
                Ok(Outcome::Done)
            }
            Step::AppDeploy => {
                self.stages.app.deploy(resolved, self.stages.params)?;
                Ok(Outcome::Done)
            }
            Step::AppDestroy if dry_run => Ok(Outcome::Skipped),
            Step::AppDestroy => Ok(teardown(self.stages.app.destroy(resolved)?)),
            Step::Cleanup => {
                let report = Cleanup::new(self.stages.objects, self.stages.params, self.stages.confirm)
                    .run(resolved, &self.cleanup)?;
                if let Some(observer) = self.observer {
                    observer.cleanup(&report);
                }
                ctx.report.cleanup = Some(report.clone());
                let report = report.into_result()?;
                Ok(if dry_run {
                    Outcome::Skipped
                } else if report.emptied().is_empty() {
                    Outcome::Absent
                } else {
                    Outcome::Done
                })
            }
            Step::InfraDestroy if dry_run => Ok(Outcome::Skipped),
            Step::InfraDestroy => Ok(teardown(self.stages.infra.destroy(resolved)?)),
        }
    }
}

fn teardown(outcome: TeardownOutcome) -> Outcome {
    match outcome {
        TeardownOutcome::Destroyed => Outcome::Done,
        TeardownOutcome::Absent => Outcome::Absent,
    }
}
