//! `rigger destroy` and `rigger cleanup`

use crate::cli::progress::{print_cleanup, StepProgress};
use crate::cli::prompt::{self, TerminalConfirm};
use crate::cli::{output, Context, Global};
use crate::core::cleanup::{Cleanup, CleanupOptions};
use crate::core::lock::DeployLock;
use crate::core::runner::SystemRunner;
use crate::core::sequencer::{self, Sequencer, Stages};
use crate::core::stage::{Sam, Terraform};
use crate::core::store::AwsClients;
use crate::error::{Error, Result};

/// Tear down the resolved environment.
pub fn execute(global: &Global, yes: bool, dry_run: bool) -> Result<()> {
    let ctx = Context::load(global)?;
    let resolved = &ctx.resolved;
    let _lock = DeployLock::acquire(&ctx.settings.state_dir(), &resolved.prefix)?;

    output::section(&format!("Destroy {}", resolved.prefix));
    output::kv("region", &resolved.region);
    output::kv("stack", resolved.prefix.stack_name());
    output::kv("parameters", resolved.prefix.parameter_root());
    if dry_run {
        output::dimmed("  dry run: nothing will be deleted");
    }
    println!();

    if !dry_run
        && !prompt::ask(
            &format!(
                "Destroy the application, buckets and infrastructure of {}?",
                resolved.prefix
            ),
            yes,
        )?
    {
        return Err(Error::Other(
            "destroy cancelled; pass --yes to skip confirmation".to_string(),
        ));
    }

    let aws = AwsClients::connect(&resolved.region, ctx.settings.aws.profile.as_deref())?;
    let runner = SystemRunner;
    let terraform = Terraform::new(&runner, &ctx.settings);
    let sam = Sam::new(&runner, &aws, &ctx.settings);
    let confirm = TerminalConfirm { assume_yes: yes };

    let stages = Stages {
        infra: &terraform,
        app: &sam,
        params: &aws,
        secrets: &aws,
        objects: &aws,
        confirm: &confirm,
    };
    let progress = StepProgress;
    Sequencer::new(stages, resolved)
        .with_cleanup_options(CleanupOptions {
            dry_run,
            extra: Vec::new(),
        })
        .with_observer(&progress)
        .run(sequencer::DESTROY)?;

    println!();
    if dry_run {
        output::success("dry run complete; nothing was deleted");
    } else {
        output::success(&format!("{} destroyed", resolved.prefix));
    }
    Ok(())
}

/// Empty the managed buckets without touching anything else.
pub fn cleanup(global: &Global, yes: bool, dry_run: bool, buckets: Vec<String>) -> Result<()> {
    let ctx = Context::load(global)?;
    let resolved = &ctx.resolved;
    let _lock = DeployLock::acquire(&ctx.settings.state_dir(), &resolved.prefix)?;

    output::section(&format!("Cleanup {}", resolved.prefix));
    output::kv("pattern", resolved.prefix.bucket_pattern()?.as_str());

    let aws = AwsClients::connect(&resolved.region, ctx.settings.aws.profile.as_deref())?;
    let confirm = TerminalConfirm { assume_yes: yes };
    let report = Cleanup::new(&aws, &aws, &confirm).run(
        resolved,
        &CleanupOptions {
            dry_run,
            extra: buckets,
        },
    )?;

    println!();
    print_cleanup(&report);
    let report = report.into_result()?;

    println!();
    if dry_run {
        output::success("dry run complete; nothing was deleted");
    } else {
        output::success(&format!(
            "{} emptied",
            output::plural(report.emptied().len(), "bucket")
        ));
    }
    Ok(())
}
