//! `rigger deploy`, `deploy-infra`, `deploy-app`

use crate::cli::progress::StepProgress;
use crate::cli::{output, Context, Global};
use crate::core::cleanup::FixedAnswer;
use crate::core::lock::DeployLock;
use crate::core::runner::SystemRunner;
use crate::core::sequencer::{Outcome, Sequencer, Stages, Step};
use crate::core::stage::{Sam, Terraform};
use crate::core::store::AwsClients;
use crate::error::Result;

/// Run a deploy plan for the resolved environment.
pub fn execute(global: &Global, plan: &[Step], title: &str) -> Result<()> {
    let ctx = Context::load(global)?;
    let resolved = &ctx.resolved;
    let _lock = DeployLock::acquire(&ctx.settings.state_dir(), &resolved.prefix)?;

    output::section(&format!("{} {}", title, resolved.prefix));
    output::kv("region", &resolved.region);
    println!();

    let aws = AwsClients::connect(&resolved.region, ctx.settings.aws.profile.as_deref())?;
    let runner = SystemRunner;
    let terraform = Terraform::new(&runner, &ctx.settings);
    let sam = Sam::new(&runner, &aws, &ctx.settings);
    // Deploy plans contain no cleanup step.
    let confirm = FixedAnswer(false);

    let stages = Stages {
        infra: &terraform,
        app: &sam,
        params: &aws,
        secrets: &aws,
        objects: &aws,
        confirm: &confirm,
    };
    let progress = StepProgress;
    let report = Sequencer::new(stages, resolved)
        .with_observer(&progress)
        .run(plan)?;

    println!();
    if let Some(publish) = &report.publish {
        output::kv("parameters", format!("{} under {}", publish.written.len(), resolved.prefix.parameter_root()));
        output::kv("secret", &publish.secret);
    }
    if report.outcome(Step::AppDeploy) == Some(Outcome::Done) {
        output::kv("stack", resolved.prefix.stack_name());
    }
    output::success(&format!("{} complete", title.to_lowercase()));
    Ok(())
}
