//! Status overview command.

use console::style;

use crate::cli::{output, Context, Global};
use crate::core::domain::ParameterKey;
use crate::core::runner::SystemRunner;
use crate::core::stage::Terraform;
use crate::core::store::{AwsClients, ParameterStore, SecretStore, StackInspector};
use crate::error::{Error, Result, StageError};

/// Show what exists for the resolved environment.
pub fn execute(global: &Global) -> Result<()> {
    let ctx = Context::load(global)?;
    let resolved = &ctx.resolved;
    let aws = AwsClients::connect(&resolved.region, ctx.settings.aws.profile.as_deref())?;

    output::section(&format!("Status {}", resolved.prefix));
    output::kv("region", &resolved.region);

    let runner = SystemRunner;
    let terraform = Terraform::new(&runner, &ctx.settings);
    let infra = match terraform.read_outputs(resolved) {
        Ok(outputs) => format!("{} available", output::plural(outputs.len(), "output")),
        Err(Error::Stage(StageError::StateUnavailable { .. })) => "not deployed".to_string(),
        Err(Error::Stage(StageError::ToolNotFound { tool })) => format!("{} not installed", tool),
        Err(e) => return Err(e),
    };
    output::kv("infra", infra);

    let stack = resolved.prefix.stack_name();
    let stack_status = aws
        .stack_status(&stack)?
        .unwrap_or_else(|| "not deployed".to_string());
    output::kv("stack", format!("{} ({})", stack, stack_status));

    let secret = resolved.prefix.secret_name();
    let stored = if aws.secret_exists(&secret)? {
        "stored"
    } else {
        "missing"
    };
    output::kv("secret", format!("{} ({})", secret, stored));

    output::section("Parameters");
    let published = aws.parameters_by_path(&resolved.prefix.parameter_root())?;
    let mut missing = 0;
    for key in ParameterKey::ALL {
        let path = resolved.prefix.parameter_path(key);
        match published.get(&path) {
            Some(value) => println!("  {} {}  {}", style("✓").green(), path, style(value).dim()),
            None => {
                missing += 1;
                println!("  {} {}", style("✗").red(), path);
            }
        }
    }

    if missing > 0 {
        println!();
        output::warn(&format!("{} not published", output::plural(missing, "parameter")));
        output::hint(&format!(
            "run: {}",
            output::cmd(&format!("rigger deploy-infra -e {}", resolved.environment))
        ));
    }
    Ok(())
}
