//! `rigger config`: the resolved configuration, without touching AWS.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cli::{output, Context, Global};
use crate::core::domain::{BucketRole, ParameterKey};
use crate::error::{Error, Result};

#[derive(Serialize)]
struct View {
    project: String,
    environment: String,
    prefix: String,
    region: String,
    variable_file: String,
    variables: BTreeMap<String, String>,
    parameters: Vec<String>,
    secret: String,
    stack: String,
    bucket_stems: Vec<String>,
    bucket_pattern: String,
    infra_dir: String,
    app_dir: String,
    lock_file: String,
}

fn view(ctx: &Context) -> Result<View> {
    let r = &ctx.resolved;
    Ok(View {
        project: r.project().to_string(),
        environment: r.environment.to_string(),
        prefix: r.prefix.to_string(),
        region: r.region.clone(),
        variable_file: r.variable_file().display().to_string(),
        variables: r
            .variables
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        parameters: ParameterKey::ALL
            .iter()
            .map(|k| r.prefix.parameter_path(*k))
            .collect(),
        secret: r.prefix.secret_name(),
        stack: r.prefix.stack_name(),
        bucket_stems: BucketRole::ALL
            .iter()
            .map(|role| format!("{}*", r.prefix.bucket_stem(*role)))
            .collect(),
        bucket_pattern: r.prefix.bucket_pattern()?.as_str().to_string(),
        infra_dir: ctx.settings.infra_dir().display().to_string(),
        app_dir: ctx.settings.app_dir().display().to_string(),
        lock_file: ctx
            .settings
            .state_dir()
            .join(format!("{}.lock", r.prefix))
            .display()
            .to_string(),
    })
}

/// Print the resolved configuration.
pub fn execute(global: &Global, json: bool) -> Result<()> {
    let ctx = Context::load(global)?;
    let view = view(&ctx)?;

    if json {
        let out = serde_json::to_string_pretty(&view)
            .map_err(|e| Error::Other(format!("failed to encode config: {}", e)))?;
        println!("{}", out);
        return Ok(());
    }

    output::section("Configuration");
    output::kv("project", &view.project);
    output::kv("environment", &view.environment);
    output::kv("prefix", &view.prefix);
    output::kv("region", &view.region);
    output::kv("variables", output::path(&view.variable_file));
    output::kv("infra", output::path(&view.infra_dir));
    output::kv("app", output::path(&view.app_dir));
    output::kv("lock", output::path(&view.lock_file));

    output::section("Names");
    output::kv("secret", &view.secret);
    output::kv("stack", &view.stack);
    output::kv("buckets", &view.bucket_pattern);

    output::section("Parameters");
    for path in &view.parameters {
        output::list_item(path);
    }

    if !view.variables.is_empty() {
        output::section("Variable set");
        for (key, value) in &view.variables {
            output::kv(key, value);
        }
    }
    Ok(())
}
