//! Tests for error handling and CLI flags.

use crate::support::*;

#[test]
fn test_help_lists_commands() {
    let t = Test::new();

    let output = t.cmd().arg("--help").output().unwrap();
    assert_success(&output);
    let out = stdout(&output);
    for command in ["deploy", "deploy-infra", "deploy-app", "destroy", "cleanup", "status"] {
        assert!(out.contains(command), "help missing {}: {}", command, out);
    }
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();

    let output = t.cmd().arg("unknown-command").output().unwrap();
    // Usage errors come from clap, with its own exit code.
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_version_flag() {
    let t = Test::new();

    let output = t.cmd().arg("--version").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "rigger");
}

#[test]
fn test_undeclared_environment_fails() {
    let t = Test::new();

    let output = t.config(&["-e", "qa"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "unknown environment 'qa'");
    assert_stderr_contains(&output, "dev, staging, prod");
}

#[test]
fn test_declared_environment_without_variable_set_fails() {
    let t = Test::new();

    let output = t.config(&["-e", "prod"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "unknown environment 'prod'");
    assert_stderr_contains(&output, "prod.tfvars");
}

#[test]
fn test_environment_from_env_var() {
    let t = Test::all_envs();

    let output = t
        .cmd()
        .env("ENVIRONMENT", "staging")
        .args(["config", "--json"])
        .output()
        .unwrap();
    assert_success(&output);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["prefix"], "aws-chatbot-staging");
}

#[test]
fn test_invalid_project_name_fails() {
    let t = Test::new();

    let output = t.config(&["-p", "My_Project"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid project name");
}

#[test]
fn test_malformed_variable_file_reports_line() {
    let t = Test::new();
    t.write_vars("dev", "aws_region = \"us-east-1\"\nthis is not hcl\n");

    let output = t.config(&[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "dev.tfvars:2");
}

#[test]
fn test_malformed_config_file_fails() {
    let t = Test::new();
    t.write_config("[tools\nterraform = ");

    let output = t.config(&[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "failed to parse rigger.toml");
}

#[test]
fn test_missing_project_dir_fails() {
    let t = Test::new();

    let output = t.config(&["-C", "does-not-exist"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "does-not-exist");
}

#[test]
fn test_unknown_environment_hint() {
    let t = Test::new();

    let output = t.config(&["-e", "qa"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "each with infrastructure/environments/<env>.tfvars");
}
