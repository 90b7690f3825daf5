//! Checks that mutating commands refuse to start.
//!
//! Each case fails before any AWS call: a held lock, a declined prompt, or
//! a missing tool.

use rigger::core::domain::{Environment, Prefix};
use rigger::core::lock::DeployLock;

use crate::support::*;

#[test]
fn test_deploy_refused_while_locked() {
    let t = Test::new();
    let prefix = Prefix::new("aws-chatbot", Environment::Dev).unwrap();
    let _held = DeployLock::acquire(&t.state_dir(), &prefix).unwrap();

    let output = t.cmd().arg("deploy").output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "another run holds");
    assert_stderr_contains(&output, "aws-chatbot-dev.lock");
    assert_stderr_contains(&output, "wait for the other run");
}

#[test]
fn test_destroy_refused_while_locked() {
    let t = Test::new();
    let prefix = Prefix::new("aws-chatbot", Environment::Dev).unwrap();
    let _held = DeployLock::acquire(&t.state_dir(), &prefix).unwrap();

    let output = t.cmd().args(["destroy", "--yes"]).output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "another run holds");
}

#[test]
fn test_lock_is_per_environment() {
    let t = Test::all_envs();
    let prefix = Prefix::new("aws-chatbot", Environment::Prod).unwrap();
    let _held = DeployLock::acquire(&t.state_dir(), &prefix).unwrap();

    // Holding prod's lock must not block anything for dev; dev then stops
    // at the missing terraform binary instead.
    t.write_config("[tools]\nterraform = \"rigger-missing-terraform\"\n");
    let output = t.cmd().args(["-e", "dev", "deploy-infra"]).output().unwrap();
    assert_failure(&output);
    let err = stderr(&output);
    assert!(!err.contains("another run holds"), "unexpected lock error: {}", err);
}

#[test]
fn test_destroy_without_terminal_is_cancelled() {
    let t = Test::new();

    let output = t.cmd().arg("destroy").output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "destroy cancelled");
    assert_stderr_contains(&output, "--yes");
}

#[test]
fn test_missing_terraform_reported() {
    let t = Test::new();
    t.write_config("[tools]\nterraform = \"rigger-missing-terraform\"\n");

    let output = t.cmd().arg("deploy-infra").output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "infra-apply failed for dev");
    assert_stderr_contains(&output, "rigger-missing-terraform not found on PATH");
    assert_stderr_contains(&output, "[tools]");
}

#[test]
fn test_unknown_environment_checked_before_lock() {
    let t = Test::new();

    let output = t.cmd().args(["-e", "qa", "deploy"]).output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "unknown environment 'qa'");
    assert!(!t.state_dir().exists());
}
