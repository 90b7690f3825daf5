//! Tests for `rigger completions`.

use crate::support::*;

#[test]
fn test_completions_bash() {
    let t = Test::new();

    let output = t.cmd().args(["completions", "bash"]).output().unwrap();
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.contains("_rigger"));
    assert!(out.contains("deploy-infra"));
}

#[test]
fn test_completions_zsh() {
    let t = Test::new();

    let output = t.cmd().args(["completions", "zsh"]).output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "#compdef rigger");
}

#[test]
fn test_completions_fish() {
    let t = Test::new();

    let output = t.cmd().args(["completions", "fish"]).output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "complete -c rigger");
}

#[test]
fn test_completions_unknown_shell_fails() {
    let t = Test::new();

    let output = t.cmd().args(["completions", "tcsh"]).output().unwrap();
    // Usage errors come from clap, with its own exit code.
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_completions_need_no_project() {
    let t = Test::empty();

    let output = t.cmd().args(["completions", "bash"]).output().unwrap();
    assert_success(&output);
}
