//! End-to-end tests for the `confgen completions` command.

#[allow(dead_code)]
mod common;
use common::prelude::*;

#[test]
fn test_completions_help() {
    let mut cmd = cargo_bin_cmd!("confgen");
    cmd.arg("completions")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generate shell completion scripts"))
        .stdout(predicate::str::contains("bash"))
        .stdout(predicate::str::contains("zsh"))
        .stdout(predicate::str::contains("fish"));
}

#[test]
fn test_completions_bash() {
    let mut cmd = cargo_bin_cmd!("confgen");
    cmd.arg("completions")
        .arg("bash")
        .assert()
        .success()
        .stdout(predicate::str::contains("_confgen()"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("render"));
}

#[test]
fn test_completions_zsh() {
    let mut cmd = cargo_bin_cmd!("confgen");
    cmd.arg("completions")
        .arg("zsh")
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef confgen"))
        .stdout(predicate::str::contains("generators"));
}

#[test]
fn test_completions_invalid_shell() {
    let mut cmd = cargo_bin_cmd!("confgen");
    cmd.arg("completions")
        .arg("invalid-shell")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
