//! End-to-end tests for the `confgen render` and `confgen generators` commands.

#[allow(dead_code)]
mod common;
use common::prelude::*;

fn checkout() -> assert_fs::TempDir {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child(paths::ACL_HQ)
        .write_str("# dc\n10.0.0.1;0.0.0.7\n")
        .unwrap();
    temp.child(paths::NTP_HQ).write_str("10.10.10.1;1\n").unwrap();
    temp
}

#[test]
fn test_render_writes_all_generators() {
    let temp = checkout();

    cargo_bin_cmd!("confgen")
        .current_dir(temp.path())
        .env_remove("CONFGEN_CONFIG")
        .arg("render")
        .arg("--checkout")
        .arg(temp.path())
        .arg("--templates")
        .arg(templates_root())
        .assert()
        .success()
        .stdout(predicate::str::contains("vty_acl"))
        .stdout(predicate::str::contains("ntp"));

    temp.child(paths::ACL_HQ_OUTPUT)
        .assert(predicate::str::contains("permit 10.0.0.1 0.0.0.7"));
    temp.child(paths::NTP_HQ_OUTPUT)
        .assert(predicate::str::contains("ntp server 10.10.10.1"));
}

#[test]
fn test_render_single_generator() {
    let temp = checkout();

    cargo_bin_cmd!("confgen")
        .current_dir(temp.path())
        .env_remove("CONFGEN_CONFIG")
        .arg("render")
        .arg("--checkout")
        .arg(temp.path())
        .arg("--templates")
        .arg(templates_root())
        .arg("--generator")
        .arg("ntp")
        .assert()
        .success();

    temp.child(paths::NTP_HQ_OUTPUT).assert(predicate::path::exists());
    temp.child(paths::ACL_HQ_OUTPUT).assert(predicate::path::missing());
}

#[test]
fn test_render_unknown_generator() {
    let temp = checkout();

    cargo_bin_cmd!("confgen")
        .current_dir(temp.path())
        .env_remove("CONFGEN_CONFIG")
        .arg("render")
        .arg("--checkout")
        .arg(temp.path())
        .arg("--generator")
        .arg("bgp")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown generator 'bgp'"));
}

#[test]
fn test_render_malformed_variables() {
    let temp = checkout();
    temp.child(paths::ACL_HQ).write_str("10.0.0.1\n").unwrap();

    cargo_bin_cmd!("confgen")
        .current_dir(temp.path())
        .env_remove("CONFGEN_CONFIG")
        .arg("render")
        .arg("--checkout")
        .arg(temp.path())
        .arg("--templates")
        .arg(templates_root())
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected 2 fields"));
}

#[test]
fn test_generators_lists_availability() {
    let temp = assert_fs::TempDir::new().unwrap();

    cargo_bin_cmd!("confgen")
        .current_dir(temp.path())
        .env_remove("CONFGEN_CONFIG")
        .arg("generators")
        .arg("--templates")
        .arg(templates_root())
        .assert()
        .success()
        .stdout(predicate::str::contains("vty_acl"))
        .stdout(predicate::str::contains("ready"));

    cargo_bin_cmd!("confgen")
        .current_dir(temp.path())
        .env_remove("CONFGEN_CONFIG")
        .arg("generators")
        .assert()
        .success()
        .stdout(predicate::str::contains("unavailable"));
}
