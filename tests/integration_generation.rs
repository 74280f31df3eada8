//! End-to-end generation runs against a real (local, bare) git remote.
//!
//! These tests drive the library the way `confgen run` does: sync, enumerate
//! candidate branches, generate with the shipped templates, commit and push.

#[allow(dead_code)]
mod common;

use common::{paths, templates_root, GitRemote};
use confgen::config::Settings;
use confgen::error::Error;
use confgen::orchestrator::{BranchStatus, Orchestrator, RunState};
use confgen::repository::SystemGit;

fn settings_for(remote: &GitRemote) -> Settings {
    let mut settings = Settings::new(remote.url());
    settings.workdir = remote.workdir();
    settings.templates_root = templates_root();
    settings
}

#[test]
fn test_valid_and_malformed_branches_are_isolated() {
    let remote = GitRemote::new();
    remote.branch(
        "candidate-1",
        &[
            (paths::ACL_HQ, "10.0.0.1;0.0.0.7\n# dc1\n\n10.0.0.2;0.0.0.3\n"),
            (paths::NTP_HQ, "10.10.10.1;1\n"),
        ],
    );
    remote.branch("candidate-2", &[(paths::ACL_HQ, "10.0.0.1;0.0.0.7\n10.0.0.9\n")]);
    remote.branch("feature-x", &[(paths::ACL_HQ, "10.9.9.9;0.0.0.0\n")]);

    let settings = settings_for(&remote);
    let git = SystemGit::from_settings(&settings);
    let report = Orchestrator::new(&settings, &git).run().unwrap();

    assert_eq!(report.final_state, RunState::Done);
    let names: Vec<&str> = report.branches.iter().map(|o| o.branch.as_str()).collect();
    assert_eq!(names, vec!["candidate-1", "candidate-2"]);

    // candidate-1: published with the pre-generation commit id in the message.
    let commit = match report.branches[0].result.as_ref().unwrap() {
        BranchStatus::Published { commit } => commit.clone(),
        other => panic!("unexpected status: {:?}", other),
    };
    assert_eq!(
        remote.last_subject("candidate-1"),
        format!("Auto-generated configs for branch candidate-1 (from {})", commit)
    );
    let acl = remote.file("candidate-1", paths::ACL_HQ_OUTPUT);
    assert!(acl.contains("permit 10.0.0.1 0.0.0.7"));
    assert!(acl.contains("permit 10.0.0.2 0.0.0.3"));
    let ntp = remote.file("candidate-1", paths::NTP_HQ_OUTPUT);
    assert!(ntp.contains("ntp server 10.10.10.1"));

    // candidate-2: validation failure, nothing pushed.
    let err = report.branches[1].result.as_ref().unwrap_err();
    assert!(matches!(err.root_cause(), Error::Validation { .. }));
    assert_eq!(remote.last_subject("candidate-2"), "Variables for candidate-2");

    // Non-matching branches are never touched.
    assert_eq!(remote.last_subject("feature-x"), "Variables for feature-x");

    assert!(!settings.clone_path().exists());

    match report.into_result().unwrap_err() {
        Error::Aggregate { failures } => {
            assert_eq!(failures.len(), 1);
            assert!(failures[0].starts_with("branch candidate-2:"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_no_candidate_branches() {
    let remote = GitRemote::new();
    remote.branch("release-candidate", &[(paths::ACL_HQ, "10.0.0.1;0.0.0.7\n")]);

    let settings = settings_for(&remote);
    let git = SystemGit::from_settings(&settings);
    let report = Orchestrator::new(&settings, &git).run().unwrap();

    assert!(report.branches.is_empty());
    assert!(report.into_result().is_ok());
    assert!(!settings.clone_path().exists());
}

#[test]
fn test_second_run_without_variable_changes_publishes_nothing() {
    let remote = GitRemote::new();
    remote.branch("candidate-1", &[(paths::ACL_HQ, "10.0.0.1;0.0.0.7\n")]);

    let settings = settings_for(&remote);
    let git = SystemGit::from_settings(&settings);

    let first = Orchestrator::new(&settings, &git).run().unwrap();
    assert!(matches!(
        first.branches[0].result,
        Ok(BranchStatus::Published { .. })
    ));
    let commits = remote.commit_count("candidate-1");

    let second = Orchestrator::new(&settings, &git).run().unwrap();
    assert!(matches!(second.branches[0].result, Ok(BranchStatus::Unchanged)));
    assert_eq!(remote.commit_count("candidate-1"), commits);
    assert!(second.into_result().is_ok());
    assert!(!settings.clone_path().exists());
}

#[test]
fn test_unreachable_remote_fails_the_run_and_cleans_up() {
    let remote = GitRemote::new();
    let mut settings = settings_for(&remote);
    settings.repository.url = remote.temp.path().join("missing.git").display().to_string();
    settings.repository.name = Some("vars".to_string());

    let git = SystemGit::from_settings(&settings);
    let err = Orchestrator::new(&settings, &git).run().unwrap_err();

    assert!(matches!(err, Error::Sync { .. }));
    assert!(!settings.clone_path().exists());
}
