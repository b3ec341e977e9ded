//! Build, deploy and destroy runs across several repositories

mod common;

use common::TestWorkspace;
use predicates::prelude::*;

fn three_repos() -> TestWorkspace {
    TestWorkspace::new()
        .install("a", &[])
        .install("b", &["a"])
        .install("c", &["b"])
}

#[test]
fn test_deploy_all_runs_in_dependency_order() {
    let workspace = three_repos()
        .steps("a", "deploy", &[("record", "echo a >> ../deployed.log")])
        .steps("b", "deploy", &[("record", "echo b >> ../deployed.log")])
        .steps("c", "deploy", &[("record", "echo c >> ../deployed.log")]);

    workspace
        .cmd()
        .args(["deploy", "--all", "--silence"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[a, b, c]"));

    assert_eq!(workspace.read_file("deployed.log"), "a\nb\nc\n");
}

#[test]
fn test_deploy_stops_at_first_failure() {
    let workspace = three_repos()
        .steps("a", "deploy", &[("mark", "touch deployed")])
        .steps("b", "deploy", &[("explode", "exit 3")])
        .steps("c", "deploy", &[("mark", "touch deployed")]);

    workspace
        .cmd()
        .args(["deploy", "--all", "--silence"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'b'"))
        .stderr(predicate::str::contains("explode"));

    assert!(workspace.file_exists("a/deployed"));
    assert!(!workspace.file_exists("c/deployed"));
}

#[test]
fn test_deploy_ignore_console_skips_platform_repos() {
    let workspace = TestWorkspace::new()
        .install("console", &[])
        .install("app", &["console"])
        .steps("console", "deploy", &[("mark", "touch deployed")])
        .steps("app", "deploy", &[("mark", "touch deployed")]);

    workspace
        .cmd()
        .args(["deploy", "--all", "--silence", "--ignore-console"])
        .assert()
        .success();

    assert!(!workspace.file_exists("console/deployed"));
    assert!(workspace.file_exists("app/deployed"));
}

#[test]
fn test_deploy_prints_rendered_notes() {
    let workspace = TestWorkspace::new()
        .install("console", &[])
        .steps("console", "deploy", &[("noop", "true")]);
    workspace.write_file("console/NOTES.txt", "Console is up on {{ cluster }}");

    workspace
        .cmd()
        .args(["deploy", "--all"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Console is up on local"));
}

#[test]
fn test_build_force_outside_git() {
    let workspace = TestWorkspace::new()
        .install("console", &[])
        .steps("console", "build", &[("mark", "touch built")]);

    workspace
        .cmd()
        .args(["build", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Finished building 1 repositories"));

    assert!(workspace.file_exists("console/built"));
}

#[test]
fn test_build_without_git_fails() {
    let workspace = TestWorkspace::new().install("console", &[]);

    workspace
        .cmd()
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not in a git repository"));
}

#[test]
fn test_build_only_unknown_repo() {
    let workspace = TestWorkspace::new().install("console", &[]);

    workspace
        .cmd()
        .args(["build", "--force", "--only", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing is not installed"));
}

#[test]
fn test_build_renders_templates() {
    let workspace = TestWorkspace::new().install("console", &[]);
    workspace.write_file("console/templates/values.yaml.tpl", "region: {{ region }}\n");

    workspace.cmd().args(["build", "--force"]).assert().success();

    assert_eq!(workspace.read_file("console/values.yaml"), "region: us-east-1\n");
}

#[test]
fn test_destroy_from_resumes_in_reverse_order() {
    let workspace = three_repos()
        .steps("a", "destroy", &[("record", "echo a >> ../destroyed.log")])
        .steps("b", "destroy", &[("record", "echo b >> ../destroyed.log")])
        .steps("c", "destroy", &[("record", "echo c >> ../destroyed.log")]);

    workspace
        .cmd()
        .args(["destroy", "--from", "b", "--yes"])
        .assert()
        .success();

    assert_eq!(workspace.read_file("destroyed.log"), "c\nb\n");
}

#[test]
fn test_destroy_from_unknown_repo() {
    let workspace = three_repos();

    workspace
        .cmd()
        .args(["destroy", "--from", "zzz", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("zzz is not installed"));
}

#[test]
fn test_destroy_without_confirmation_does_nothing() {
    let workspace = three_repos().steps("c", "destroy", &[("mark", "touch destroyed")]);

    workspace
        .cmd()
        .arg("destroy")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted"));

    assert!(!workspace.file_exists("c/destroyed"));
}
