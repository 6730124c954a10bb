// Regression tests for the goldrun binary: exit codes, report text, and
// miette-rendered configuration errors.
#![cfg(unix)]

mod common;

use std::fs;

use assert_cmd::Command;
use common::{Suite, ECHO};
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn goldrun(suite: &Suite) -> Command {
    let mut cmd = Command::cargo_bin("goldrun").unwrap();
    cmd.current_dir(suite.root());
    cmd
}

#[test]
fn passing_suite_exits_zero() {
    let suite = Suite::new();
    suite.script("compiler", ECHO);
    suite.case("t1", "0 102", Some("0 102"));

    goldrun(&suite)
        .args(["run", "tests", "--color", "never"])
        .assert()
        .success()
        .stdout(contains("Found 1 test case(s)."))
        .stdout(contains("PASS  t1"))
        .stdout(contains("Test summary: total 1, passed 1, failed 0, skipped 0"));
}

#[test]
fn failing_case_exits_one_and_is_recapped() {
    let suite = Suite::new();
    suite.script("compiler", ECHO);
    suite.case("t1", "0 102", Some("0 102"));
    suite.case("t2", "got this", Some("wanted that"));

    goldrun(&suite)
        .args(["run", "tests"])
        .assert()
        .code(1)
        .stdout(contains("FAIL  t2"))
        .stdout(contains("-wanted that").and(contains("+got this")))
        .stdout(contains("Failed cases:\n  - t2"));
}

#[test]
fn skip_policy_decides_exit_code() {
    let suite = Suite::new();
    suite.script("compiler", ECHO);
    suite.case("t1", "x", Some("x"));
    suite.case("t2", "y", None);

    goldrun(&suite).args(["run", "tests"]).assert().success();
    goldrun(&suite)
        .args(["run", "tests", "--skip-policy", "fail"])
        .assert()
        .code(1)
        .stdout(contains("SKIP  t2"));
}

#[test]
fn missing_subject_renders_diagnostic() {
    let suite = Suite::new();
    suite.case("t1", "x", Some("x"));

    goldrun(&suite)
        .args(["run", "tests", "--subject", "./hw5"])
        .assert()
        .code(2)
        .stderr(contains("goldrun::config::subject_not_found"))
        .stdout(contains("Test summary").not());
}

#[test]
fn config_file_is_picked_up() {
    let suite = Suite::new();
    suite.script("hw3", "echo out; echo err >&2");
    suite.case("t1", "", Some("out\nerr"));
    fs::write(
        suite.root().join("goldrun.yaml"),
        "subject: ./hw3\nmerge_stderr: true\n",
    )
    .unwrap();

    goldrun(&suite).args(["run", "tests"]).assert().success();
}

#[test]
fn malformed_config_is_a_config_error() {
    let suite = Suite::new();
    suite.case("t1", "x", Some("x"));
    fs::write(suite.root().join("goldrun.yaml"), "subject: [./hw3\n").unwrap();

    goldrun(&suite)
        .args(["run", "tests"])
        .assert()
        .code(2)
        .stderr(contains("goldrun::config::parse"));
}

#[test]
fn json_format_emits_one_event_per_line() {
    let suite = Suite::new();
    suite.script("compiler", ECHO);
    suite.case("t1", "x", Some("x"));

    let output = goldrun(&suite)
        .args(["run", "tests", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let events: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(events.len(), 3);
    assert_eq!(events[1]["outcome"], "pass");
    assert_eq!(events[2]["success"], true);
}

#[test]
fn scaffold_writes_fixtures_once() {
    let suite = Suite::new();
    fs::write(suite.root().join("list.yaml"), "- 'x max OO7'\n- '.'\n").unwrap();

    goldrun(&suite)
        .args(["scaffold", "list.yaml", "--dir", "generated"])
        .assert()
        .success()
        .stdout(contains("Created 2 files inside the 'generated' folder."));
    let first = fs::read_to_string(suite.root().join("generated/output_1.in")).unwrap();
    assert_eq!(first, "x max OO7");

    goldrun(&suite)
        .args(["scaffold", "list.yaml", "--dir", "generated"])
        .assert()
        .code(2)
        .stderr(contains("goldrun::scaffold::exists"));

    goldrun(&suite)
        .args(["scaffold", "list.yaml", "--dir", "generated", "--force"])
        .assert()
        .success();
}
