//! End-to-end CLI tests.

use assert_cmd::Command;
use predicates::prelude::*;

fn minidbg() -> Command {
    Command::cargo_bin("minidbg").unwrap()
}

#[test]
fn help_lists_subcommands() {
    minidbg()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("inject-demo"))
        .stdout(predicate::str::contains("trace-demo"))
        .stdout(predicate::str::contains("disasm"));
}

#[test]
fn disasm_prints_a_listing() {
    minidbg()
        .args(["disasm", "--sample", "foo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("foo(a)"))
        .stdout(predicate::str::contains("LOAD_NAME"))
        .stdout(predicate::str::contains("RETURN_VALUE"));
}

#[test]
fn disasm_json_is_valid() {
    let output = minidbg()
        .args(["disasm", "--sample", "main", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let rows: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let rows = rows.as_array().unwrap();
    assert!(!rows.is_empty());
    assert_eq!(rows[0]["index"], 0);
    assert!(rows[0]["opcode"].is_string());
}

#[test]
fn disasm_rejects_unknown_samples() {
    minidbg()
        .args(["disasm", "--sample", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown sample 'nope'"));
}

#[test]
fn inject_demo_runs_the_hook_on_the_second_call() {
    minidbg()
        .arg("inject-demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("hello world 42").count(2))
        .stdout(predicate::str::contains("Call stack:"))
        .stdout(predicate::str::contains("line 2, in foo"))
        .stdout(predicate::str::contains("locals: {a = 42}"));
}

#[test]
fn inject_demo_reports_missing_lines() {
    minidbg()
        .args(["inject-demo", "--line", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 99 not found"));
}

#[test]
fn trace_demo_stops_at_every_event_until_input_ends() {
    minidbg()
        .arg("trace-demo")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("[mdb] call event"))
        .stdout(predicate::str::contains("[mdb] line event"))
        .stdout(predicate::str::contains("in main"))
        .stdout(predicate::str::contains("in foo"));
}
