//! CLI tests for `decompose init`, `validate` and `run`.
//!
//! Spawns the binary against a temp rule library and verifies exit codes and
//! printed operations.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use decompose::exit_codes;
use decompose::io::config::{OverrideSpec, RulesFile, write_rules};

fn decompose(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_decompose"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("spawn decompose")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn init_then_validate_succeeds() {
    let temp = tempfile::tempdir().expect("tempdir");

    let init = decompose(temp.path(), &["init"]);
    assert_eq!(init.status.code(), Some(exit_codes::OK));
    assert!(temp.path().join("decompose.toml").is_file());

    let validate = decompose(temp.path(), &["validate"]);
    assert_eq!(validate.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout_lines(&validate), vec!["ok: 8 gates, 0 intercepts, 0 fallbacks"]);
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("decompose.toml"), "# mine\n").expect("write");

    let init = decompose(temp.path(), &["init"]);
    assert_eq!(init.status.code(), Some(exit_codes::INVALID));
    assert_eq!(
        fs::read_to_string(temp.path().join("decompose.toml")).expect("read"),
        "# mine\n"
    );

    let forced = decompose(temp.path(), &["init", "--force"]);
    assert_eq!(forced.status.code(), Some(exit_codes::OK));
}

#[test]
fn run_prints_decomposed_operations_in_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_rules(&temp.path().join("decompose.toml"), &RulesFile::sample()).expect("write");

    let run = decompose(temp.path(), &["run", "SWAP a b", "I a", "H b"]);
    assert_eq!(run.status.code(), Some(exit_codes::OK));
    assert_eq!(
        stdout_lines(&run),
        vec!["CNOT(a, b)", "CNOT(b, a)", "CNOT(a, b)", "H(b)"]
    );
}

#[test]
fn run_json_emits_gate_and_targets() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_rules(&temp.path().join("decompose.toml"), &RulesFile::sample()).expect("write");

    let run = decompose(temp.path(), &["run", "--json", "TOFFOLI a b c"]);
    assert_eq!(run.status.code(), Some(exit_codes::OK));
    let ops: serde_json::Value = serde_json::from_slice(&run.stdout).expect("json");
    let ops = ops.as_array().expect("array");
    assert_eq!(ops.len(), 15);
    assert_eq!(ops[0], serde_json::json!({ "gate": "H", "targets": ["c"] }));
}

#[test]
fn run_stuck_exits_with_stuck_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_rules(&temp.path().join("decompose.toml"), &RulesFile::sample()).expect("write");

    let run = decompose(temp.path(), &["run", "--keep", "CNOT", "TOFFOLI a b c"]);
    assert_eq!(run.status.code(), Some(exit_codes::STUCK));
    assert!(run.stdout.is_empty());
    assert!(String::from_utf8_lossy(&run.stderr).contains("H(c)"));
}

#[test]
fn run_keep_mode_keeps_stuck_operations() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_rules(&temp.path().join("decompose.toml"), &RulesFile::sample()).expect("write");

    let run = decompose(
        temp.path(),
        &["run", "--keep", "CNOT", "--on-stuck", "keep", "H q", "SWAP a b"],
    );
    assert_eq!(run.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout_lines(&run)[0], "H(q)");
}

#[test]
fn run_on_stuck_without_keep_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut rules = RulesFile::sample();
    rules.settings.keep = None;
    write_rules(&temp.path().join("decompose.toml"), &rules).expect("write");

    let run = decompose(temp.path(), &["run", "--on-stuck", "error", "H q"]);
    assert_eq!(run.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&run.stderr).contains("must specify `keep`"));
}

#[test]
fn run_rejects_unknown_keep_gate() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_rules(&temp.path().join("decompose.toml"), &RulesFile::sample()).expect("write");

    let run = decompose(temp.path(), &["run", "--keep", "CNTO", "SWAP a b"]);
    assert_eq!(run.status.code(), Some(exit_codes::INVALID));
    assert!(run.stdout.is_empty());
    assert!(String::from_utf8_lossy(&run.stderr).contains("unknown gate 'CNTO'"));
}

#[test]
fn run_once_on_atomic_gate_is_not_expandable() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_rules(&temp.path().join("decompose.toml"), &RulesFile::sample()).expect("write");

    let run = decompose(temp.path(), &["run", "--once", "H q"]);
    assert_eq!(run.status.code(), Some(exit_codes::NOT_EXPANDABLE));
}

#[test]
fn run_uses_intercept_bodies_from_rules() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut rules = RulesFile::sample();
    rules.intercept.push(OverrideSpec {
        name: "SWAP".to_string(),
        body: Vec::new(),
    });
    write_rules(&temp.path().join("decompose.toml"), &rules).expect("write");

    let run = decompose(temp.path(), &["run", "SWAP a b", "H a"]);
    assert_eq!(run.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout_lines(&run), vec!["H(a)"]);
}
