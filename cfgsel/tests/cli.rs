//! End-to-end tests for the `cfgsel` binary.
//!
//! Each test writes its inputs to a fresh temporary directory and runs the
//! binary built for this test run.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

// ============================================================================
// Test Infrastructure
// ============================================================================

const ADD_MODULE: &str = r#"{
    "name": "arith",
    "declarations": [
        { "function": {
            "def_id": 0,
            "name": "add",
            "params": [
                { "local": 0, "name": "a", "ty": "int" },
                { "local": 1, "name": "b", "ty": "int" }
            ],
            "return_type": "int",
            "body": { "expression": {
                "kind": { "call": {
                    "callee": { "def_id": 9, "name": "plus", "kind": "operator" },
                    "dispatch_receiver": { "kind": { "get_value": { "local": 0, "name": "a" } }, "ty": "int" },
                    "args": [ { "kind": { "get_value": { "local": 1, "name": "b" } }, "ty": "int" } ]
                } },
                "ty": "int"
            } }
        } }
    ]
}"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn cfgsel(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cfgsel"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run cfgsel")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ============================================================================
// select
// ============================================================================

#[test]
fn test_select_prints_cfg() {
    let dir = TempDir::new().unwrap();
    let module = write(dir.path(), "arith.json", ADD_MODULE);

    let output = cfgsel(&["select", path_arg(&module)]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fun add(a: i32, b: i32) -> i32 {"));
    assert!(stdout.contains("%0: i32 = add a, b"));
    assert!(stdout.contains("fun global-init"));
}

#[test]
fn test_select_emits_json() {
    let dir = TempDir::new().unwrap();
    let module = write(dir.path(), "arith.json", ADD_MODULE);

    let output = cfgsel(&["select", path_arg(&module), "--emit", "json"]);
    assert!(output.status.success());
    let program: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let functions = program["functions"].as_array().unwrap();
    assert!(functions.iter().any(|f| f["name"] == "add"));
}

#[test]
fn test_config_renames_global_initializer() {
    let dir = TempDir::new().unwrap();
    let module = write(dir.path(), "arith.json", ADD_MODULE);
    let config = write(dir.path(), "cfgsel.toml", "[selection]\nglobal_init_name = \"__init\"\n");

    let output = cfgsel(&["select", path_arg(&module), "--config", path_arg(&config)]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("fun __init"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let module = write(dir.path(), "arith.json", ADD_MODULE);
    let config = write(dir.path(), "cfgsel.toml", "[target]\npointer_size = 3\n");

    let output = cfgsel(&["validate", path_arg(&module), "--config", path_arg(&config)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error loading config"));
}

#[test]
fn test_hard_selection_failure_exits_nonzero() {
    let module = ADD_MODULE.replace("\"kind\": \"operator\"", "\"kind\": \"intrinsic\"");
    let dir = TempDir::new().unwrap();
    let module = write(dir.path(), "bad.json", &module);

    let output = cfgsel(&["validate", path_arg(&module)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no lowering rule for intrinsic `plus`"));
}

#[test]
fn test_validate_reports_success() {
    let dir = TempDir::new().unwrap();
    let module = write(dir.path(), "arith.json", ADD_MODULE);

    let output = cfgsel(&["validate", path_arg(&module)]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("CFG is well-formed"));
}

#[test]
fn test_missing_module_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.json");

    let output = cfgsel(&["select", path_arg(&missing)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error reading module"));
}
