//! End-to-end tests driving the built `plxc` binary, covering the scenarios
//! enumerated in the specification's testable-properties section.

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn plxc() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("plxc"))
}

fn project_with(src: &str) -> assert_fs::TempDir {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("main.plx").write_str(src).unwrap();
    dir
}

#[test]
fn fails_when_input_dir_missing() {
    let mut cmd = plxc();
    cmd.arg("/no/such/directory/exists");
    cmd.assert().failure().stderr(predicate::str::contains("input directory not found"));
}

#[test]
fn fails_when_no_plx_files_present() {
    let dir = assert_fs::TempDir::new().unwrap();
    let mut cmd = plxc();
    cmd.arg(dir.path());
    cmd.assert().failure().stderr(predicate::str::contains("no .plx files"));
}

#[test]
fn hello_addition_compiles_with_the_wasm_back_end() {
    let dir = project_with("func main() -> s32 { return 1 + 2; }");
    let out = dir.child("out");
    let mut cmd = plxc();
    cmd.arg(dir.path()).arg("-o").arg(out.path()).arg("-b").arg("wasm");
    cmd.assert().success();
    let wasm_files: Vec<_> = std::fs::read_dir(out.path()).unwrap().filter_map(Result::ok).filter(|e| e.path().extension().is_some_and(|e| e == "wasm")).collect();
    assert_eq!(wasm_files.len(), 1);
}

#[test]
fn undeclared_identifier_halts_before_codegen() {
    let dir = project_with("func f() -> s32 { return x; }");
    let mut cmd = plxc();
    cmd.arg(dir.path()).arg("-b").arg("wasm");
    cmd.assert().failure().stderr(predicate::str::contains("undeclared identifier"));
}

#[test]
fn duplicate_declaration_reports_both_locations() {
    let dir = project_with("const a = 1; const a = 2;");
    let mut cmd = plxc();
    cmd.arg(dir.path()).arg("-b").arg("wasm");
    cmd.assert().failure().stderr(predicate::str::contains("already declared"));
}

#[test]
fn return_type_mismatch_halts_before_codegen() {
    let dir = project_with("func g() -> s32 { return true; }");
    let mut cmd = plxc();
    cmd.arg(dir.path()).arg("-b").arg("wasm");
    cmd.assert().failure();
}

#[test]
fn missing_return_is_reported() {
    let dir = project_with("func h() -> s32 { if true { return 1; } }");
    let mut cmd = plxc();
    cmd.arg(dir.path()).arg("-b").arg("wasm");
    cmd.assert().failure().stderr(predicate::str::contains("missing return"));
}

#[test]
fn quiet_suppresses_the_progress_line() {
    let dir = project_with("func main() -> s32 { return 1 + 2; }");
    let mut cmd = plxc();
    cmd.arg(dir.path()).arg("-b").arg("wasm").arg("-q");
    cmd.assert().success().stdout(predicate::str::contains("compiling").not());
}

#[test]
fn shows_version() {
    let mut cmd = plxc();
    cmd.arg("-v");
    cmd.assert().success().stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
