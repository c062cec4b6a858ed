use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::error::Error;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const UNDEFINED_VARIABLE: &str = "*** Test Cases ***\nExample\n    Log    ${unknown_var}\n";

#[test]
fn analyze_prints_diagnostics_as_json() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("t.robot"), UNDEFINED_VARIABLE)?;

    let mut cmd = Command::cargo_bin("robotls")?;
    cmd.current_dir(dir.path()).args(["--analyze", "t.robot"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"VariableNotFound\""))
        .stdout(predicate::str::contains("Variable '${unknown_var}' not found."))
        .stdout(predicate::str::contains("\"keyword_references\""));

    Ok(())
}

#[test]
fn errors_only_prints_one_based_positions() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("t.robot"), UNDEFINED_VARIABLE)?;

    let mut cmd = Command::cargo_bin("robotls")?;
    cmd.current_dir(dir.path())
        .args(["--analyze", "t.robot", "--errors-only"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Line 3:12: Variable '${unknown_var}' not found."));

    Ok(())
}

#[test]
fn errors_only_on_clean_file() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("clean.robot"),
        "*** Test Cases ***\nExample\n    Log    hello\n",
    )?;

    let mut cmd = Command::cargo_bin("robotls")?;
    cmd.current_dir(dir.path())
        .args(["--analyze", "clean.robot", "--errors-only"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No errors found"));

    Ok(())
}

#[test]
fn analyze_rejects_parent_paths() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;

    let mut cmd = Command::cargo_bin("robotls")?;
    cmd.current_dir(dir.path()).args(["--analyze", "../t.robot"]);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("Unsafe file path"));

    Ok(())
}

#[test]
fn analyze_missing_file_exits_with_two() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;

    let mut cmd = Command::cargo_bin("robotls")?;
    cmd.current_dir(dir.path()).args(["--analyze", "missing.robot"]);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to read file 'missing.robot'"));

    Ok(())
}

#[test]
fn prints_version() -> Result<(), Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("robotls")?;
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));

    Ok(())
}
