mod support;

use predicates::str::contains;

use support::{taskm_cmd, TestStore};

#[test]
fn taskm_help_works() {
    taskm_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("--add"))
        .stdout(contains("--delete"));
}

#[test]
fn taskm_version_works() {
    taskm_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains("taskm"));
}

#[test]
fn no_args_prints_banner() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;

    store
        .cmd()
        .assert()
        .success()
        .stdout(contains("taskm - task manager"))
        .stdout(contains("--list"));

    assert!(store.file("log.txt").is_file());
    Ok(())
}

#[test]
fn combined_operations_exit_one() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;

    store
        .cmd()
        .args(["--list", "--done", "1"])
        .assert()
        .code(1);
    store
        .cmd()
        .args(["--add", "x", "--delete", "2"])
        .assert()
        .code(1);

    assert!(!store.file("tasks.txt").exists());
    Ok(())
}

#[test]
fn arguments_without_operation_exit_one() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;

    store
        .cmd()
        .args(["--priority", "high"])
        .assert()
        .code(1)
        .stderr(contains("no operation given"));
    Ok(())
}

#[test]
fn missing_or_bad_values_exit_one() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;

    store.cmd().arg("--add").assert().code(1);
    store.cmd().args(["--done", "abc"]).assert().code(1);
    store.cmd().args(["--add", "  "]).assert().code(1);
    Ok(())
}

#[test]
fn json_error_envelope() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;

    let output = store
        .cmd()
        .args(["--json", "--priority", "low"])
        .output()?;
    assert_eq!(output.status.code(), Some(1));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["schema_version"], "taskm.v1");
    assert_eq!(value["status"], "error");
    assert_eq!(value["error"]["kind"], "user_error");
    Ok(())
}
