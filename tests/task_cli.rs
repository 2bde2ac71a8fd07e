mod support;

use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;

use support::TestStore;

#[test]
fn add_persists_across_runs() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;

    store
        .cmd()
        .args(["--add", "Buy milk"])
        .assert()
        .success()
        .stdout(contains("Task added with ID 1."))
        .stdout(contains("Tasks saved to file"));
    store
        .cmd()
        .args(["--add", "Walk dog", "--priority", "high"])
        .assert()
        .success()
        .stdout(contains("Task added with ID 2."));

    let tasks = store.read_file("tasks.txt")?;
    let lines: Vec<&str> = tasks.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("1|Buy milk|false|"));
    assert!(lines[0].ends_with("|medium"));
    assert!(lines[1].starts_with("2|Walk dog|false|"));
    assert!(lines[1].ends_with("|high"));
    Ok(())
}

#[test]
fn list_groups_by_priority() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;
    store.write_file(
        "tasks.txt",
        "1|low first|false|2024-01-01 08:00:00|low\n\
         2|high later|false|2024-01-02 08:00:00|high\n\
         3|high earlier|true|2024-01-01 09:00:00|high\n",
    )?;

    let output = store.cmd().arg("--list").output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;

    let high = stdout.find("--- Priority: high ---").ok_or("missing high header")?;
    let low = stdout.find("--- Priority: low ---").ok_or("missing low header")?;
    let earlier = stdout.find("high earlier").ok_or("missing task 3")?;
    let later = stdout.find("high later").ok_or("missing task 2")?;
    assert!(high < earlier && earlier < later && later < low);
    assert!(stdout.contains("ID: 3    | Status: Done    | Created: 2024-01-01 09:00 | Title: high earlier"));
    Ok(())
}

#[test]
fn list_empty_store() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;

    store
        .cmd()
        .arg("--list")
        .assert()
        .success()
        .stdout(contains("No tasks found."));
    Ok(())
}

#[test]
fn invalid_priority_falls_back_to_medium() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;

    store
        .cmd()
        .args(["--add", "Odd", "--priority", "urgent"])
        .assert()
        .success()
        .stderr(contains("invalid priority 'urgent'"));

    assert!(store.read_file("tasks.txt")?.trim_end().ends_with("|medium"));
    Ok(())
}

#[test]
fn done_reports_each_outcome() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;
    store.write_file("tasks.txt", "4|Write docs|false|2024-01-01 08:00:00|low\n")?;

    store
        .cmd()
        .args(["--done", "4"])
        .assert()
        .success()
        .stdout(contains("Marked task with ID 4 as done."));
    store
        .cmd()
        .args(["--done", "4"])
        .assert()
        .success()
        .stdout(contains("already marked as done"));
    store
        .cmd()
        .args(["--done", "99"])
        .assert()
        .success()
        .stderr(contains("Task with ID 99 not found."));

    assert!(store.read_file("tasks.txt")?.starts_with("4|Write docs|true|"));
    Ok(())
}

#[test]
fn delete_removes_task() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;
    store.write_file(
        "tasks.txt",
        "1|a|false|2024-01-01 08:00:00|low\n2|b|false|2024-01-01 08:00:00|low\n",
    )?;

    store
        .cmd()
        .args(["--delete", "1"])
        .assert()
        .success()
        .stdout(contains("Deleted task with ID 1."));
    store
        .cmd()
        .args(["--delete", "1"])
        .assert()
        .success()
        .stderr(contains("not found for deletion"));

    let tasks = store.read_file("tasks.txt")?;
    assert_eq!(tasks.lines().count(), 1);
    assert!(tasks.starts_with("2|b|"));

    // Ids keep growing after a delete.
    store
        .cmd()
        .args(["--add", "c"])
        .assert()
        .success()
        .stdout(contains("Task added with ID 3."));
    Ok(())
}

#[test]
fn malformed_lines_are_skipped() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;
    store.write_file(
        "tasks.txt",
        "1|ok|false|2024-01-01 08:00:00|high\n\
         garbage\n\
         x|bad id|false|2024-01-01 08:00:00|low\n\
         5|odd priority|false|2024-01-01 08:00:00|urgent\n",
    )?;

    store
        .cmd()
        .arg("--list")
        .assert()
        .success()
        .stdout(contains("Title: ok"))
        .stdout(contains("Title: odd priority"))
        .stdout(contains("bad id").not())
        .stderr(contains("skipping malformed task line"));

    let tasks = store.read_file("tasks.txt")?;
    assert_eq!(tasks.lines().count(), 2);
    assert!(tasks.contains("5|odd priority|false|2024-01-01 08:00:00|medium"));
    Ok(())
}

#[test]
fn activity_log_records_operations() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;

    store.cmd().args(["--add", "Logged"]).assert().success();
    store.cmd().args(["--done", "1"]).assert().success();

    let log = store.read_file("log.txt")?;
    assert!(log.contains("Task added ID 1: \"Logged\" priority: medium"));
    assert!(log.contains("Marked task ID 1 as done: \"Logged\""));
    assert!(log.lines().all(|line| line.starts_with('[')));
    Ok(())
}

#[test]
fn json_list_envelope() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;
    store.cmd().args(["--add", "One", "--priority", "low"]).assert().success();
    store.cmd().args(["--add", "Two", "--priority", "high"]).assert().success();

    let output = store.cmd().args(["--list", "--json"]).output()?;
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["schema_version"], "taskm.v1");
    assert_eq!(value["command"], "list");
    assert_eq!(value["status"], "success");
    assert_eq!(value["data"]["count"], 2);
    assert_eq!(value["data"]["tasks"][0]["title"], "Two");
    assert_eq!(value["data"]["tasks"][0]["priority"], "high");
    assert_eq!(value["data"]["tasks"][1]["id"], 1);
    Ok(())
}

#[test]
fn json_not_found_is_success() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;

    let output = store.cmd().args(["--done", "7", "--json"]).output()?;
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["data"]["outcome"], "not_found");
    assert_eq!(value["data"]["id"], 7);
    Ok(())
}

#[test]
fn quiet_suppresses_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let store = TestStore::new()?;

    store
        .cmd()
        .args(["--add", "Silent", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(store.read_file("tasks.txt")?.contains("|Silent|"));
    Ok(())
}
