use assert_cmd::Command; // Bring Command into scope
use predicates::prelude::*; // Bring predicate traits into scope
use std::fs;
use tempfile::tempdir;

fn nanos() -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("nanos")?;
    cmd.env_remove("NANOS_MAIN").env("RUST_LOG", "info");
    Ok(cmd)
}

#[test]
fn test_unknown_argument_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;

    nanos()?
        .arg("--datadir")
        .arg(temp_dir.path())
        .arg("--bogus")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown argument --bogus"))
        .stdout(predicate::str::contains("Starting Nanos Server").not());

    // Nothing was booted, so nothing was written
    assert_eq!(fs::read_dir(temp_dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn test_boots_empty_datadir() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let data_dir = temp_dir.path().join("data");

    nanos()?
        .arg("--datadir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Starting Nanos Server"))
        .stdout(predicate::str::contains(format!("Datadir is {}", data_dir.display())))
        .stdout(predicate::str::contains("Nanos ready: 0 services"));

    assert!(data_dir.is_dir(), "Data directory should be created");
    Ok(())
}

#[test]
fn test_eager_service_from_journal_is_started() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let record = serde_json::json!({"op": "put", "descriptor": {"name": "clock", "lazy": false}});
    fs::write(temp_dir.path().join("services"), format!("{}\n", record))?;

    nanos()?
        .arg("--datadir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Registering: clock"))
        .stderr(predicate::str::contains("Starting: clock"))
        .stdout(predicate::str::contains("Nanos ready: 1 services"));

    Ok(())
}

#[test]
fn test_missing_routine_completes_silently() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;

    nanos()?
        .env("NANOS_MAIN", "nothing-here")
        .arg("--datadir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Nanos ready").not());

    Ok(())
}

#[test]
fn test_unusable_datadir_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let file = temp_dir.path().join("not-a-dir");
    fs::write(&file, "occupied")?;

    nanos()?
        .arg("--datadir")
        .arg(&file)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Fatal:"));

    Ok(())
}

#[test]
fn test_help_lists_datadir() -> Result<(), Box<dyn std::error::Error>> {
    nanos()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--datadir"));

    Ok(())
}
