use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn missing_socket_exits_with_failure() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("audispd_events");
    Command::cargo_bin("auditcap")?
        .arg("-s")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::starts_with("Exception socket:"))
        .stdout(predicate::str::contains("audispd_events"))
        .stdout(predicate::str::contains("Connected socket").not())
        .stdout(predicate::str::contains("Closing socket").not());
    Ok(())
}

#[test]
fn dry_run() -> Result<(), Box<dyn std::error::Error>> {
    Command::cargo_bin("auditcap")?
        .arg("-d")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!(
            "auditcap {}: Config ok.\n",
            env!("CARGO_PKG_VERSION")
        )));
    Ok(())
}

#[test]
fn version() -> Result<(), Box<dyn std::error::Error>> {
    Command::cargo_bin("auditcap")?
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", env!("CARGO_PKG_VERSION"))));
    Ok(())
}
