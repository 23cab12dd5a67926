use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli() -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("outlinewriter-cli")?;
    cmd.env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn defaults_are_used_without_preferences_file() -> Result<(), Box<dyn Error>> {
    cli()?
        .args(["preferences", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"history_capacity\": 50")
                .and(predicate::str::contains("\"new_item_title\": \"New Item\""))
                .and(predicate::str::contains("\"level\": \"warn\"")),
        );
    Ok(())
}

#[test]
fn new_item_title_comes_from_preferences() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let prefs = dir.path().join("prefs.json");
    fs::write(&prefs, r#"{ "editor": { "new_item_title": "Beat" } }"#)?;
    let file = dir.path().join("outline.json");
    let path = file.to_str().unwrap();

    cli()?.args(["new", path]).assert().success();
    cli()?
        .args(["--preferences", prefs.to_str().unwrap(), "add", path])
        .assert()
        .success();
    cli()?.args(["add", path]).assert().success();
    cli()?
        .args(["show", path])
        .assert()
        .success()
        .stdout("1 [1] Beat\n2 [2] New Item\n");
    Ok(())
}

#[test]
fn preferences_export_and_import() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let exported = dir.path().join("exported.json");

    cli()?
        .args([
            "preferences",
            "export",
            "--output",
            exported.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported preferences"));
    let text = fs::read_to_string(&exported)?;
    assert!(text.contains("\"max_backups\": 10"));

    let incoming = dir.path().join("incoming.json");
    fs::write(&incoming, r#"{ "editor": { "history_capacity": 9000 } }"#)?;

    cli()?
        .args(["preferences", "import", incoming.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires --preferences"));

    let target = dir.path().join("prefs.json");
    fs::write(&target, r#"{ "editor": { "history_capacity": 20 } }"#)?;
    cli()?
        .args([
            "--preferences",
            target.to_str().unwrap(),
            "preferences",
            "import",
            incoming.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported preferences"));

    let saved = fs::read_to_string(&target)?;
    assert!(saved.contains("\"history_capacity\": 500"));
    let backup = fs::read_to_string(target.with_extension("bak"))?;
    assert!(backup.contains("20"));
    Ok(())
}

#[test]
fn log_level_flag_emits_events_on_stderr() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("outline.json");
    let path = file.to_str().unwrap();
    cli()?.args(["new", path]).assert().success();

    cli()?
        .args(["--log-level", "debug", "add", path, "--title", "Traced"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added item 1"))
        .stderr(predicate::str::contains("node created"));

    cli()?
        .args(["add", path, "--title", "Quiet"])
        .assert()
        .success()
        .stderr(predicate::str::contains("node created").not());
    Ok(())
}
