//! End-to-end tests of the `spindle` binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn spindle() -> Command {
    Command::cargo_bin("spindle").unwrap()
}

#[test]
fn info_shows_story_metadata() {
    spindle()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("The Lockhouse"))
        .stdout(predicate::str::contains("1.2"));
}

#[test]
fn play_runs_a_short_session() {
    let dir = tempfile::tempdir().unwrap();
    let save = dir.path().join("test.save");

    spindle()
        .arg("play")
        .arg("--save")
        .arg(&save)
        .write_stdin("keeper\nm\n\nlook\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Gatehouse"))
        .stdout(predicate::str::contains("You row back toward the mainland."));
}

#[test]
fn play_survives_stdin_closing() {
    let dir = tempfile::tempdir().unwrap();
    let save = dir.path().join("test.save");

    spindle()
        .arg("play")
        .arg("--save")
        .arg(&save)
        .write_stdin("keeper\nm\n\n")
        .assert()
        .success();
}

#[test]
fn unreadable_savegame_exits_with_code_ten() {
    let dir = tempfile::tempdir().unwrap();
    let save = dir.path().join("test.save");
    std::fs::write(&save, "this is not a savegame").unwrap();

    spindle()
        .arg("play")
        .arg("--save")
        .arg(&save)
        .write_stdin("yes\n")
        .assert()
        .code(10)
        .stderr(predicate::str::contains("cannot read the savegame"));
}

#[test]
fn save_and_reload_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let save = dir.path().join("test.save");

    spindle()
        .arg("play")
        .arg("--save")
        .arg(&save)
        .write_stdin("keeper\nm\n\nread note\nsave\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Game saved."));

    spindle()
        .arg("play")
        .arg("--save")
        .arg(&save)
        .write_stdin("yes\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Your game has been restored."));
}
