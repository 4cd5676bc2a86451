use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_displays_usage() {
    Command::cargo_bin("fwcorpus")
        .expect("binary exists")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn inspect_summarizes_a_test_corpus() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("corpus.cfg");
    std::fs::write(
        &path,
        r#"{"Name": "Fw1", "Firmware Definitions": [
            {"Name": "boot", "Filename": "/x/boot.bin",
             "Sections": [{"Start": 0, "End": 100, "Filetype": "elf"}]}
        ]}"#,
    )
    .unwrap();

    Command::cargo_bin("fwcorpus")
        .expect("binary exists")
        .args(["inspect", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fw1"))
        .stdout(predicate::str::contains("boot.bin"))
        .stdout(predicate::str::contains("1 section(s)"));
}

#[test]
fn inspect_missing_file_fails() {
    Command::cargo_bin("fwcorpus")
        .expect("binary exists")
        .args(["inspect", "/no/such/corpus.cfg"])
        .assert()
        .failure();
}
