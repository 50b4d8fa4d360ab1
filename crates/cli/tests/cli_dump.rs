use std::fs;
use std::path::Path;

use memlayout_core::{printer, Registry};
use predicates::prelude::*;
use tempfile::tempdir;

const DEFINITIONS: &str = r#"<?xml version="1.0"?>
<layouts>
    <version name="base" platform="p">
        <global name="g" address="0x10"/>
    </version>
    <version name="child" platform="p" inherits-from="base">
        <function name="f" address="0x20"/>
    </version>
    <version name="0.31" platform="windows">
        <global name="g_world" address="0xC0FFEE"/>
    </version>
</layouts>
"#;

fn write_definitions(dir: &Path) {
    fs::write(dir.join("Memory.xml"), DEFINITIONS).expect("write definitions");
}

/// With no subcommand the CLI dumps `Memory.xml` from the working directory.
#[test]
fn default_command_dumps_every_version() {
    let dir = tempdir().expect("tempdir");
    write_definitions(dir.path());

    let expected = printer::format_all(Registry::from_source(DEFINITIONS).expect("load").all());

    assert_cmd::cargo::cargo_bin_cmd!("dumpoffsets")
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn dump_to_output_file_leaves_stdout_empty() {
    let dir = tempdir().expect("tempdir");
    write_definitions(dir.path());
    let out = dir.path().join("offsets.txt");

    assert_cmd::cargo::cargo_bin_cmd!("dumpoffsets")
        .current_dir(dir.path())
        .args(["dump", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&out).expect("read output");
    assert!(written.starts_with("version base [p, 64-bit]\n"));
    assert!(written.contains("version child [p, 64-bit]\n  inherits: base\n"));
}

#[test]
fn dump_filters_by_platform() {
    let dir = tempdir().expect("tempdir");
    write_definitions(dir.path());

    assert_cmd::cargo::cargo_bin_cmd!("dumpoffsets")
        .current_dir(dir.path())
        .args(["dump", "--platform", "windows"])
        .assert()
        .success()
        .stdout(predicate::str::contains("version 0.31 [windows, 32-bit]"))
        .stdout(predicate::str::contains("version base").not());
}

#[test]
fn dump_fails_for_unknown_platform() {
    let dir = tempdir().expect("tempdir");
    write_definitions(dir.path());

    assert_cmd::cargo::cargo_bin_cmd!("dumpoffsets")
        .current_dir(dir.path())
        .args(["dump", "--platform", "amiga"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No versions defined for platform 'amiga'"))
        .stderr(predicate::str::contains("p, windows"));
}

#[test]
fn dump_json_is_a_parseable_array() {
    let dir = tempdir().expect("tempdir");
    write_definitions(dir.path());

    let output = assert_cmd::cargo::cargo_bin_cmd!("dumpoffsets")
        .current_dir(dir.path())
        .args(["dump", "--json"])
        .output()
        .expect("run dumpoffsets");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json stdout");
    let versions = value.as_array().expect("array");
    assert_eq!(versions.len(), 3);
    assert_eq!(versions[1]["id"]["label"], "child");
    assert_eq!(versions[1]["offsets"][0]["name"], "g");
}

#[test]
fn explicit_file_overrides_working_directory_default() {
    let dir = tempdir().expect("tempdir");
    let defs = dir.path().join("layouts.xml");
    fs::write(&defs, DEFINITIONS).expect("write definitions");

    assert_cmd::cargo::cargo_bin_cmd!("dumpoffsets")
        .arg("dump")
        .arg("--file")
        .arg(&defs)
        .assert()
        .success()
        .stdout(predicate::str::contains("version child [p, 64-bit]"));
}

#[test]
fn missing_definitions_file_reports_path() {
    let dir = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("dumpoffsets")
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read layout definitions at Memory.xml"));
}

#[test]
fn resolution_errors_fail_without_partial_output() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("Memory.xml"),
        r#"<l>
            <version name="ok" platform="p"><global name="g" address="1"/></version>
            <version name="a" platform="p" inherits-from="b"/>
            <version name="b" platform="p" inherits-from="a"/>
        </l>"#,
    )
    .expect("write definitions");

    assert_cmd::cargo::cargo_bin_cmd!("dumpoffsets")
        .current_dir(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Inheritance cycle detected"));
}
