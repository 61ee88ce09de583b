use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;

mod common;

use common::{parse_json, prepare_fixture};

#[test]
fn clean_is_a_no_op_when_nothing_exists() {
    let (_tmp, project) = prepare_fixture("clean-noop");

    let assert = cargo_bin_cmd!("shipwheel")
        .current_dir(&project)
        .args(["--json", "clean"])
        .assert()
        .success();

    let payload = parse_json(&assert);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["details"]["removed"].as_array().map(Vec::len), Some(0));
}

#[test]
fn clean_removes_outputs_and_metadata_dirs() {
    let (_tmp, project) = prepare_fixture("clean-dirs");
    fs::create_dir_all(project.join("dist")).expect("mkdir dist");
    fs::write(project.join("dist/old.whl"), b"stale").expect("write stale");
    fs::create_dir_all(project.join("build")).expect("mkdir build");
    fs::create_dir_all(project.join("sample_pkg.egg-info")).expect("mkdir egg-info");

    cargo_bin_cmd!("shipwheel")
        .current_dir(&project)
        .args(["clean"])
        .assert()
        .success();

    assert!(!project.join("dist").exists());
    assert!(!project.join("build").exists());
    assert!(!project.join("sample_pkg.egg-info").exists());
    // sources and docs survive
    assert!(project.join("src/sample_pkg/__init__.py").is_file());
    assert!(project.join("README.md").is_file());
}

#[test]
fn clean_twice_stays_successful() {
    let (_tmp, project) = prepare_fixture("clean-twice");
    fs::create_dir_all(project.join("dist")).expect("mkdir dist");

    for _ in 0..2 {
        cargo_bin_cmd!("shipwheel")
            .current_dir(&project)
            .args(["clean"])
            .assert()
            .success();
    }
}
