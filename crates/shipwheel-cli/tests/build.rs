use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use toml_edit::DocumentMut;

mod common;

use common::{dist_entries, parse_json, prepare_fixture};

#[test]
fn wheel_filename_encodes_name_and_version() {
    let (_tmp, project) = prepare_fixture("build-wheel");

    cargo_bin_cmd!("shipwheel")
        .current_dir(&project)
        .args(["build"])
        .assert()
        .success();

    assert_eq!(
        dist_entries(&project),
        vec!["sample_pkg-0.1.0-py3-none-any.whl"]
    );
}

#[test]
fn wheel_contains_sources_and_dist_info() {
    let (_tmp, project) = prepare_fixture("build-contents");

    cargo_bin_cmd!("shipwheel")
        .current_dir(&project)
        .args(["build"])
        .assert()
        .success();

    let wheel = project.join("dist/sample_pkg-0.1.0-py3-none-any.whl");
    let file = fs::File::open(wheel).expect("open wheel");
    let mut archive = zip::ZipArchive::new(file).expect("zip archive");
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).expect("entry").name().to_string())
        .collect();
    assert!(names.contains(&"sample_pkg/__init__.py".to_string()));
    assert!(names.contains(&"sample_pkg/cli.py".to_string()));
    assert!(names.contains(&"sample_pkg-0.1.0.dist-info/METADATA".to_string()));
    assert!(names.contains(&"sample_pkg-0.1.0.dist-info/entry_points.txt".to_string()));
    assert!(names.contains(&"sample_pkg-0.1.0.dist-info/RECORD".to_string()));
}

#[test]
fn missing_version_exits_nonzero_without_artifacts() {
    let (_tmp, project) = prepare_fixture("build-noversion");
    let manifest_path = project.join("pyproject.toml");
    let contents = fs::read_to_string(&manifest_path).expect("read pyproject");
    let mut doc: DocumentMut = contents.parse().expect("valid pyproject");
    doc["project"]
        .as_table_mut()
        .expect("project table")
        .remove("version");
    fs::write(&manifest_path, doc.to_string()).expect("write pyproject");

    let assert = cargo_bin_cmd!("shipwheel")
        .current_dir(&project)
        .args(["--json", "build"])
        .assert()
        .code(1);

    let payload = parse_json(&assert);
    assert_eq!(payload["status"], "user-error");
    assert_eq!(payload["details"]["reason"], "invalid_metadata");
    assert!(!project.join("dist").exists());
}

#[test]
fn invalid_toml_exits_nonzero() {
    let (_tmp, project) = prepare_fixture("build-badtoml");
    fs::write(project.join("pyproject.toml"), "[project\nname =").expect("write pyproject");

    let assert = cargo_bin_cmd!("shipwheel")
        .current_dir(&project)
        .args(["--json", "build"])
        .assert()
        .code(1);

    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["reason"], "invalid_manifest");
}

#[test]
fn both_formats_build_two_artifacts() {
    let (_tmp, project) = prepare_fixture("build-both");

    cargo_bin_cmd!("shipwheel")
        .current_dir(&project)
        .args(["build", "both"])
        .assert()
        .success();

    assert_eq!(
        dist_entries(&project),
        vec![
            "sample_pkg-0.1.0-py3-none-any.whl",
            "sample_pkg-0.1.0.tar.gz"
        ]
    );
}

#[test]
fn dry_run_writes_nothing() {
    let (_tmp, project) = prepare_fixture("build-dryrun");

    let assert = cargo_bin_cmd!("shipwheel")
        .current_dir(&project)
        .args(["--json", "build", "--dry-run"])
        .assert()
        .success();

    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["dry_run"], true);
    assert!(!project.join("dist").exists());
}

#[test]
fn out_flag_redirects_artifacts() {
    let (_tmp, project) = prepare_fixture("build-out");

    cargo_bin_cmd!("shipwheel")
        .current_dir(&project)
        .args(["build", "--out", "artifacts"])
        .assert()
        .success();

    assert!(project
        .join("artifacts/sample_pkg-0.1.0-py3-none-any.whl")
        .is_file());
    assert!(!project.join("dist").exists());
}
