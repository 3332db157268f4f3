//! CLI integration tests for packup.
//!
//! These tests drive the binary against packages in temporary directories.
//! None of them need node tooling: manifests pin explicit browserslist
//! queries and builds stop at `--plan`.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the packup binary command.
fn packup() -> Command {
    Command::cargo_bin("packup").unwrap()
}

/// Create a temporary directory for test packages.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn write_manifest(dir: &Path, json: &str) {
    fs::write(dir.join("package.json"), json).unwrap();
}

const DUAL_PACKAGE: &str = r#"{
    "name": "my-lib",
    "version": "1.0.0",
    "browserslist": ["node 18", "chrome 110"],
    "dependencies": { "react": "^18.0.0" },
    "exports": {
        ".": {
            "types": "./dist/index.d.ts",
            "source": "./src/index.ts",
            "import": "./dist/index.mjs",
            "require": "./dist/index.js",
            "default": "./dist/index.js"
        },
        "./package.json": "./package.json"
    }
}"#;

// ============================================================================
// packup build --plan
// ============================================================================

#[test]
fn test_build_plan_prints_tasks() {
    let tmp = temp_dir();
    write_manifest(tmp.path(), DUAL_PACKAGE);

    let output = packup()
        .args(["build", "--plan"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let tasks: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 3);

    assert_eq!(tasks[0]["type"], "dts");
    assert_eq!(tasks[0]["entries"][0]["import_id"], "my-lib");
    assert_eq!(tasks[0]["entries"][0]["target_path"], "./dist/index.d.ts");

    assert_eq!(tasks[1]["type"], "js_bundle");
    assert_eq!(tasks[1]["format"], "cjs");
    assert_eq!(tasks[1]["output"], "./dist/index.js");
    assert_eq!(tasks[1]["runtime"], "*");

    assert_eq!(tasks[2]["format"], "es");
    assert_eq!(tasks[2]["output"], "./dist/index.mjs");
}

#[test]
fn test_build_plan_with_dir_flag() {
    let tmp = temp_dir();
    let pkg = tmp.path().join("packages").join("plugin");
    fs::create_dir_all(&pkg).unwrap();
    write_manifest(
        &pkg,
        r#"{
            "name": "plugin",
            "version": "0.1.0",
            "browserslist": ["node 18"],
            "exports": {
                "./strapi-admin": { "require": "./dist/admin/index.js" },
                "./strapi-server": { "require": "./dist/server/index.js" }
            }
        }"#,
    );

    packup()
        .args(["build", "--plan", "--dir", "packages/plugin"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"runtime\": \"web\""))
        .stdout(predicate::str::contains("\"runtime\": \"node\""));
}

#[test]
fn test_build_fails_for_root_outputs() {
    let tmp = temp_dir();
    write_manifest(
        tmp.path(),
        r#"{"name": "test", "version": "1.0.0",
            "main": "./index.js", "module": "./index.mjs"}"#,
    );

    packup()
        .args(["build", "--plan"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "common parent directory which is not the root package directory",
        ));
}

#[test]
fn test_build_fails_for_invalid_export_order() {
    let tmp = temp_dir();
    write_manifest(
        tmp.path(),
        r#"{"name": "test", "version": "1.0.0", "exports": {
            ".": { "require": "./dist/index.js", "types": "./dist/index.d.ts" }
        }}"#,
    );

    packup()
        .args(["build", "--plan"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "the 'types' property should be the first property",
        ));
}

#[test]
fn test_build_without_manifest_fails() {
    let tmp = temp_dir();

    packup()
        .arg("build")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find `package.json`"));
}

// ============================================================================
// packup check
// ============================================================================

#[test]
fn test_check_reports_missing_outputs() {
    let tmp = temp_dir();
    write_manifest(tmp.path(), DUAL_PACKAGE);

    packup()
        .arg("check")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("./dist/index.d.ts"))
        .stderr(predicate::str::contains("./dist/index.mjs"));
}

#[test]
fn test_check_passes_when_outputs_exist() {
    let tmp = temp_dir();
    write_manifest(tmp.path(), DUAL_PACKAGE);

    let dist = tmp.path().join("dist");
    fs::create_dir_all(&dist).unwrap();
    for file in ["index.d.ts", "index.js", "index.mjs"] {
        fs::write(dist.join(file), "").unwrap();
    }

    packup()
        .args(["check", "--color", "never"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("all 3 declared output(s) exist"));
}

// ============================================================================
// packup clean
// ============================================================================

#[test]
fn test_clean_removes_dist() {
    let tmp = temp_dir();
    write_manifest(tmp.path(), DUAL_PACKAGE);

    let dist = tmp.path().join("dist");
    fs::create_dir_all(dist.join("_chunks")).unwrap();
    fs::write(dist.join("index.js"), "").unwrap();

    packup()
        .arg("clean")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed"));

    assert!(!dist.exists());
    assert!(tmp.path().join("package.json").exists());
}

#[test]
fn test_clean_quiet_prints_nothing() {
    let tmp = temp_dir();
    write_manifest(tmp.path(), DUAL_PACKAGE);

    packup()
        .args(["clean", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_clean_uses_configured_dist() {
    let tmp = temp_dir();
    write_manifest(
        tmp.path(),
        r#"{"name": "my-lib", "version": "1.0.0", "main": "./out/cjs/index.js"}"#,
    );
    fs::write(tmp.path().join("packup.toml"), "[build]\ndist = \"out\"\n").unwrap();

    let out = tmp.path().join("out");
    fs::create_dir_all(out.join("cjs")).unwrap();
    fs::create_dir_all(out.join("extra")).unwrap();

    packup()
        .arg("clean")
        .current_dir(tmp.path())
        .assert()
        .success();

    assert!(!out.exists());
}

#[test]
fn test_build_rejects_configured_dist_without_outputs() {
    let tmp = temp_dir();
    write_manifest(tmp.path(), DUAL_PACKAGE);
    fs::write(tmp.path().join("packup.toml"), "[build]\ndist = \"build\"\n").unwrap();

    packup()
        .args(["build", "--plan"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("is outside the dist directory"));
}

// ============================================================================
// packup completions
// ============================================================================

#[test]
fn test_completions_bash() {
    packup()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("packup"));
}
