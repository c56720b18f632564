//! CLI behavior tests: commands, exit codes, config merging.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn bincompat() -> Command {
    Command::cargo_bin("bincompat").expect("bincompat binary")
}

const PERSON: &str = r#"{
  "schema": "bincompat.decls.v1",
  "shapes": [ {
    "name": "PersonDBC",
    "package": "com.acme.model",
    "fields": [
      { "name": "id", "type": "String" },
      { "name": "nick", "type": "String", "default": { "string": "x" } },
      { "name": "age", "type": "Int",
        "new_required": { "since_version": 2, "default": { "raw": "0" } } }
    ]
  } ]
}"#;

const HANDLER: &str = r#"{
  "shapes": [ {
    "name": "HandlerDBC",
    "package": "com.acme",
    "fields": [
      { "name": "a", "type": "String" },
      { "name": "b", "type": "String", "default": { "string": "x" } },
      { "name": "c", "type": "(String) -> Unit",
        "new_required": { "since_version": 3, "default": { "raw": "{}" } } }
    ]
  } ]
}"#;

const CONFLICT: &str = r#"{
  "shapes": [ {
    "name": "BadDBC",
    "package": "com.acme",
    "fields": [ {
      "name": "x", "type": "Int",
      "default": { "raw": "1" },
      "new_required": { "since_version": 2, "default": { "raw": "1" } }
    } ]
  } ]
}"#;

fn project(docs: &[(&str, &str)]) -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    let decls = td.path().join("decls");
    fs::create_dir_all(&decls).unwrap();
    for (name, contents) in docs {
        fs::write(decls.join(name), contents).unwrap();
    }
    td
}

fn read_json(path: &Path) -> serde_json::Value {
    let contents = fs::read_to_string(path).expect("read artifact");
    serde_json::from_str(&contents).expect("valid json")
}

#[test]
fn test_plan_writes_artifacts() {
    let temp = project(&[("person.json", PERSON)]);

    bincompat()
        .current_dir(temp.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("planned 1 of 1 shapes into 1 unit(s)"));

    let out = temp.path().join("artifacts").join("bincompat");
    let plan = read_json(&out.join("plan.json"));
    assert_eq!(plan["schema"], "bincompat.plan.v1");
    assert_eq!(plan["units"][0]["qualified_name"], "com.acme.model.Person");
    assert_eq!(plan["summary"]["overloads"], 2);

    let report = read_json(&out.join("report.json"));
    assert_eq!(report["verdict"]["status"], "pass");

    let md = fs::read_to_string(out.join("plan.md")).unwrap();
    assert!(md.contains("# bincompat plan"));
}

#[test]
fn test_plan_with_defects_exits_two_and_still_writes() {
    let temp = project(&[("person.json", PERSON), ("bad.json", CONFLICT)]);

    bincompat()
        .current_dir(temp.path())
        .arg("plan")
        .assert()
        .code(2);

    let out = temp.path().join("artifacts").join("bincompat");
    let report = read_json(&out.join("report.json"));
    assert_eq!(report["verdict"]["status"], "fail");
    assert_eq!(report["findings"][0]["code"], "schema.conflicting_defaults");
}

#[test]
fn test_plan_custom_out_dir() {
    let temp = project(&[("person.json", PERSON)]);
    let out = temp.path().join("custom");

    bincompat()
        .current_dir(temp.path())
        .arg("plan")
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("plan.json").exists());
}

#[test]
fn test_check_without_decls_dir_is_ok() {
    let temp = tempfile::tempdir().unwrap();

    bincompat()
        .current_dir(temp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: 0 shape(s)"));

    assert!(!temp.path().join("artifacts").exists());
}

#[test]
fn test_check_reports_defects() {
    let temp = project(&[("bad.json", CONFLICT)]);

    bincompat()
        .current_dir(temp.path())
        .arg("check")
        .assert()
        .code(2)
        .stdout(predicate::str::contains(
            "schema.conflicting_defaults: com.acme.BadDBC.x",
        ));
}

#[test]
fn test_check_warns_on_unreadable_documents() {
    let temp = project(&[("person.json", PERSON), ("broken.json", "{ nope")]);

    bincompat()
        .current_dir(temp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("warning: broken.json"))
        .stdout(predicate::str::contains("ok: 1 shape(s)"));
}

#[test]
fn test_style_flag_changes_ambiguity_outcome() {
    let temp = project(&[("handler.json", HANDLER)]);

    bincompat()
        .current_dir(temp.path())
        .args(["check", "--style", "overload"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("schema.ambiguous_overloads"));

    bincompat()
        .current_dir(temp.path())
        .args(["check", "--style", "callback"])
        .assert()
        .success();
}

#[test]
fn test_config_file_sets_style_and_cli_overrides() {
    let temp = project(&[("handler.json", HANDLER)]);
    fs::write(
        temp.path().join("bincompat.toml"),
        "[planner]\nconstruction_style = \"overload\"\n",
    )
    .unwrap();

    bincompat()
        .current_dir(temp.path())
        .arg("check")
        .assert()
        .code(2);

    bincompat()
        .current_dir(temp.path())
        .args(["check", "--style", "callback"])
        .assert()
        .success();
}

#[test]
fn test_config_out_dir_is_relative_to_root() {
    let temp = project(&[("person.json", PERSON)]);
    fs::write(
        temp.path().join("bincompat.toml"),
        "[output]\nout_dir = \"build/plans\"\n",
    )
    .unwrap();

    bincompat()
        .arg("plan")
        .arg("--root")
        .arg(temp.path())
        .assert()
        .success();

    assert!(temp.path().join("build").join("plans").join("plan.json").exists());
}

#[test]
fn test_drop_package_suffix_flag() {
    let temp = project(&[("person.json", PERSON)]);

    bincompat()
        .current_dir(temp.path())
        .args(["plan", "--drop-package-suffix", "model"])
        .assert()
        .success();

    let plan = read_json(
        &temp
            .path()
            .join("artifacts")
            .join("bincompat")
            .join("plan.json"),
    );
    assert_eq!(plan["units"][0]["qualified_name"], "com.acme.Person");
}

#[test]
fn test_invalid_config_is_a_tool_error() {
    let temp = project(&[("person.json", PERSON)]);
    fs::write(temp.path().join("bincompat.toml"), "[planner\n").unwrap();

    bincompat()
        .current_dir(temp.path())
        .arg("check")
        .assert()
        .code(1);
}

#[test]
fn test_invalid_style_value_is_rejected() {
    bincompat()
        .args(["check", "--style", "fluent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fluent"));
}

#[test]
fn test_explain_prints_version_table() {
    let temp = project(&[("person.json", PERSON)]);

    bincompat()
        .current_dir(temp.path())
        .args(["explain", "Person"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# com.acme.model.Person"))
        .stdout(predicate::str::contains("| 1 | `id` | (id, 0) |"))
        .stdout(predicate::str::contains("| 2 | `id`, `age` | (id, age) |"));
}

#[test]
fn test_explain_failed_shape_exits_two() {
    let temp = project(&[("bad.json", CONFLICT)]);

    bincompat()
        .current_dir(temp.path())
        .args(["explain", "BadDBC"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Not planned"));
}

#[test]
fn test_explain_unknown_shape_exits_one() {
    let temp = project(&[("person.json", PERSON)]);

    bincompat()
        .current_dir(temp.path())
        .args(["explain", "Nope"])
        .assert()
        .code(1);
}

#[test]
fn test_no_subcommand_fails() {
    bincompat().assert().failure();
}
