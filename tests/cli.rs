use std::fs;
use std::path::Path;

use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("repo-prune")
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, content).expect("write");
}

/// Minimal Next-shaped project: one route entry importing a helper, one dead
/// sibling, one asset referenced only from a markup comment.
fn fixture() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "package.json", r#"{"name":"fixture","scripts":{"migrate":"node scripts/migrate.js"}}"#);
    write(
        root,
        "app/page.tsx",
        "import { helper } from \"../lib/helper\";\nexport default function Page() { return helper(); }\n",
    );
    write(root, "lib/helper.ts", "export const helper = () => 1;\n");
    write(root, "lib/unused.ts", "export const unused = 2;\n");
    write(root, "public/old-logo.svg", "<svg></svg>");
    write(root, "README.md", "<!-- <img src=\"/old-logo.svg\"> -->\n");
    write(root, "scripts/migrate.js", "process.exit(0);\n");
    dir
}

fn read_report(root: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(root.join("prune-report.json")).expect("report json");
    serde_json::from_str(&raw).expect("valid json")
}

fn candidate<'a>(report: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    report["candidates"]
        .as_array()
        .expect("candidates array")
        .iter()
        .find(|c| c["path"] == path)
}

#[test]
fn dry_run_flags_unused_and_spares_reachable() {
    let dir = fixture();
    cmd().arg("scan").current_dir(dir.path()).assert().success();

    let report = read_report(dir.path());
    assert_eq!(report["mode"], "dry-run");

    let unused = candidate(&report, "lib/unused.ts").expect("unused flagged");
    assert_eq!(unused["confidence"], 1.0);
    assert!(candidate(&report, "lib/helper.ts").is_none());
    assert!(candidate(&report, "app/page.tsx").is_none());

    // Everything is still on disk after a dry run.
    assert!(dir.path().join("lib/unused.ts").exists());
    assert!(dir.path().join("prune-report.md").exists());
}

#[test]
fn comment_only_reference_downgrades_confidence() {
    let dir = fixture();
    cmd().arg("scan").current_dir(dir.path()).assert().success();

    let report = read_report(dir.path());
    let logo = candidate(&report, "public/old-logo.svg").expect("flagged");
    assert_eq!(logo["confidence"], 0.8);
    assert!(
        logo["reason"]
            .as_str()
            .expect("reason string")
            .contains("comments")
    );
}

#[test]
fn script_referenced_file_is_not_a_candidate() {
    let dir = fixture();
    cmd().arg("scan").current_dir(dir.path()).assert().success();

    let report = read_report(dir.path());
    assert!(candidate(&report, "scripts/migrate.js").is_none());
}

#[test]
fn keep_rules_protect_matching_files() {
    let dir = fixture();
    write(dir.path(), "scripts/prune-keep.yml", "keep:\n  - lib/unused.ts\n");
    cmd().arg("scan").current_dir(dir.path()).assert().success();

    let report = read_report(dir.path());
    assert!(candidate(&report, "lib/unused.ts").is_none());
}

#[test]
fn scan_is_idempotent() {
    let dir = fixture();
    cmd().arg("scan").current_dir(dir.path()).assert().success();
    let first = read_report(dir.path());
    cmd().arg("scan").current_dir(dir.path()).assert().success();
    let second = read_report(dir.path());
    assert_eq!(first["candidates"], second["candidates"]);
    assert_eq!(first["summary"], second["summary"]);
}

#[test]
fn json_format_emits_one_object_per_candidate() {
    let dir = fixture();
    let out = cmd()
        .args(["scan", "--format", "json"])
        .current_dir(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).expect("utf8");
    for line in text.lines() {
        let value: serde_json::Value = serde_json::from_str(line).expect("json line");
        assert!(value["path"].is_string());
    }
}

#[test]
fn apply_commit_quarantines_medium_and_deletes_high() {
    let dir = fixture();
    write(dir.path(), "repo-prune.toml", "[validate]\nbuild = [\"true\"]\nlint = [\"true\"]\n");

    cmd()
        .args(["apply", ".", "--yes"])
        .current_dir(dir.path())
        .assert()
        .success();

    let report = read_report(dir.path());
    assert_eq!(report["mode"], "apply");

    // High confidence deleted outright, irreversible by design.
    assert!(!dir.path().join("lib/unused.ts").exists());
    assert!(!dir.path().join("__trash__/lib/unused.ts").exists());

    // Medium confidence sits in quarantine pending review.
    assert!(!dir.path().join("public/old-logo.svg").exists());
    assert!(dir.path().join("__trash__/public/old-logo.svg").exists());

    // Reachable and guarded files untouched.
    assert!(dir.path().join("lib/helper.ts").exists());
    assert!(dir.path().join("package.json").exists());
}

#[test]
fn apply_rollback_restores_quarantine_and_fails() {
    let dir = fixture();
    write(dir.path(), "repo-prune.toml", "[validate]\nbuild = [\"false\"]\nlint = [\"true\"]\n");

    cmd()
        .args(["apply", ".", "--yes"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("build"))
        .stderr(predicate::str::contains("restored"));

    // Quarantined file back at its exact original path.
    assert!(dir.path().join("public/old-logo.svg").exists());
    assert!(!dir.path().join("__trash__/public/old-logo.svg").exists());

    // High-confidence deletions stay committed.
    assert!(!dir.path().join("lib/unused.ts").exists());

    // The report was written before mutation started.
    assert!(dir.path().join("prune-report.json").exists());
}

#[test]
fn apply_without_yes_never_mutates() {
    let dir = fixture();
    write(dir.path(), "repo-prune.toml", "[validate]\nbuild = [\"true\"]\nlint = [\"true\"]\n");

    cmd()
        .args(["apply", "."])
        .current_dir(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("--yes"));

    assert!(dir.path().join("lib/unused.ts").exists());
    assert!(dir.path().join("public/old-logo.svg").exists());
}

#[test]
fn apply_force_deletes_the_quarantine_band_too() {
    let dir = fixture();
    write(dir.path(), "repo-prune.toml", "[validate]\nbuild = [\"true\"]\nlint = [\"true\"]\n");

    cmd()
        .args(["apply", ".", "--force", "--yes"])
        .current_dir(dir.path())
        .assert()
        .success();

    assert!(!dir.path().join("public/old-logo.svg").exists());
    assert!(!dir.path().join("__trash__/public/old-logo.svg").exists());
}

#[test]
fn include_tests_exposes_test_files() {
    let dir = fixture();
    write(dir.path(), "lib/tree.test.ts", "export const t = 1;\n");

    cmd().arg("scan").current_dir(dir.path()).assert().success();
    assert!(candidate(&read_report(dir.path()), "lib/tree.test.ts").is_none());

    cmd()
        .args(["scan", ".", "--include-tests"])
        .current_dir(dir.path())
        .assert()
        .success();
    assert!(candidate(&read_report(dir.path()), "lib/tree.test.ts").is_some());
}

#[test]
fn help_lists_subcommands() {
    let out = cmd().arg("--help").assert().success().get_output().stdout.clone();
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("Find dead files"));
    assert!(text.contains("scan"));
    assert!(text.contains("apply"));
}
