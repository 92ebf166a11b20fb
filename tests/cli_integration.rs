//! Integration tests for the `hl` CLI.
//!
//! Each test creates a temp vault, runs `hl` as a subprocess, and verifies
//! stdout and/or file contents.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Get the path to the built `hl` binary.
fn hl_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("hl");
    path
}

/// Create a small vault with one project note and the general actions note.
fn create_test_vault(root: &Path) {
    fs::create_dir_all(root.join("Projects")).unwrap();
    fs::write(
        root.join("Projects/Site.md"),
        "\
# Site

- [ ] Draft copy #sphere/work
- [ ] Pick fonts
- [ ] Order domain #flow-planned
",
    )
    .unwrap();
    fs::write(
        root.join("Next Actions.md"),
        "\
- [ ] Call plumber
- [ ] Renew passport #sphere/home
",
    )
    .unwrap();
}

fn setup() -> TempDir {
    let tmp = TempDir::new().unwrap();
    create_test_vault(tmp.path());
    tmp
}

/// Run `hl` with the given args in the given directory, returning (stdout, stderr, success).
fn run_hl(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(hl_bin())
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run hl");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `hl` expecting success, return stdout.
fn run_hl_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_hl(dir, args);
    if !success {
        panic!(
            "hl {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

/// Run `hl` expecting failure, return stderr.
fn run_hl_err(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_hl(dir, args);
    if success {
        panic!("hl {:?} unexpectedly succeeded:\nstdout: {}", args, stdout);
    }
    stderr
}

/// Add an action and return its short id.
fn add(dir: &Path, file: &str, text: &str, extra: &[&str]) -> String {
    let mut args = vec!["--json", "add", file, text];
    args.extend_from_slice(extra);
    let out = run_hl_ok(dir, &args);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    json["shortId"].as_str().unwrap().to_string()
}

fn list_json(dir: &Path) -> Vec<serde_json::Value> {
    let out = run_hl_ok(dir, &["--json", "list"]);
    serde_json::from_str(&out).unwrap()
}

fn read(dir: &Path, rel: &str) -> String {
    fs::read_to_string(dir.join(rel)).unwrap()
}

// ---------------------------------------------------------------------------
// init / config
// ---------------------------------------------------------------------------

#[test]
fn test_init_creates_config_once() {
    let tmp = setup();
    let out = run_hl_ok(tmp.path(), &["init"]);
    assert!(out.contains("Initialized hotlist"));
    assert!(read(tmp.path(), ".hotlist/config.toml").contains("auto_clear_time = \"03:00\""));

    let err = run_hl_err(tmp.path(), &["init"]);
    assert!(err.contains("already exists"));
}

#[test]
fn test_config_clear_time_edits_in_place() {
    let tmp = setup();
    run_hl_ok(tmp.path(), &["init"]);

    run_hl_ok(tmp.path(), &["config", "clear-time", "07:30"]);
    let config = read(tmp.path(), ".hotlist/config.toml");
    assert!(config.contains("auto_clear_time = \"07:30\""));
    // comments survive the edit
    assert!(config.contains("# Note that cleared items are archived into"));

    run_hl_ok(tmp.path(), &["config", "clear-time", "off"]);
    assert!(read(tmp.path(), ".hotlist/config.toml").contains("auto_clear_time = \"\""));

    let err = run_hl_err(tmp.path(), &["config", "clear-time", "late"]);
    assert!(err.contains("invalid time"));
}

// ---------------------------------------------------------------------------
// add / list / remove
// ---------------------------------------------------------------------------

#[test]
fn test_add_and_list() {
    let tmp = setup();
    add(tmp.path(), "Projects/Site.md", "Draft copy", &[]);
    add(tmp.path(), "Next Actions.md", "Call plumber", &[]);

    let items = list_json(tmp.path());
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["displayText"], "Draft copy");
    assert_eq!(items[0]["lineNumber"], 3);
    assert_eq!(items[0]["category"], "work");
    assert_eq!(items[1]["isGeneralAction"], true);
    assert_eq!(items[1]["category"], "general");

    let out = run_hl_ok(tmp.path(), &["list"]);
    assert!(out.contains("Draft copy  (work)  Projects/Site.md:3"));
    assert!(out.contains("Call plumber"));

    // the store file is one record per line
    let store = read(tmp.path(), ".hotlist/hotlist.jsonl");
    assert_eq!(store.lines().count(), 2);
}

#[test]
fn test_add_errors() {
    let tmp = setup();
    let err = run_hl_err(tmp.path(), &["add", "Nope.md", "Anything"]);
    assert!(err.contains("File not found"));

    let err = run_hl_err(tmp.path(), &["add", "Projects/Site.md", "Not there"]);
    assert!(err.contains("Action not found in file"));

    add(tmp.path(), "Projects/Site.md", "Pick fonts", &[]);
    let err = run_hl_err(tmp.path(), &["add", "Projects/Site.md", "Pick fonts"]);
    assert!(err.contains("already on the hotlist"));
}

#[test]
fn test_empty_list() {
    let tmp = setup();
    assert_eq!(run_hl_ok(tmp.path(), &["list"]).trim(), "hotlist is empty");
}

#[test]
fn test_remove_leaves_note_alone() {
    let tmp = setup();
    let before = read(tmp.path(), "Projects/Site.md");
    let id = add(tmp.path(), "Projects/Site.md", "Pick fonts", &[]);

    let out = run_hl_ok(tmp.path(), &["remove", &id]);
    assert!(out.contains("removed"));
    assert!(list_json(tmp.path()).is_empty());
    assert_eq!(read(tmp.path(), "Projects/Site.md"), before);
}

#[test]
fn test_unknown_id_is_an_error() {
    let tmp = setup();
    let err = run_hl_err(tmp.path(), &["remove", "zzzz"]);
    assert!(err.contains("no hotlist item matches"));
}

#[test]
fn test_vault_flag() {
    let tmp = setup();
    let elsewhere = TempDir::new().unwrap();
    let vault = tmp.path().to_str().unwrap();
    run_hl_ok(elsewhere.path(), &["-C", vault, "add", "Projects/Site.md", "Draft copy"]);
    assert_eq!(list_json(tmp.path()).len(), 1);
}

// ---------------------------------------------------------------------------
// pin / unpin / reorder
// ---------------------------------------------------------------------------

#[test]
fn test_pin_and_reorder() {
    let tmp = setup();
    let a = add(tmp.path(), "Projects/Site.md", "Draft copy", &["--pin"]);
    let b = add(tmp.path(), "Projects/Site.md", "Pick fonts", &[]);
    let c = add(tmp.path(), "Next Actions.md", "Call plumber", &[]);

    run_hl_ok(tmp.path(), &["pin", &c]);
    let order: Vec<String> = list_json(tmp.path())
        .iter()
        .map(|i| i["shortId"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(order, vec![a.clone(), c.clone(), b.clone()]);

    run_hl_ok(tmp.path(), &["reorder", &c, &a]);
    let order: Vec<String> = list_json(tmp.path())
        .iter()
        .map(|i| i["shortId"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(order, vec![c.clone(), a.clone(), b.clone()]);

    let err = run_hl_err(tmp.path(), &["reorder", &b, &a]);
    assert!(err.contains("only pinned items"));

    run_hl_ok(tmp.path(), &["unpin", &c]);
    let items = list_json(tmp.path());
    assert_eq!(items[0]["shortId"], a.as_str());
    assert_eq!(items[1]["shortId"], c.as_str());
    assert_eq!(items[1]["isPinned"], false);

    let out = run_hl_ok(tmp.path(), &["list"]);
    assert!(out.starts_with("-- Pinned --"));
}

// ---------------------------------------------------------------------------
// waiting / done
// ---------------------------------------------------------------------------

#[test]
fn test_waiting_rewrites_checkbox() {
    let tmp = setup();
    let id = add(tmp.path(), "Next Actions.md", "Call plumber", &[]);
    run_hl_ok(tmp.path(), &["waiting", &id]);

    assert!(read(tmp.path(), "Next Actions.md").starts_with("- [w] Call plumber\n"));
    let items = list_json(tmp.path());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["status"], "w");
}

#[test]
fn test_done_checks_off_and_removes() {
    let tmp = setup();
    let id = add(tmp.path(), "Projects/Site.md", "Draft copy", &[]);
    run_hl_ok(tmp.path(), &["done", &id]);

    let note = read(tmp.path(), "Projects/Site.md");
    assert!(note.contains("- [x] Draft copy #sphere/work ✅ "));
    assert!(note.contains("- [ ] Pick fonts"));
    assert!(list_json(tmp.path()).is_empty());
}

#[test]
fn test_done_after_line_moved() {
    let tmp = setup();
    let id = add(tmp.path(), "Projects/Site.md", "Pick fonts", &[]);
    let note = read(tmp.path(), "Projects/Site.md");
    fs::write(
        tmp.path().join("Projects/Site.md"),
        format!("Intro paragraph\n\n{}", note),
    )
    .unwrap();

    run_hl_ok(tmp.path(), &["done", &id]);
    let lines: Vec<String> = read(tmp.path(), "Projects/Site.md")
        .lines()
        .map(String::from)
        .collect();
    assert!(lines[5].starts_with("- [x] Pick fonts"));
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

#[test]
fn test_reconcile_moves_and_removes() {
    let tmp = setup();
    add(tmp.path(), "Projects/Site.md", "Draft copy", &[]);
    add(tmp.path(), "Projects/Site.md", "Pick fonts", &[]);
    add(tmp.path(), "Next Actions.md", "Call plumber", &[]);

    fs::write(
        tmp.path().join("Projects/Site.md"),
        "# Site\n\n## Now\n\n- [ ] Draft copy #sphere/work\n- [ ] Pick nicer fonts\n",
    )
    .unwrap();
    fs::remove_file(tmp.path().join("Next Actions.md")).unwrap();

    let out = run_hl_ok(tmp.path(), &["--json", "reconcile"]);
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["kept"], 1);
    assert_eq!(report["moved"], 1);
    let reasons: Vec<&str> = report["removed"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["reason"].as_str().unwrap())
        .collect();
    assert_eq!(reasons, vec!["line-gone", "file-missing"]);

    let items = list_json(tmp.path());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["lineNumber"], 5);

    // vanished lines are kept in the recovery log
    let out = run_hl_ok(tmp.path(), &["recovery"]);
    assert!(out.contains("reconcile: untracked vanished lines"));
    assert!(out.contains("Pick fonts"));
}

#[test]
fn test_reconcile_completed_line() {
    let tmp = setup();
    add(tmp.path(), "Next Actions.md", "Call plumber", &[]);
    fs::write(
        tmp.path().join("Next Actions.md"),
        "- [x] Call plumber\n- [ ] Renew passport #sphere/home\n",
    )
    .unwrap();
    // the captured line no longer exists verbatim
    run_hl_ok(tmp.path(), &["reconcile"]);
    assert!(list_json(tmp.path()).is_empty());
}

#[test]
fn test_malformed_store_line_is_dropped() {
    let tmp = setup();
    add(tmp.path(), "Next Actions.md", "Call plumber", &[]);
    let store_path = tmp.path().join(".hotlist/hotlist.jsonl");
    let mut store = fs::read_to_string(&store_path).unwrap();
    store.push_str("{not json\n");
    fs::write(&store_path, store).unwrap();

    assert_eq!(list_json(tmp.path()).len(), 1);
    let out = run_hl_ok(tmp.path(), &["--json", "recovery"]);
    let entries: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
    assert_eq!(entries[0]["category"], "parser");
}

#[test]
fn test_legacy_blob_store_is_upgraded() {
    let tmp = setup();
    fs::create_dir_all(tmp.path().join(".hotlist")).unwrap();
    fs::write(
        tmp.path().join(".hotlist/hotlist.jsonl"),
        r#"{"items": [{"filePath": "Next Actions.md", "lineNumber": 1, "lineContent": "- [ ] Call plumber", "displayText": "Call plumber", "sphere": "home", "isGeneralAction": true, "addedAt": 1760000000000}]}"#,
    )
    .unwrap();

    let items = list_json(tmp.path());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["category"], "home");

    let store = read(tmp.path(), ".hotlist/hotlist.jsonl");
    assert_eq!(store.lines().count(), 1);
    assert!(store.contains("\"id\":"));
}

// ---------------------------------------------------------------------------
// clear / migrate
// ---------------------------------------------------------------------------

#[test]
fn test_force_clear_archives() {
    let tmp = setup();
    add(tmp.path(), "Projects/Site.md", "Draft copy", &[]);
    add(tmp.path(), "Next Actions.md", "Call plumber", &[]);

    let out = run_hl_ok(tmp.path(), &["clear", "--force"]);
    assert!(out.contains("archived 2 item(s) to Hotlist Archive.md"));
    assert!(list_json(tmp.path()).is_empty());

    let archive = read(tmp.path(), "Hotlist Archive.md");
    assert!(archive.starts_with("## Cleared "));
    assert!(archive.contains("- [[Projects/Site]] Draft copy\n"));
    assert!(archive.contains("- [[Next Actions|Call plumber]]\n"));

    run_hl_ok(tmp.path(), &["clear", "--force"]);
    let archive = read(tmp.path(), "Hotlist Archive.md");
    assert_eq!(archive.matches("## Cleared ").count(), 2);
    assert!(archive.contains("- No items on the hotlist"));
}

#[test]
fn test_clear_disabled_does_nothing() {
    let tmp = setup();
    run_hl_ok(tmp.path(), &["init"]);
    run_hl_ok(tmp.path(), &["config", "clear-time", "off"]);
    add(tmp.path(), "Projects/Site.md", "Draft copy", &[]);

    let out = run_hl_ok(tmp.path(), &["clear"]);
    assert!(out.contains("nothing to clear"));
    assert_eq!(list_json(tmp.path()).len(), 1);
    assert!(!tmp.path().join("Hotlist Archive.md").exists());
}

#[test]
fn test_migrate_strips_legacy_marker() {
    let tmp = setup();
    let out = run_hl_ok(tmp.path(), &["migrate"]);
    assert!(out.contains("migrated 1 item(s) from 1 file(s)"));

    assert!(read(tmp.path(), "Projects/Site.md").contains("- [ ] Order domain\n"));
    let items = list_json(tmp.path());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["displayText"], "Order domain");
    assert_eq!(items[0]["category"], "general");

    let out = run_hl_ok(tmp.path(), &["migrate"]);
    assert!(out.contains("migrated 0 item(s)"));
    assert_eq!(list_json(tmp.path()).len(), 1);
}

#[test]
fn test_migrate_keeps_item_added_before_it() {
    let tmp = setup();
    let id = add(tmp.path(), "Projects/Site.md", "Order domain", &[]);

    let out = run_hl_ok(tmp.path(), &["--json", "migrate"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["added"], 0);
    assert_eq!(json["relinked"], 1);

    run_hl_ok(tmp.path(), &["reconcile"]);
    let items = list_json(tmp.path());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["shortId"], id.as_str());
    assert_eq!(items[0]["displayText"], "Order domain");
}
